use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::error::{DomainError, DomainResult, ValidationError};
use crate::domain::normalize_optional;
use crate::domain::repository::LocationRepository;

/// Opaque location identifier (UUID v4 string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    /// Fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for LocationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for LocationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A venue where events take place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub address: Option<String>,
    pub map_url: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a location.
#[derive(Debug, Clone, Default)]
pub struct CreateLocationInput {
    pub name: String,
    pub address: Option<String>,
    pub map_url: Option<String>,
    pub description: Option<String>,
}

/// Partial update. `Some("")` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct UpdateLocationInput {
    pub name: Option<String>,
    pub address: Option<String>,
    pub map_url: Option<String>,
    pub description: Option<String>,
}

/// Validation knobs that differ between club deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationPolicy {
    pub require_address: bool,
}

/// CRUD over venues.
#[derive(Clone)]
pub struct LocationRegistry {
    repo: Arc<dyn LocationRepository>,
    policy: LocationPolicy,
    write_lock: Arc<Mutex<()>>,
}

impl LocationRegistry {
    pub fn new(repo: Arc<dyn LocationRepository>, policy: LocationPolicy) -> Self {
        Self {
            repo,
            policy,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn get(&self, id: &LocationId) -> DomainResult<Location> {
        self.repo
            .get_location(id)
            .await?
            .ok_or(DomainError::LocationNotFound)
    }

    /// All locations, sorted by name.
    pub async fn list(&self) -> DomainResult<Vec<Location>> {
        let mut locations = self.repo.list_locations().await?;
        locations.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(locations)
    }

    pub async fn create(&self, input: CreateLocationInput) -> DomainResult<Location> {
        let now = Utc::now();
        let location = Location {
            id: LocationId::generate(),
            name: input.name.trim().to_string(),
            address: normalize_optional(input.address),
            map_url: normalize_optional(input.map_url),
            description: normalize_optional(input.description),
            created_at: now,
            updated_at: now,
        };
        self.validate(&location)?;

        self.repo.save_location(&location).await?;
        tracing::info!("Created location {} ('{}')", location.id, location.name);
        Ok(location)
    }

    pub async fn update(
        &self,
        id: &LocationId,
        input: UpdateLocationInput,
    ) -> DomainResult<Location> {
        let _guard = self.write_lock.lock().await;
        let mut location = self.get(id).await?;

        if let Some(name) = input.name {
            location.name = name.trim().to_string();
        }
        if input.address.is_some() {
            location.address = normalize_optional(input.address);
        }
        if input.map_url.is_some() {
            location.map_url = normalize_optional(input.map_url);
        }
        if input.description.is_some() {
            location.description = normalize_optional(input.description);
        }
        location.updated_at = Utc::now();
        self.validate(&location)?;

        self.repo.save_location(&location).await?;
        Ok(location)
    }

    pub async fn delete(&self, id: &LocationId) -> DomainResult<()> {
        let _guard = self.write_lock.lock().await;
        if !self.repo.delete_location(id).await? {
            return Err(DomainError::LocationNotFound);
        }
        tracing::info!("Deleted location {}", id);
        Ok(())
    }

    fn validate(&self, location: &Location) -> Result<(), ValidationError> {
        if location.name.is_empty() {
            return Err(ValidationError::NameRequired);
        }
        if self.policy.require_address && location.address.is_none() {
            return Err(ValidationError::AddressRequired);
        }
        if let Some(map_url) = &location.map_url {
            let parsed = url::Url::parse(map_url).map_err(|_| ValidationError::InvalidMapUrl)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ValidationError::InvalidMapUrl);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryRepository;

    fn registry(require_address: bool) -> LocationRegistry {
        LocationRegistry::new(
            Arc::new(MemoryRepository::new()),
            LocationPolicy { require_address },
        )
    }

    #[tokio::test]
    async fn test_create_trims_and_normalizes() {
        let registry = registry(false);
        let location = registry
            .create(CreateLocationInput {
                name: "  Main Hall ".to_string(),
                address: Some("   ".to_string()),
                map_url: None,
                description: Some(" Upstairs ".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(location.name, "Main Hall");
        assert_eq!(location.address, None);
        assert_eq!(location.description.as_deref(), Some("Upstairs"));
    }

    #[tokio::test]
    async fn test_address_policy() {
        let input = CreateLocationInput {
            name: "Court".to_string(),
            ..Default::default()
        };

        assert!(registry(false).create(input.clone()).await.is_ok());
        assert!(matches!(
            registry(true).create(input).await,
            Err(DomainError::Validation(ValidationError::AddressRequired))
        ));
    }

    #[tokio::test]
    async fn test_map_url_must_be_http() {
        let registry = registry(false);
        let result = registry
            .create(CreateLocationInput {
                name: "Court".to_string(),
                map_url: Some("ftp://maps.example.com".to_string()),
                ..Default::default()
            })
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::InvalidMapUrl))
        ));
    }
}
