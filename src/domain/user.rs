use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult, ValidationError};
use crate::domain::repository::UserRepository;

/// External chat-user identifier (the Telegram user id).
pub type TelegramId = i64;

/// A club member's stored profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Internal key, stable across upserts.
    pub id: i64,
    pub telegram_id: TelegramId,
    pub name: String,
    pub surname: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// "Name Surname", without a trailing space when the surname is empty.
    pub fn full_name(&self) -> String {
        if self.surname.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.surname)
        }
    }
}

/// Maps Telegram identities to stored profiles.
#[derive(Clone)]
pub struct UserDirectory {
    repo: Arc<dyn UserRepository>,
}

impl UserDirectory {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn get_by_telegram_id(&self, telegram_id: TelegramId) -> DomainResult<User> {
        self.repo
            .get_user_by_telegram_id(telegram_id)
            .await?
            .ok_or(DomainError::UserNotFound)
    }

    pub async fn exists(&self, telegram_id: TelegramId) -> DomainResult<bool> {
        Ok(self.repo.get_user_by_telegram_id(telegram_id).await?.is_some())
    }

    /// Inserts a profile or overwrites name/surname of the existing one.
    /// The internal id of an existing profile never changes.
    pub async fn upsert(
        &self,
        telegram_id: TelegramId,
        name: &str,
        surname: &str,
    ) -> DomainResult<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::NameRequired.into());
        }

        let user = self.repo.save_user(telegram_id, name, surname.trim()).await?;
        tracing::debug!("Upserted profile {} for telegram user {}", user.id, telegram_id);
        Ok(user)
    }

    pub async fn delete(&self, telegram_id: TelegramId) -> DomainResult<()> {
        if !self.repo.delete_user(telegram_id).await? {
            return Err(DomainError::UserNotFound);
        }
        Ok(())
    }
}
