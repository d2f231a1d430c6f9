//! Multi-step conversation state.
//!
//! Entries are keyed by chat and user and expire after a fixed TTL of
//! inactivity. Expired entries are invisible to readers and removed by the
//! periodic sweep. Nothing here survives a restart.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::domain::event::{EventId, EventType};
use crate::domain::location::LocationId;

/// Upper bound for configured TTLs.
const MAX_TTL_MINUTES: u64 = 60 * 24 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WizardKey {
    pub chat_id: i64,
    pub user_id: i64,
}

impl WizardKey {
    pub fn new(chat_id: i64, user_id: i64) -> Self {
        Self { chat_id, user_id }
    }
}

/// Text-input step of the admin event wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStep {
    MaxPlayers,
    Name,
    Date,
    Trainer,
    PaymentPhone,
    Price,
}

/// Event being assembled by an admin. Location and type are picked with
/// buttons before the first text step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub location_id: LocationId,
    pub event_type: EventType,
    pub step: EventStep,
    pub max_players: Option<u32>,
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub trainer: Option<String>,
    pub payment_phone: Option<String>,
}

impl EventDraft {
    pub fn new(location_id: LocationId, event_type: EventType) -> Self {
        Self {
            location_id,
            event_type,
            step: EventStep::MaxPlayers,
            max_players: None,
            name: None,
            date: None,
            trainer: None,
            payment_phone: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileStep {
    Name,
    Surname,
}

/// Member profile being collected. `pending_event` is the registration
/// the member tried to file before having a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDraft {
    pub step: ProfileStep,
    pub name: Option<String>,
    pub pending_event: Option<EventId>,
}

impl ProfileDraft {
    pub fn new(pending_event: Option<EventId>) -> Self {
        Self {
            step: ProfileStep::Name,
            name: None,
            pending_event,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardState {
    /// Waiting for `Name|Address|MapURL|Description`.
    CreatingLocation,
    CreatingEvent(EventDraft),
    RegisteringProfile(ProfileDraft),
}

#[derive(Debug, Clone)]
struct Entry {
    state: WizardState,
    touched_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct WizardStore {
    entries: Arc<RwLock<HashMap<WizardKey, Entry>>>,
    ttl: Duration,
}

impl WizardStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn from_minutes(minutes: u64) -> Self {
        let minutes = i64::try_from(minutes.min(MAX_TTL_MINUTES)).unwrap_or_default();
        Self::new(Duration::minutes(minutes))
    }

    pub async fn get(&self, key: WizardKey) -> Option<WizardState> {
        self.get_at(key, Utc::now()).await
    }

    pub async fn get_at(&self, key: WizardKey, now: DateTime<Utc>) -> Option<WizardState> {
        let entries = self.entries.read().await;
        entries
            .get(&key)
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| entry.state.clone())
    }

    /// Stores the state and restarts its TTL.
    pub async fn set(&self, key: WizardKey, state: WizardState) {
        self.set_at(key, state, Utc::now()).await;
    }

    pub async fn set_at(&self, key: WizardKey, state: WizardState, now: DateTime<Utc>) {
        self.entries.write().await.insert(
            key,
            Entry {
                state,
                touched_at: now,
            },
        );
    }

    pub async fn remove(&self, key: WizardKey) -> Option<WizardState> {
        self.entries.write().await.remove(&key).map(|entry| entry.state)
    }

    /// Drops expired entries and returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now()).await
    }

    pub async fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }

    /// Entries currently stored, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        now - entry.touched_at >= self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = WizardStore::from_minutes(30);
        let key = WizardKey::new(1, 2);

        assert!(store.get(key).await.is_none());
        store.set(key, WizardState::CreatingLocation).await;
        assert_eq!(store.get(key).await, Some(WizardState::CreatingLocation));

        assert_eq!(store.remove(key).await, Some(WizardState::CreatingLocation));
        assert!(store.get(key).await.is_none());
    }

    #[tokio::test]
    async fn test_keys_are_per_user_and_chat() {
        let store = WizardStore::from_minutes(30);
        store.set(WizardKey::new(1, 2), WizardState::CreatingLocation).await;

        assert!(store.get(WizardKey::new(1, 3)).await.is_none());
        assert!(store.get(WizardKey::new(4, 2)).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_invisible_then_swept() {
        let store = WizardStore::new(Duration::minutes(10));
        let start = Utc::now();
        let key = WizardKey::new(1, 1);
        store.set_at(key, WizardState::CreatingLocation, start).await;
        store
            .set_at(WizardKey::new(2, 2), WizardState::CreatingLocation, start + Duration::minutes(8))
            .await;

        let later = start + Duration::minutes(11);
        assert!(store.get_at(key, later).await.is_none());
        assert_eq!(store.len().await, 2);

        assert_eq!(store.sweep_expired_at(later).await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_set_restarts_ttl() {
        let store = WizardStore::new(Duration::minutes(10));
        let start = Utc::now();
        let key = WizardKey::new(1, 1);
        store.set_at(key, WizardState::CreatingLocation, start).await;
        store
            .set_at(key, WizardState::CreatingLocation, start + Duration::minutes(9))
            .await;

        assert!(store.get_at(key, start + Duration::minutes(15)).await.is_some());
    }
}
