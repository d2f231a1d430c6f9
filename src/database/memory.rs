//! Process-local repository. Backs unit tests and lets them inject
//! storage failures with [`MemoryRepository::set_fail_writes`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::error::{StoreError, StoreResult};
use crate::domain::event::{Event, EventId};
use crate::domain::location::{Location, LocationId};
use crate::domain::repository::{EventRepository, LocationRepository, UserRepository};
use crate::domain::user::{TelegramId, User};

#[derive(Default)]
struct Users {
    next_id: i64,
    by_telegram_id: HashMap<TelegramId, User>,
}

#[derive(Default)]
pub struct MemoryRepository {
    locations: RwLock<HashMap<LocationId, Location>>,
    events: RwLock<HashMap<EventId, Event>>,
    users: RwLock<Users>,
    fail_writes: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every write returns [`StoreError::Unavailable`] and
    /// leaves the stored data untouched.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }

    async fn events_where(&self, keep: impl Fn(&Event) -> bool) -> Vec<Event> {
        self.events
            .read()
            .await
            .values()
            .filter(|e| keep(e))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LocationRepository for MemoryRepository {
    async fn get_location(&self, id: &LocationId) -> StoreResult<Option<Location>> {
        Ok(self.locations.read().await.get(id).cloned())
    }

    async fn list_locations(&self) -> StoreResult<Vec<Location>> {
        Ok(self.locations.read().await.values().cloned().collect())
    }

    async fn save_location(&self, location: &Location) -> StoreResult<()> {
        self.check_writable()?;
        self.locations
            .write()
            .await
            .insert(location.id.clone(), location.clone());
        Ok(())
    }

    async fn delete_location(&self, id: &LocationId) -> StoreResult<bool> {
        self.check_writable()?;
        if self.locations.write().await.remove(id).is_none() {
            return Ok(false);
        }
        self.events.write().await.retain(|_, e| &e.location_id != id);
        Ok(true)
    }
}

#[async_trait]
impl EventRepository for MemoryRepository {
    async fn get_event(&self, id: &EventId) -> StoreResult<Option<Event>> {
        Ok(self.events.read().await.get(id).cloned())
    }

    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        Ok(self.events_where(|_| true).await)
    }

    async fn list_events_by_location(&self, location_id: &LocationId) -> StoreResult<Vec<Event>> {
        Ok(self.events_where(|e| &e.location_id == location_id).await)
    }

    async fn list_events_by_user(&self, user_id: TelegramId) -> StoreResult<Vec<Event>> {
        Ok(self
            .events_where(|e| e.registrations.contains_key(&user_id))
            .await)
    }

    async fn insert_event(&self, event: &Event) -> StoreResult<()> {
        self.check_writable()?;
        self.events
            .write()
            .await
            .insert(event.id.clone(), event.clone());
        Ok(())
    }

    async fn save_event(&self, event: &Event) -> StoreResult<bool> {
        self.check_writable()?;
        match self.events.write().await.get_mut(&event.id) {
            Some(stored) => {
                *stored = event.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_event(&self, id: &EventId) -> StoreResult<bool> {
        self.check_writable()?;
        Ok(self.events.write().await.remove(id).is_some())
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn get_user_by_telegram_id(&self, telegram_id: TelegramId) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.by_telegram_id.get(&telegram_id).cloned())
    }

    async fn save_user(&self, telegram_id: TelegramId, name: &str, surname: &str) -> StoreResult<User> {
        self.check_writable()?;
        let now = Utc::now();
        let mut users = self.users.write().await;

        if let Some(existing) = users.by_telegram_id.get_mut(&telegram_id) {
            existing.name = name.to_string();
            existing.surname = surname.to_string();
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        users.next_id += 1;
        let user = User {
            id: users.next_id,
            telegram_id,
            name: name.to_string(),
            surname: surname.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.by_telegram_id.insert(telegram_id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, telegram_id: TelegramId) -> StoreResult<bool> {
        self.check_writable()?;
        Ok(self
            .users
            .write()
            .await
            .by_telegram_id
            .remove(&telegram_id)
            .is_some())
    }
}
