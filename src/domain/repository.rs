use async_trait::async_trait;

use crate::domain::error::StoreResult;
use crate::domain::event::{Event, EventId};
use crate::domain::location::{Location, LocationId};
use crate::domain::user::{TelegramId, User};

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn get_location(&self, id: &LocationId) -> StoreResult<Option<Location>>;

    async fn list_locations(&self) -> StoreResult<Vec<Location>>;

    /// Insert or overwrite by id.
    async fn save_location(&self, location: &Location) -> StoreResult<()>;

    /// Removes the location together with its events and their
    /// registrations. Returns `false` when nothing matched.
    async fn delete_location(&self, id: &LocationId) -> StoreResult<bool>;
}

/// Events are loaded and saved as whole aggregates, registrations included.
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn get_event(&self, id: &EventId) -> StoreResult<Option<Event>>;

    async fn list_events(&self) -> StoreResult<Vec<Event>>;

    async fn list_events_by_location(&self, location_id: &LocationId) -> StoreResult<Vec<Event>>;

    /// Events where the user holds a registration of any status.
    async fn list_events_by_user(&self, user_id: TelegramId) -> StoreResult<Vec<Event>>;

    /// Stores a newly created event.
    async fn insert_event(&self, event: &Event) -> StoreResult<()>;

    /// Atomically replaces the event row and its full registration set.
    /// Returns `false` and writes nothing when the event is no longer
    /// live, e.g. its location was deleted after the aggregate was loaded.
    async fn save_event(&self, event: &Event) -> StoreResult<bool>;

    /// Removes the event and every registration. Returns `false` when
    /// nothing matched.
    async fn delete_event(&self, id: &EventId) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user_by_telegram_id(&self, telegram_id: TelegramId) -> StoreResult<Option<User>>;

    /// Upsert keyed by `telegram_id`; the internal id of an existing row
    /// is preserved.
    async fn save_user(&self, telegram_id: TelegramId, name: &str, surname: &str)
        -> StoreResult<User>;

    async fn delete_user(&self, telegram_id: TelegramId) -> StoreResult<bool>;
}
