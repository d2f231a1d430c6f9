use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::models::{
    assemble_events, format_timestamp, EventRow, LocationRow, RegistrationRow, UserRow,
};
use crate::domain::error::{StoreError, StoreResult};
use crate::domain::event::{Event, EventId};
use crate::domain::location::{Location, LocationId};
use crate::domain::repository::{EventRepository, LocationRepository, UserRepository};
use crate::domain::user::{TelegramId, User};
use crate::utils::logging::{log_database_error, log_database_operation};

/// Repository backed by the SQLite pool.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_events(&self, rows: Vec<EventRow>) -> StoreResult<Vec<Event>> {
        let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
        let registrations = RegistrationRow::find_by_events(&self.pool, &ids)
            .await
            .map_err(db_error("SELECT", "event_registrations"))?;
        assemble_events(rows, registrations)
    }
}

fn db_error(operation: &'static str, table: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| {
        log_database_error(operation, table, &e.to_string(), None);
        StoreError::Database(e)
    }
}

#[async_trait]
impl LocationRepository for SqliteRepository {
    async fn get_location(&self, id: &LocationId) -> StoreResult<Option<Location>> {
        LocationRow::find_by_id(&self.pool, id.as_str())
            .await
            .map_err(db_error("SELECT", "locations"))?
            .map(LocationRow::into_location)
            .transpose()
    }

    async fn list_locations(&self) -> StoreResult<Vec<Location>> {
        LocationRow::find_all(&self.pool)
            .await
            .map_err(db_error("SELECT", "locations"))?
            .into_iter()
            .map(LocationRow::into_location)
            .collect()
    }

    async fn save_location(&self, location: &Location) -> StoreResult<()> {
        LocationRow::upsert(&self.pool, location)
            .await
            .map_err(db_error("UPSERT", "locations"))?;
        log_database_operation("UPSERT", "locations", Some(location.id.as_str()));
        Ok(())
    }

    async fn delete_location(&self, id: &LocationId) -> StoreResult<bool> {
        let deleted_at = format_timestamp(&Utc::now());
        let mut tx = self.pool.begin().await.map_err(db_error("BEGIN", "locations"))?;

        let deleted = LocationRow::soft_delete_cascade(&mut tx, id.as_str(), &deleted_at)
            .await
            .map_err(db_error("DELETE", "locations"))?;
        if !deleted {
            tx.rollback().await.map_err(db_error("ROLLBACK", "locations"))?;
            return Ok(false);
        }

        tx.commit().await.map_err(db_error("COMMIT", "locations"))?;
        log_database_operation("DELETE", "locations", Some(id.as_str()));
        Ok(true)
    }
}

#[async_trait]
impl EventRepository for SqliteRepository {
    async fn get_event(&self, id: &EventId) -> StoreResult<Option<Event>> {
        let Some(row) = EventRow::find_by_id(&self.pool, id.as_str())
            .await
            .map_err(db_error("SELECT", "events"))?
        else {
            return Ok(None);
        };

        let registrations = RegistrationRow::find_by_event(&self.pool, id.as_str())
            .await
            .map_err(db_error("SELECT", "event_registrations"))?;
        row.into_event(registrations).map(Some)
    }

    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        let rows = EventRow::find_all(&self.pool)
            .await
            .map_err(db_error("SELECT", "events"))?;
        self.load_events(rows).await
    }

    async fn list_events_by_location(&self, location_id: &LocationId) -> StoreResult<Vec<Event>> {
        let rows = EventRow::find_by_location(&self.pool, location_id.as_str())
            .await
            .map_err(db_error("SELECT", "events"))?;
        self.load_events(rows).await
    }

    async fn list_events_by_user(&self, user_id: TelegramId) -> StoreResult<Vec<Event>> {
        let rows = EventRow::find_by_user(&self.pool, user_id)
            .await
            .map_err(db_error("SELECT", "events"))?;
        self.load_events(rows).await
    }

    async fn insert_event(&self, event: &Event) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_error("BEGIN", "events"))?;

        EventRow::insert(&mut tx, event)
            .await
            .map_err(db_error("INSERT", "events"))?;
        RegistrationRow::replace_for_event(&mut tx, event)
            .await
            .map_err(db_error("REPLACE", "event_registrations"))?;

        tx.commit().await.map_err(db_error("COMMIT", "events"))?;
        log_database_operation("INSERT", "events", Some(event.id.as_str()));
        Ok(())
    }

    async fn save_event(&self, event: &Event) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(db_error("BEGIN", "events"))?;

        let updated = EventRow::update(&mut tx, event)
            .await
            .map_err(db_error("UPDATE", "events"))?;
        if !updated {
            tx.rollback().await.map_err(db_error("ROLLBACK", "events"))?;
            tracing::warn!("Skipped save of event {}: no longer live", event.id);
            return Ok(false);
        }
        RegistrationRow::replace_for_event(&mut tx, event)
            .await
            .map_err(db_error("REPLACE", "event_registrations"))?;

        tx.commit().await.map_err(db_error("COMMIT", "events"))?;
        log_database_operation(
            "UPDATE",
            "events",
            Some(&format!("{} ({} registrations)", event.id, event.registrations.len())),
        );
        Ok(true)
    }

    async fn delete_event(&self, id: &EventId) -> StoreResult<bool> {
        let deleted_at = format_timestamp(&Utc::now());
        let mut tx = self.pool.begin().await.map_err(db_error("BEGIN", "events"))?;

        let deleted = EventRow::soft_delete(&mut tx, id.as_str(), &deleted_at)
            .await
            .map_err(db_error("DELETE", "events"))?;
        if !deleted {
            tx.rollback().await.map_err(db_error("ROLLBACK", "events"))?;
            return Ok(false);
        }
        let removed = RegistrationRow::delete_for_event(&mut tx, id.as_str())
            .await
            .map_err(db_error("DELETE", "event_registrations"))?;

        tx.commit().await.map_err(db_error("COMMIT", "events"))?;
        log_database_operation(
            "DELETE",
            "events",
            Some(&format!("{id} with {removed} registrations")),
        );
        Ok(true)
    }
}

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn get_user_by_telegram_id(&self, telegram_id: TelegramId) -> StoreResult<Option<User>> {
        UserRow::find_by_telegram_id(&self.pool, telegram_id)
            .await
            .map_err(db_error("SELECT", "users"))?
            .map(UserRow::into_user)
            .transpose()
    }

    async fn save_user(&self, telegram_id: TelegramId, name: &str, surname: &str) -> StoreResult<User> {
        let row = UserRow::upsert(&self.pool, telegram_id, name, surname)
            .await
            .map_err(db_error("UPSERT", "users"))?;
        log_database_operation("UPSERT", "users", Some(&telegram_id.to_string()));
        row.into_user()
    }

    async fn delete_user(&self, telegram_id: TelegramId) -> StoreResult<bool> {
        UserRow::delete(&self.pool, telegram_id)
            .await
            .map_err(db_error("DELETE", "users"))
    }
}
