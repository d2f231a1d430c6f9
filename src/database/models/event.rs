use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use super::{format_timestamp, parse_timestamp};
use crate::domain::error::{StoreError, StoreResult};
use crate::domain::event::{Event, EventId, EventRegistration, EventType, RegistrationStatus};
use crate::domain::location::LocationId;

const EVENT_COLUMNS: &str = "id, name, event_type, starts_at, max_players, remaining, location_id, trainer, description, payment_phone, price, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EventRow {
    pub id: String,
    pub name: String,
    pub event_type: String,
    pub starts_at: String,
    pub max_players: i64,
    pub remaining: i64,
    pub location_id: String,
    pub trainer: Option<String>,
    pub description: Option<String>,
    pub payment_phone: Option<String>,
    pub price: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RegistrationRow {
    pub event_id: String,
    pub user_id: i64,
    pub status: String, // 'pending', 'approved', 'rejected'
    pub created_at: String,
    pub updated_at: String,
}

impl EventRow {
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ? AND deleted_at IS NULL");
        sqlx::query_as::<_, EventRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE deleted_at IS NULL ORDER BY starts_at"
        );
        sqlx::query_as::<_, EventRow>(&query).fetch_all(pool).await
    }

    pub async fn find_by_location(
        pool: &SqlitePool,
        location_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE location_id = ? AND deleted_at IS NULL ORDER BY starts_at"
        );
        sqlx::query_as::<_, EventRow>(&query)
            .bind(location_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE deleted_at IS NULL AND id IN (SELECT event_id FROM event_registrations WHERE user_id = ?) ORDER BY starts_at"
        );
        sqlx::query_as::<_, EventRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn insert(conn: &mut SqliteConnection, event: &Event) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO events (id, name, event_type, starts_at, max_players, remaining, location_id,
                                trainer, description, payment_phone, price, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.id.as_str())
        .bind(&event.name)
        .bind(event.event_type.as_str())
        .bind(format_timestamp(&event.date))
        .bind(i64::from(event.max_players))
        .bind(i64::from(event.remaining))
        .bind(event.location_id.as_str())
        .bind(&event.trainer)
        .bind(&event.description)
        .bind(&event.payment_phone)
        .bind(event.price)
        .bind(format_timestamp(&event.created_at))
        .bind(format_timestamp(&event.updated_at))
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Overwrites a live event row. Returns `false` when the event is
    /// missing or soft-deleted.
    pub async fn update(conn: &mut SqliteConnection, event: &Event) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE events SET
                name = ?,
                event_type = ?,
                starts_at = ?,
                max_players = ?,
                remaining = ?,
                location_id = ?,
                trainer = ?,
                description = ?,
                payment_phone = ?,
                price = ?,
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&event.name)
        .bind(event.event_type.as_str())
        .bind(format_timestamp(&event.date))
        .bind(i64::from(event.max_players))
        .bind(i64::from(event.remaining))
        .bind(event.location_id.as_str())
        .bind(&event.trainer)
        .bind(&event.description)
        .bind(&event.payment_phone)
        .bind(event.price)
        .bind(format_timestamp(&event.updated_at))
        .bind(event.id.as_str())
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Marks the event deleted. Returns `false` when no live event matched.
    pub async fn soft_delete(
        conn: &mut SqliteConnection,
        id: &str,
        deleted_at: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE events SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(deleted_at)
        .bind(deleted_at)
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Builds the aggregate. `remaining` and `players` are left for the
    /// engine to recompute; the stored `remaining` is only a cache.
    pub fn into_event(self, registrations: Vec<RegistrationRow>) -> StoreResult<Event> {
        let event_type: EventType = self
            .event_type
            .parse()
            .map_err(|e: String| StoreError::Corrupt(format!("events.event_type: {e}")))?;
        let max_players = u32::try_from(self.max_players)
            .map_err(|_| StoreError::Corrupt(format!("events.max_players {}", self.max_players)))?;
        let remaining = u32::try_from(self.remaining)
            .map_err(|_| StoreError::Corrupt(format!("events.remaining {}", self.remaining)))?;

        let registrations = registrations
            .into_iter()
            .map(|row| row.into_registration().map(|r| (r.user_id, r)))
            .collect::<StoreResult<BTreeMap<_, _>>>()?;

        Ok(Event {
            id: EventId::from(self.id),
            name: self.name,
            event_type,
            date: parse_timestamp("events.starts_at", &self.starts_at)?,
            max_players,
            remaining,
            players: Vec::new(),
            registrations,
            location_id: LocationId::from(self.location_id),
            trainer: self.trainer,
            description: self.description,
            payment_phone: self.payment_phone,
            price: self.price,
            created_at: parse_timestamp("events.created_at", &self.created_at)?,
            updated_at: parse_timestamp("events.updated_at", &self.updated_at)?,
        })
    }
}

impl RegistrationRow {
    pub async fn find_by_event(pool: &SqlitePool, event_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, RegistrationRow>(
            "SELECT event_id, user_id, status, created_at, updated_at FROM event_registrations WHERE event_id = ? ORDER BY created_at"
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
    }

    /// Batch fetch registrations for multiple events to avoid N+1 queries
    pub async fn find_by_events(
        pool: &SqlitePool,
        event_ids: &[String],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = event_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query = format!(
            "SELECT event_id, user_id, status, created_at, updated_at FROM event_registrations WHERE event_id IN ({placeholders}) ORDER BY event_id, created_at"
        );

        let mut query_builder = sqlx::query_as::<_, RegistrationRow>(&query);
        for event_id in event_ids {
            query_builder = query_builder.bind(event_id);
        }

        query_builder.fetch_all(pool).await
    }

    /// Replaces the event's registration set with the aggregate's.
    pub async fn replace_for_event(
        conn: &mut SqliteConnection,
        event: &Event,
    ) -> Result<(), sqlx::Error> {
        Self::delete_for_event(&mut *conn, event.id.as_str()).await?;

        for registration in event.registrations.values() {
            sqlx::query(
                r#"
                INSERT INTO event_registrations (event_id, user_id, status, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(event.id.as_str())
            .bind(registration.user_id)
            .bind(registration.status.as_str())
            .bind(format_timestamp(&registration.created_at))
            .bind(format_timestamp(&registration.updated_at))
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn delete_for_event(conn: &mut SqliteConnection, event_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM event_registrations WHERE event_id = ?")
            .bind(event_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    pub fn into_registration(self) -> StoreResult<EventRegistration> {
        let status: RegistrationStatus = self
            .status
            .parse()
            .map_err(|e: String| StoreError::Corrupt(format!("event_registrations.status: {e}")))?;
        Ok(EventRegistration {
            user_id: self.user_id,
            status,
            created_at: parse_timestamp("event_registrations.created_at", &self.created_at)?,
            updated_at: parse_timestamp("event_registrations.updated_at", &self.updated_at)?,
        })
    }
}

/// Attaches batch-loaded registrations to their event rows.
pub fn assemble_events(rows: Vec<EventRow>, registrations: Vec<RegistrationRow>) -> StoreResult<Vec<Event>> {
    let mut by_event: HashMap<String, Vec<RegistrationRow>> = HashMap::new();
    for registration in registrations {
        by_event
            .entry(registration.event_id.clone())
            .or_default()
            .push(registration);
    }

    rows.into_iter()
        .map(|row| {
            let registrations = by_event.remove(&row.id).unwrap_or_default();
            row.into_event(registrations)
        })
        .collect()
}
