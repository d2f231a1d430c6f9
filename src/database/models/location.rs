use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use super::{format_timestamp, parse_timestamp};
use crate::domain::error::StoreResult;
use crate::domain::location::{Location, LocationId};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LocationRow {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub map_url: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl LocationRow {
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, LocationRow>(
            "SELECT id, name, address, map_url, description, created_at, updated_at FROM locations WHERE id = ? AND deleted_at IS NULL"
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, LocationRow>(
            "SELECT id, name, address, map_url, description, created_at, updated_at FROM locations WHERE deleted_at IS NULL ORDER BY name"
        )
        .fetch_all(pool)
        .await
    }

    pub async fn upsert(pool: &SqlitePool, location: &Location) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO locations (id, name, address, map_url, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                address = excluded.address,
                map_url = excluded.map_url,
                description = excluded.description,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(location.id.as_str())
        .bind(&location.name)
        .bind(&location.address)
        .bind(&location.map_url)
        .bind(&location.description)
        .bind(format_timestamp(&location.created_at))
        .bind(format_timestamp(&location.updated_at))
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Soft-deletes the location and its live events and drops their
    /// registrations. Returns `false` when no live location matched.
    pub async fn soft_delete_cascade(
        conn: &mut SqliteConnection,
        id: &str,
        deleted_at: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE locations SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(deleted_at)
        .bind(deleted_at)
        .bind(id)
        .execute(&mut *conn)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query(
            "DELETE FROM event_registrations WHERE event_id IN (SELECT id FROM events WHERE location_id = ? AND deleted_at IS NULL)",
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            "UPDATE events SET deleted_at = ?, updated_at = ? WHERE location_id = ? AND deleted_at IS NULL",
        )
        .bind(deleted_at)
        .bind(deleted_at)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(true)
    }

    pub fn into_location(self) -> StoreResult<Location> {
        Ok(Location {
            id: LocationId::from(self.id),
            name: self.name,
            address: self.address,
            map_url: self.map_url,
            description: self.description,
            created_at: parse_timestamp("locations.created_at", &self.created_at)?,
            updated_at: parse_timestamp("locations.updated_at", &self.updated_at)?,
        })
    }
}
