use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::{format_timestamp, parse_timestamp};
use crate::domain::error::StoreResult;
use crate::domain::user::User;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserRow {
    pub id: i64,
    pub telegram_id: i64,
    pub name: String,
    pub surname: String,
    pub created_at: String,
    pub updated_at: String,
}

impl UserRow {
    pub async fn find_by_telegram_id(
        pool: &SqlitePool,
        telegram_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, telegram_id, name, surname, created_at, updated_at FROM users WHERE telegram_id = ?"
        )
        .bind(telegram_id)
        .fetch_optional(pool)
        .await
    }

    /// Single-statement upsert; the unique index on `telegram_id` keeps
    /// concurrent callers from creating duplicates.
    pub async fn upsert(
        pool: &SqlitePool,
        telegram_id: i64,
        name: &str,
        surname: &str,
    ) -> Result<Self, sqlx::Error> {
        let now = format_timestamp(&Utc::now());

        sqlx::query(
            r#"
            INSERT INTO users (telegram_id, name, surname, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(telegram_id) DO UPDATE SET
                name = excluded.name,
                surname = excluded.surname,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(telegram_id)
        .bind(name)
        .bind(surname)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;

        Self::find_by_telegram_id(pool, telegram_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn delete(pool: &SqlitePool, telegram_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE telegram_id = ?")
            .bind(telegram_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub fn into_user(self) -> StoreResult<User> {
        Ok(User {
            id: self.id,
            telegram_id: self.telegram_id,
            name: self.name,
            surname: self.surname,
            created_at: parse_timestamp("users.created_at", &self.created_at)?,
            updated_at: parse_timestamp("users.updated_at", &self.updated_at)?,
        })
    }
}
