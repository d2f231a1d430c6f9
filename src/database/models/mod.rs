pub mod event;
pub mod location;
pub mod user;

pub use event::*;
pub use location::*;
pub use user::*;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::error::{StoreError, StoreResult};

/// Fixed-width RFC 3339 so text columns sort chronologically.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(column: &str, value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("{column} '{value}': {e}")))
}
