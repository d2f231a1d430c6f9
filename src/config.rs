use anyhow::{anyhow, Result};
use chrono::{FixedOffset, Offset, Utc};
use std::collections::HashSet;
use std::env;

use crate::utils::datetime::club_offset;
use crate::utils::validation::parse_admin_ids;

const DEFAULT_DATABASE_URL: &str = "sqlite:./data/club.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub database_url: String,
    pub http_port: u16,
    /// Telegram user ids allowed to use admin actions.
    pub admin_ids: HashSet<i64>,
    pub wizard_ttl_minutes: u64,
    pub location_address_required: bool,
    /// Adds payment phone and price steps to the event wizard.
    pub event_payment_details: bool,
    pub utc_offset_hours: i32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;

        if token.trim().is_empty() {
            return Err(anyhow!("TELEGRAM_BOT_TOKEN must be set"));
        }

        let database_url = Self::database_url_from_env();

        let http_port = non_empty_var("HTTP_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| anyhow!("Invalid HTTP_PORT"))?;

        let (admin_ids, invalid) = parse_admin_ids(&env::var("ADMIN_IDS").unwrap_or_default());
        for entry in invalid {
            tracing::warn!("Skipping invalid ADMIN_IDS entry '{}'", entry);
        }
        if admin_ids.is_empty() {
            tracing::warn!("ADMIN_IDS is empty; admin actions are disabled");
        }

        let wizard_ttl_minutes: u64 = non_empty_var("WIZARD_TTL_MINUTES")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map_err(|_| anyhow!("Invalid WIZARD_TTL_MINUTES"))?;
        if wizard_ttl_minutes == 0 {
            return Err(anyhow!("WIZARD_TTL_MINUTES must be greater than 0"));
        }

        let utc_offset_hours: i32 = non_empty_var("UTC_OFFSET_HOURS")
            .unwrap_or_else(|| "0".to_string())
            .parse()
            .map_err(|_| anyhow!("Invalid UTC_OFFSET_HOURS"))?;
        if club_offset(utc_offset_hours).is_none() {
            return Err(anyhow!("UTC_OFFSET_HOURS must be between -12 and 14"));
        }

        Ok(Config {
            telegram_bot_token: token,
            database_url,
            http_port,
            admin_ids,
            wizard_ttl_minutes,
            location_address_required: bool_var("LOCATION_ADDRESS_REQUIRED")?,
            event_payment_details: bool_var("EVENT_PAYMENT_DETAILS")?,
            utc_offset_hours,
        })
    }

    /// `DATABASE_URL` or the default SQLite file. Needs no bot token, so
    /// the migration tool can use it alone.
    pub fn database_url_from_env() -> String {
        non_empty_var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// The club's fixed offset, UTC when the configured hours are out of range.
    pub fn offset(&self) -> FixedOffset {
        club_offset(self.utc_offset_hours).unwrap_or_else(|| Utc.fix())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn bool_var(name: &str) -> Result<bool> {
    match non_empty_var(name).map(|v| v.to_lowercase()).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(anyhow!("Invalid {}: expected true or false", name)),
    }
}
