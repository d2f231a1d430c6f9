use std::fmt;

use teloxide::types::{ChatId, User as TelegramUser};
use tracing::{debug, error, info, warn};

/// Who triggered an update, formatted as `name(id) in chat N`.
#[derive(Debug, Clone)]
pub struct Actor {
    pub username: String,
    pub user_id: i64,
    pub chat_id: i64,
}

impl Actor {
    pub fn new(user: Option<&TelegramUser>, chat_id: ChatId) -> Self {
        Self {
            username: user
                .and_then(|u| u.username.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            user_id: user.map_or(0, |u| u.id.0 as i64),
            chat_id: chat_id.0,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}) in chat {}", self.username, self.user_id, self.chat_id)
    }
}

/// Logs command start with consistent format
pub fn log_command_start(command: &str, actor: &Actor, details: Option<&str>) {
    match details {
        Some(d) => info!("CMD_START: {} by {} - {}", command, actor, d),
        None => info!("CMD_START: {} by {}", command, actor),
    }
}

/// Logs command completion with consistent format
pub fn log_command_success(command: &str, actor: &Actor, details: Option<&str>) {
    match details {
        Some(d) => info!("CMD_SUCCESS: {} by {} - {}", command, actor, d),
        None => info!("CMD_SUCCESS: {} by {}", command, actor),
    }
}

/// Logs command errors with consistent format
pub fn log_command_error(command: &str, actor: &Actor, error: &str) {
    error!("CMD_ERROR: {} by {} - {}", command, actor, error);
}

/// Refused state transitions and other expected rejections
pub fn log_command_warning(command: &str, actor: &Actor, reason: &str) {
    warn!("CMD_WARN: {} by {} - {}", command, actor, reason);
}

/// Logs validation errors with consistent format
pub fn log_validation_error(command: &str, field: &str, error: &str, actor: &Actor) {
    warn!(
        "VALIDATION_ERROR: {} - field '{}' invalid: {} - user {}",
        command, field, error, actor
    );
}

/// Non-admin attempted an admin action
pub fn log_admin_denied(action: &str, actor: &Actor) {
    warn!("ADMIN_DENIED: {} by {}", action, actor);
}

/// Logs database operations with consistent format
pub fn log_database_operation(operation: &str, table: &str, details: Option<&str>) {
    match details {
        Some(d) => debug!("DB_OP: {} on {} - {}", operation, table, d),
        None => debug!("DB_OP: {} on {}", operation, table),
    }
}

/// Logs database errors with consistent format
pub fn log_database_error(operation: &str, table: &str, error: &str, details: Option<&str>) {
    match details {
        Some(d) => error!("DB_ERROR: {} on {} failed: {} - {}", operation, table, error, d),
        None => error!("DB_ERROR: {} on {} failed: {}", operation, table, error),
    }
}

/// Logs registration state changes with consistent format
pub fn log_registration_transition(event_id: &str, user_id: i64, from: &str, to: &str) {
    info!("REG_TRANSITION: event {} user {} {} -> {}", event_id, user_id, from, to);
}

/// Logs system events with consistent format
pub fn log_system_event(event: &str, details: Option<&str>) {
    match details {
        Some(d) => info!("SYSTEM: {} - {}", event, d),
        None => info!("SYSTEM: {}", event),
    }
}
