//! Inline-button payloads.
//!
//! Telegram caps callback data at 64 bytes, so actions use short
//! colon-separated tags: `ev_reg:<event>`, `adm:ok:<event>:<user>`.
//! Admin actions all live under the `adm` prefix.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::event::{EventId, EventType};
use crate::domain::location::LocationId;
use crate::domain::user::TelegramId;
use crate::utils::validation::validate_entity_id;

/// Telegram's limit on `callback_data`.
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackParseError {
    #[error("empty callback data")]
    Empty,
    #[error("unknown callback action '{0}'")]
    Unknown(String),
    #[error("invalid id in callback data: {0}")]
    InvalidId(String),
    #[error("invalid user id '{0}'")]
    InvalidUser(String),
    #[error("invalid event type '{0}'")]
    InvalidEventType(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Menu,
    Locations,
    Location(LocationId),
    LocationEvents(LocationId),
    Events,
    MyEvents,
    Event(EventId),
    Register(EventId),
    Unregister(EventId),
    Participants(EventId),

    Admin,
    AdminNewLocation,
    AdminLocations,
    AdminDeleteLocations,
    AdminDeleteLocation(LocationId),
    AdminEvents,
    AdminEventsByType(EventType),
    AdminAllEvents,
    AdminModeration,
    AdminEvent(EventId),
    AdminDeleteEvent(EventId),
    AdminEventModeration(EventId),
    AdminNewEvent,
    AdminNewEventLocation(LocationId),
    AdminNewEventType(LocationId, EventType),
    AdminRegistration(EventId, TelegramId),
    AdminApprove(EventId, TelegramId),
    AdminReject(EventId, TelegramId),
}

impl CallbackAction {
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Self::Admin
                | Self::AdminNewLocation
                | Self::AdminLocations
                | Self::AdminDeleteLocations
                | Self::AdminDeleteLocation(_)
                | Self::AdminEvents
                | Self::AdminEventsByType(_)
                | Self::AdminAllEvents
                | Self::AdminModeration
                | Self::AdminEvent(_)
                | Self::AdminDeleteEvent(_)
                | Self::AdminEventModeration(_)
                | Self::AdminNewEvent
                | Self::AdminNewEventLocation(_)
                | Self::AdminNewEventType(..)
                | Self::AdminRegistration(..)
                | Self::AdminApprove(..)
                | Self::AdminReject(..)
        )
    }

    /// Encoded payload for an inline button.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

fn type_code(event_type: EventType) -> &'static str {
    match event_type {
        EventType::Training => "t",
        EventType::Competition => "c",
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Menu => f.write_str("menu"),
            Self::Locations => f.write_str("locations"),
            Self::Location(id) => write!(f, "loc:{id}"),
            Self::LocationEvents(id) => write!(f, "loc_ev:{id}"),
            Self::Events => f.write_str("events"),
            Self::MyEvents => f.write_str("my_events"),
            Self::Event(id) => write!(f, "ev:{id}"),
            Self::Register(id) => write!(f, "ev_reg:{id}"),
            Self::Unregister(id) => write!(f, "ev_unreg:{id}"),
            Self::Participants(id) => write!(f, "ev_users:{id}"),
            Self::Admin => f.write_str("adm"),
            Self::AdminNewLocation => f.write_str("adm:loc_new"),
            Self::AdminLocations => f.write_str("adm:loc_list"),
            Self::AdminDeleteLocations => f.write_str("adm:loc_del"),
            Self::AdminDeleteLocation(id) => write!(f, "adm:loc_del:{id}"),
            Self::AdminEvents => f.write_str("adm:events"),
            Self::AdminEventsByType(t) => write!(f, "adm:ev_t:{t}"),
            Self::AdminAllEvents => f.write_str("adm:ev_all"),
            Self::AdminModeration => f.write_str("adm:mod"),
            Self::AdminEvent(id) => write!(f, "adm:ev:{id}"),
            Self::AdminDeleteEvent(id) => write!(f, "adm:ev_del:{id}"),
            Self::AdminEventModeration(id) => write!(f, "adm:ev_mod:{id}"),
            Self::AdminNewEvent => f.write_str("adm:new"),
            Self::AdminNewEventLocation(id) => write!(f, "adm:new_loc:{id}"),
            Self::AdminNewEventType(id, t) => write!(f, "adm:new_type:{id}:{}", type_code(*t)),
            Self::AdminRegistration(e, u) => write!(f, "adm:reg:{e}:{u}"),
            Self::AdminApprove(e, u) => write!(f, "adm:ok:{e}:{u}"),
            Self::AdminReject(e, u) => write!(f, "adm:no:{e}:{u}"),
        }
    }
}

fn location_id(raw: &str) -> Result<LocationId, CallbackParseError> {
    validate_entity_id(raw).map_err(|e| CallbackParseError::InvalidId(e.to_string()))?;
    Ok(LocationId::from(raw))
}

fn event_id(raw: &str) -> Result<EventId, CallbackParseError> {
    validate_entity_id(raw).map_err(|e| CallbackParseError::InvalidId(e.to_string()))?;
    Ok(EventId::from(raw))
}

fn user_id(raw: &str) -> Result<TelegramId, CallbackParseError> {
    raw.parse::<TelegramId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| CallbackParseError::InvalidUser(raw.to_string()))
}

impl FromStr for CallbackAction {
    type Err = CallbackParseError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        if data.is_empty() {
            return Err(CallbackParseError::Empty);
        }

        let parts: Vec<&str> = data.split(':').collect();
        let action = match parts.as_slice() {
            ["menu"] => Self::Menu,
            ["locations"] => Self::Locations,
            ["loc", id] => Self::Location(location_id(id)?),
            ["loc_ev", id] => Self::LocationEvents(location_id(id)?),
            ["events"] => Self::Events,
            ["my_events"] => Self::MyEvents,
            ["ev", id] => Self::Event(event_id(id)?),
            ["ev_reg", id] => Self::Register(event_id(id)?),
            ["ev_unreg", id] => Self::Unregister(event_id(id)?),
            ["ev_users", id] => Self::Participants(event_id(id)?),

            ["adm"] => Self::Admin,
            ["adm", "loc_new"] => Self::AdminNewLocation,
            ["adm", "loc_list"] => Self::AdminLocations,
            ["adm", "loc_del"] => Self::AdminDeleteLocations,
            ["adm", "loc_del", id] => Self::AdminDeleteLocation(location_id(id)?),
            ["adm", "events"] => Self::AdminEvents,
            ["adm", "ev_t", t] => Self::AdminEventsByType(
                t.parse()
                    .map_err(|_| CallbackParseError::InvalidEventType((*t).to_string()))?,
            ),
            ["adm", "ev_all"] => Self::AdminAllEvents,
            ["adm", "mod"] => Self::AdminModeration,
            ["adm", "ev", id] => Self::AdminEvent(event_id(id)?),
            ["adm", "ev_del", id] => Self::AdminDeleteEvent(event_id(id)?),
            ["adm", "ev_mod", id] => Self::AdminEventModeration(event_id(id)?),
            ["adm", "new"] => Self::AdminNewEvent,
            ["adm", "new_loc", id] => Self::AdminNewEventLocation(location_id(id)?),
            ["adm", "new_type", id, code] => {
                let event_type = match *code {
                    "t" => EventType::Training,
                    "c" => EventType::Competition,
                    other => return Err(CallbackParseError::InvalidEventType(other.to_string())),
                };
                Self::AdminNewEventType(location_id(id)?, event_type)
            }
            ["adm", "reg", e, u] => Self::AdminRegistration(event_id(e)?, user_id(u)?),
            ["adm", "ok", e, u] => Self::AdminApprove(event_id(e)?, user_id(u)?),
            ["adm", "no", e, u] => Self::AdminReject(event_id(e)?, user_id(u)?),
            _ => return Err(CallbackParseError::Unknown(data.to_string())),
        };
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn test_parse_user_actions() {
        assert_eq!("menu".parse::<CallbackAction>().unwrap(), CallbackAction::Menu);
        assert_eq!(
            format!("ev_reg:{UUID}").parse::<CallbackAction>().unwrap(),
            CallbackAction::Register(EventId::from(UUID))
        );
        assert_eq!(
            format!("loc_ev:{UUID}").parse::<CallbackAction>().unwrap(),
            CallbackAction::LocationEvents(LocationId::from(UUID))
        );
    }

    #[test]
    fn test_parse_admin_actions() {
        assert_eq!(
            format!("adm:ok:{UUID}:12345").parse::<CallbackAction>().unwrap(),
            CallbackAction::AdminApprove(EventId::from(UUID), 12345)
        );
        assert_eq!(
            "adm:ev_t:competition".parse::<CallbackAction>().unwrap(),
            CallbackAction::AdminEventsByType(EventType::Competition)
        );
        assert_eq!(
            format!("adm:new_type:{UUID}:t").parse::<CallbackAction>().unwrap(),
            CallbackAction::AdminNewEventType(LocationId::from(UUID), EventType::Training)
        );
    }

    #[test]
    fn test_encode_matches_parse() {
        let actions = vec![
            CallbackAction::Menu,
            CallbackAction::MyEvents,
            CallbackAction::Participants(EventId::from(UUID)),
            CallbackAction::AdminDeleteLocation(LocationId::from(UUID)),
            CallbackAction::AdminEventsByType(EventType::Training),
            CallbackAction::AdminNewEventType(LocationId::from(UUID), EventType::Competition),
            CallbackAction::AdminReject(EventId::from(UUID), 777),
        ];
        for action in actions {
            assert_eq!(action.encode().parse::<CallbackAction>().unwrap(), action);
        }
    }

    #[test]
    fn test_longest_payload_fits() {
        let action = CallbackAction::AdminRegistration(EventId::from(UUID), TelegramId::MAX);
        assert!(action.encode().len() <= MAX_CALLBACK_DATA_LEN);

        let action = CallbackAction::AdminNewEventType(LocationId::from(UUID), EventType::Competition);
        assert!(action.encode().len() <= MAX_CALLBACK_DATA_LEN);
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!("".parse::<CallbackAction>(), Err(CallbackParseError::Empty));
        assert!(matches!(
            "poll:1:yes".parse::<CallbackAction>(),
            Err(CallbackParseError::Unknown(_))
        ));
        assert!(matches!(
            format!("adm:ok:{UUID}:abc").parse::<CallbackAction>(),
            Err(CallbackParseError::InvalidUser(_))
        ));
        assert!(matches!(
            format!("adm:no:{UUID}:-5").parse::<CallbackAction>(),
            Err(CallbackParseError::InvalidUser(_))
        ));
        assert!(matches!(
            "adm:ev_t:party".parse::<CallbackAction>(),
            Err(CallbackParseError::InvalidEventType(_))
        ));
        assert!(matches!(
            "ev:".parse::<CallbackAction>(),
            Err(CallbackParseError::InvalidId(_))
        ));
    }

    #[test]
    fn test_admin_classification() {
        assert!(CallbackAction::AdminModeration.is_admin());
        assert!(CallbackAction::AdminApprove(EventId::from(UUID), 1).is_admin());
        assert!(!CallbackAction::Register(EventId::from(UUID)).is_admin());
        assert!(!CallbackAction::Participants(EventId::from(UUID)).is_admin());
    }
}
