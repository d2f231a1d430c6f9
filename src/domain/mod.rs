//! Club domain: locations, members, events and the registration engine.
//!
//! Everything in here is transport-agnostic. Services talk to storage only
//! through the traits in [`repository`] and hand back plain data or a
//! [`error::DomainError`].

/// Event registration engine with per-event serialization
pub mod engine;
/// Domain, validation and storage error types
pub mod error;
/// Event aggregate, registration state and inputs
pub mod event;
/// Location entity and registry service
pub mod location;
/// Admin-facing moderation views built on the engine
pub mod moderation;
/// Persistence traits implemented by the database layer
pub mod repository;
/// Member profiles keyed by Telegram id
pub mod user;

/// Trims an optional free-text field, mapping blank input to `None`.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::normalize_optional;

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(None), None);
        assert_eq!(normalize_optional(Some("   ".to_string())), None);
        assert_eq!(
            normalize_optional(Some("  Gym  ".to_string())),
            Some("Gym".to_string())
        );
    }
}
