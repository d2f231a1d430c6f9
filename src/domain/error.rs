use thiserror::Error;

use crate::domain::event::RegistrationStatus;

/// Input-shape failures. Always recoverable by the caller correcting input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name is required")]
    NameRequired,

    #[error("location is required")]
    LocationRequired,

    #[error("address is required")]
    AddressRequired,

    #[error("map URL must be an absolute http(s) URL")]
    InvalidMapUrl,

    #[error("event date cannot be in the past")]
    DateInPast,

    #[error("capacity must be greater than 0")]
    CapacityInvalid,

    #[error("capacity cannot be lower than the {approved} already approved players")]
    CapacityBelowApproved { approved: u32 },

    #[error("price cannot be negative")]
    PriceInvalid,
}

/// Failures of the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("storage unavailable")]
    Unavailable,
}

/// Every failure the location registry, user directory and registration
/// engine can report.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("location not found")]
    LocationNotFound,

    #[error("event not found")]
    EventNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("registration not found")]
    RegistrationNotFound,

    #[error("event is full")]
    EventFull,

    #[error("user is already registered for this event")]
    AlreadyRegistered,

    #[error("registration already approved")]
    AlreadyApproved,

    #[error("registration already rejected")]
    AlreadyRejected,

    #[error("cannot move registration from {from} to {to}")]
    InvalidTransition {
        from: RegistrationStatus,
        to: RegistrationStatus,
    },

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl DomainError {
    /// State-machine guards: the request was refused and nothing changed.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::AlreadyRegistered
                | Self::AlreadyApproved
                | Self::AlreadyRejected
                | Self::InvalidTransition { .. }
        )
    }

    /// Failures the user cannot fix; surfaced as "try again later".
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Stable short code used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::LocationNotFound => "LOCATION_NOT_FOUND",
            Self::EventNotFound => "EVENT_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::RegistrationNotFound => "REGISTRATION_NOT_FOUND",
            Self::EventFull => "EVENT_FULL",
            Self::AlreadyRegistered => "ALREADY_REGISTERED",
            Self::AlreadyApproved => "ALREADY_APPROVED",
            Self::AlreadyRejected => "ALREADY_REJECTED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Storage(_) => "STORAGE",
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for repository calls.
pub type StoreResult<T> = Result<T, StoreError>;
