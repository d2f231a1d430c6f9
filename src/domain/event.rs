//! The event aggregate and its registration state machine.
//!
//! ```text
//!  (none) ── request ──► pending ── approve ──► approved
//!                           └────── reject ───► rejected
//!  approved ── unregister ──► (none), seat released
//!  pending  ── unregister ──► (none)
//!  rejected ── request ─────► pending (fresh row)
//! ```
//!
//! All transitions here are pure. Loading, locking and saving are the
//! engine's job.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::{DomainError, DomainResult, ValidationError};
use crate::domain::location::LocationId;
use crate::domain::normalize_optional;
use crate::domain::user::TelegramId;

/// Opaque event identifier (UUID v4 string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Training,
    Competition,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Competition => "competition",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "training" => Ok(Self::Training),
            "competition" => Ok(Self::Competition),
            other => Err(format!("unknown event type '{other}'")),
        }
    }
}

/// Moderation state of a single registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown registration status '{other}'")),
        }
    }
}

/// One user's registration on one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRegistration {
    pub user_id: TelegramId,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event aggregate: the event plus every registration it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub event_type: EventType,
    pub date: DateTime<Utc>,
    pub max_players: u32,
    /// Derived: `max_players - approved`. Persisted only as a cache.
    pub remaining: u32,
    /// Derived: approved user ids in ascending order.
    pub players: Vec<TelegramId>,
    pub registrations: BTreeMap<TelegramId, EventRegistration>,
    pub location_id: LocationId,
    pub trainer: Option<String>,
    pub description: Option<String>,
    pub payment_phone: Option<String>,
    pub price: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEventInput {
    pub name: String,
    pub event_type: EventType,
    pub date: DateTime<Utc>,
    pub max_players: u32,
    pub location_id: LocationId,
    pub trainer: Option<String>,
    pub description: Option<String>,
    pub payment_phone: Option<String>,
    pub price: Option<i64>,
}

impl CreateEventInput {
    /// Shape checks that need no storage access.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::NameRequired);
        }
        if self.location_id.as_str().trim().is_empty() {
            return Err(ValidationError::LocationRequired);
        }
        if self.date < now {
            return Err(ValidationError::DateInPast);
        }
        if self.max_players == 0 {
            return Err(ValidationError::CapacityInvalid);
        }
        if self.price.is_some_and(|p| p < 0) {
            return Err(ValidationError::PriceInvalid);
        }
        Ok(())
    }
}

/// Partial update. `Some("")` clears an optional text field.
#[derive(Debug, Clone, Default)]
pub struct UpdateEventInput {
    pub name: Option<String>,
    pub event_type: Option<EventType>,
    pub date: Option<DateTime<Utc>>,
    pub max_players: Option<u32>,
    pub trainer: Option<String>,
    pub description: Option<String>,
    pub payment_phone: Option<String>,
    pub price: Option<i64>,
}

impl Event {
    /// Builds a new aggregate with every seat free. Input must be validated.
    pub fn new(input: CreateEventInput, now: DateTime<Utc>) -> Self {
        Self {
            id: EventId::generate(),
            name: input.name.trim().to_string(),
            event_type: input.event_type,
            date: input.date,
            max_players: input.max_players,
            remaining: input.max_players,
            players: Vec::new(),
            registrations: BTreeMap::new(),
            location_id: input.location_id,
            trainer: normalize_optional(input.trainer),
            description: normalize_optional(input.description),
            payment_phone: normalize_optional(input.payment_phone),
            price: input.price,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn approved_count(&self) -> u32 {
        let approved = self
            .registrations
            .values()
            .filter(|r| r.status == RegistrationStatus::Approved)
            .count();
        u32::try_from(approved).unwrap_or(u32::MAX)
    }

    /// Rebuilds `remaining` and `players` from the registration rows,
    /// discarding whatever cached values were loaded.
    pub fn recompute_seats(&mut self) {
        self.players = self
            .registrations
            .values()
            .filter(|r| r.status == RegistrationStatus::Approved)
            .map(|r| r.user_id)
            .collect();
        self.remaining = self.max_players.saturating_sub(self.approved_count());
    }

    pub fn is_full(&self) -> bool {
        self.remaining == 0
    }

    pub fn registration(&self, user_id: TelegramId) -> Option<&EventRegistration> {
        self.registrations.get(&user_id)
    }

    pub fn status_of(&self, user_id: TelegramId) -> Option<RegistrationStatus> {
        self.registration(user_id).map(|r| r.status)
    }

    /// Pending registrations, oldest first.
    pub fn pending_registrations(&self) -> Vec<EventRegistration> {
        let mut pending: Vec<EventRegistration> = self
            .registrations
            .values()
            .filter(|r| r.status == RegistrationStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|r| (r.created_at, r.user_id));
        pending
    }

    /// Files a pending request. Seats are not checked here: only approval
    /// consumes a seat, so the moderation queue may outgrow capacity.
    pub fn request(&mut self, user_id: TelegramId, now: DateTime<Utc>) -> DomainResult<()> {
        match self.status_of(user_id) {
            Some(RegistrationStatus::Pending | RegistrationStatus::Approved) => {
                Err(DomainError::AlreadyRegistered)
            }
            Some(RegistrationStatus::Rejected) | None => {
                self.registrations.insert(
                    user_id,
                    EventRegistration {
                        user_id,
                        status: RegistrationStatus::Pending,
                        created_at: now,
                        updated_at: now,
                    },
                );
                self.updated_at = now;
                Ok(())
            }
        }
    }

    /// Removes the user's registration, releasing the seat if it held one.
    /// Returns the status the registration had.
    pub fn unregister(
        &mut self,
        user_id: TelegramId,
        now: DateTime<Utc>,
    ) -> DomainResult<RegistrationStatus> {
        let removed = self
            .registrations
            .remove(&user_id)
            .ok_or(DomainError::RegistrationNotFound)?;
        self.recompute_seats();
        self.updated_at = now;
        Ok(removed.status)
    }

    pub fn approve(&mut self, user_id: TelegramId, now: DateTime<Utc>) -> DomainResult<()> {
        let status = self
            .status_of(user_id)
            .ok_or(DomainError::RegistrationNotFound)?;
        match status {
            RegistrationStatus::Approved => return Err(DomainError::AlreadyApproved),
            RegistrationStatus::Rejected => {
                return Err(DomainError::InvalidTransition {
                    from: RegistrationStatus::Rejected,
                    to: RegistrationStatus::Approved,
                })
            }
            RegistrationStatus::Pending => {}
        }
        if self.remaining == 0 {
            return Err(DomainError::EventFull);
        }

        self.set_status(user_id, RegistrationStatus::Approved, now);
        Ok(())
    }

    /// Marks the registration rejected. Returns the previous status so
    /// callers can tell whether a seat was released.
    pub fn reject(
        &mut self,
        user_id: TelegramId,
        now: DateTime<Utc>,
    ) -> DomainResult<RegistrationStatus> {
        let status = self
            .status_of(user_id)
            .ok_or(DomainError::RegistrationNotFound)?;
        if status == RegistrationStatus::Rejected {
            return Err(DomainError::AlreadyRejected);
        }

        self.set_status(user_id, RegistrationStatus::Rejected, now);
        Ok(status)
    }

    /// Applies a partial update. Capacity may not drop below the number of
    /// approved players; seats are recomputed afterwards.
    pub fn apply_update(
        &mut self,
        input: UpdateEventInput,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ValidationError::NameRequired);
            }
            self.name = name;
        }
        if let Some(max_players) = input.max_players {
            if max_players == 0 {
                return Err(ValidationError::CapacityInvalid);
            }
            let approved = self.approved_count();
            if max_players < approved {
                return Err(ValidationError::CapacityBelowApproved { approved });
            }
            self.max_players = max_players;
        }
        if let Some(price) = input.price {
            if price < 0 {
                return Err(ValidationError::PriceInvalid);
            }
            self.price = Some(price);
        }
        if let Some(event_type) = input.event_type {
            self.event_type = event_type;
        }
        if let Some(date) = input.date {
            self.date = date;
        }
        if input.trainer.is_some() {
            self.trainer = normalize_optional(input.trainer);
        }
        if input.description.is_some() {
            self.description = normalize_optional(input.description);
        }
        if input.payment_phone.is_some() {
            self.payment_phone = normalize_optional(input.payment_phone);
        }

        self.recompute_seats();
        self.updated_at = now;
        Ok(())
    }

    fn set_status(&mut self, user_id: TelegramId, status: RegistrationStatus, now: DateTime<Utc>) {
        if let Some(registration) = self.registrations.get_mut(&user_id) {
            registration.status = status;
            registration.updated_at = now;
        }
        self.recompute_seats();
        self.updated_at = now;
    }
}
