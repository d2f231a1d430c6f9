use crate::domain::engine::EventEngine;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::event::{Event, EventId, EventRegistration};
use crate::domain::user::{TelegramId, User, UserDirectory};

/// A registration joined with the member's profile, if one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationWithUser {
    pub registration: EventRegistration,
    pub user: Option<User>,
}

impl RegistrationWithUser {
    pub fn display_name(&self) -> String {
        match &self.user {
            Some(user) => user.full_name(),
            None => format!("User {}", self.registration.user_id),
        }
    }
}

/// Admin views over the engine's pending queues.
#[derive(Clone)]
pub struct ModerationWorkflow {
    engine: EventEngine,
    users: UserDirectory,
}

impl ModerationWorkflow {
    pub fn new(engine: EventEngine, users: UserDirectory) -> Self {
        Self { engine, users }
    }

    /// Events with at least one pending registration, with the pending count.
    pub async fn events_needing_moderation(&self) -> DomainResult<Vec<(Event, usize)>> {
        let events = self.engine.list_events().await?;
        Ok(events
            .into_iter()
            .filter_map(|event| {
                let pending = event.pending_registrations().len();
                (pending > 0).then_some((event, pending))
            })
            .collect())
    }

    pub async fn pending_with_users(&self, event_id: &EventId) -> DomainResult<Vec<RegistrationWithUser>> {
        let pending = self.engine.list_pending_registrations(event_id).await?;
        self.join_users(pending).await
    }

    /// Every registration of the event regardless of status, oldest first.
    pub async fn event_roster(&self, event_id: &EventId) -> DomainResult<Vec<RegistrationWithUser>> {
        let event = self.engine.get_event(event_id).await?;
        let mut registrations: Vec<EventRegistration> = event.registrations.into_values().collect();
        registrations.sort_by_key(|r| (r.created_at, r.user_id));
        self.join_users(registrations).await
    }

    pub async fn registration_detail(
        &self,
        event_id: &EventId,
        user_id: TelegramId,
    ) -> DomainResult<RegistrationWithUser> {
        let event = self.engine.get_event(event_id).await?;
        let registration = event
            .registration(user_id)
            .cloned()
            .ok_or(DomainError::RegistrationNotFound)?;
        let user = self.find_user(user_id).await?;
        Ok(RegistrationWithUser { registration, user })
    }

    /// Approves and returns the member's profile for the confirmation text.
    pub async fn approve(&self, event_id: &EventId, user_id: TelegramId) -> DomainResult<Option<User>> {
        self.engine.approve_registration(event_id, user_id).await?;
        Ok(self.profile_after_decision(user_id).await)
    }

    pub async fn reject(&self, event_id: &EventId, user_id: TelegramId) -> DomainResult<Option<User>> {
        self.engine.reject_registration(event_id, user_id).await?;
        Ok(self.profile_after_decision(user_id).await)
    }

    async fn join_users(&self, registrations: Vec<EventRegistration>) -> DomainResult<Vec<RegistrationWithUser>> {
        let mut joined = Vec::with_capacity(registrations.len());
        for registration in registrations {
            let user = self.find_user(registration.user_id).await?;
            joined.push(RegistrationWithUser { registration, user });
        }
        Ok(joined)
    }

    async fn find_user(&self, user_id: TelegramId) -> DomainResult<Option<User>> {
        match self.users.get_by_telegram_id(user_id).await {
            Ok(user) => Ok(Some(user)),
            Err(DomainError::UserNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // The decision is already committed here; a failed profile lookup only
    // degrades the confirmation text.
    async fn profile_after_decision(&self, user_id: TelegramId) -> Option<User> {
        match self.find_user(user_id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Profile lookup for {} failed after moderation: {}", user_id, e);
                None
            }
        }
    }
}
