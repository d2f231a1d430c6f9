//! Event Registration Engine.
//!
//! Owns capacity accounting and the registration state machine. Every
//! mutation of an event runs under that event's async lock:
//! load, recompute seats, mutate, save. The loaded aggregate is a private
//! copy, so a failed save simply drops it and the stored state stays as it
//! was. Reads never lock; they recompute `remaining` and `players` from the
//! registration rows before returning.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::event::{
    CreateEventInput, Event, EventId, EventRegistration, EventType, RegistrationStatus,
    UpdateEventInput,
};
use crate::domain::location::LocationId;
use crate::domain::repository::{EventRepository, LocationRepository};
use crate::domain::user::TelegramId;
use crate::utils::logging::log_registration_transition;

type LockRegistry = HashMap<EventId, Arc<Mutex<()>>>;

#[derive(Clone)]
pub struct EventEngine {
    events: Arc<dyn EventRepository>,
    locations: Arc<dyn LocationRepository>,
    locks: Arc<StdMutex<LockRegistry>>,
}

impl EventEngine {
    /// Engine over the given event and location stores.
    pub fn new(events: Arc<dyn EventRepository>, locations: Arc<dyn LocationRepository>) -> Self {
        Self {
            events,
            locations,
            locks: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// Creates an event with every seat free. Fails with `Validation` or
    /// `LocationNotFound`.
    pub async fn create_event(&self, input: CreateEventInput) -> DomainResult<Event> {
        let now = Utc::now();
        input.validate(now)?;
        if self.locations.get_location(&input.location_id).await?.is_none() {
            return Err(DomainError::LocationNotFound);
        }

        let event = Event::new(input, now);
        self.events.insert_event(&event).await?;
        tracing::info!(
            "Created {} event {} ('{}') with {} seats",
            event.event_type,
            event.id,
            event.name,
            event.max_players
        );
        Ok(event)
    }

    /// The event with seats recomputed. Fails with `EventNotFound`.
    pub async fn get_event(&self, id: &EventId) -> DomainResult<Event> {
        let mut event = self
            .events
            .get_event(id)
            .await?
            .ok_or(DomainError::EventNotFound)?;
        event.recompute_seats();
        Ok(event)
    }

    /// Every live event, soonest first.
    pub async fn list_events(&self) -> DomainResult<Vec<Event>> {
        let events = self.events.list_events().await?;
        Ok(prepare(events))
    }

    /// Events held at one location, soonest first.
    pub async fn list_events_by_location(&self, location_id: &LocationId) -> DomainResult<Vec<Event>> {
        let events = self.events.list_events_by_location(location_id).await?;
        Ok(prepare(events))
    }

    /// Events the user has a registration on, whatever its status.
    pub async fn list_events_by_user(&self, user_id: TelegramId) -> DomainResult<Vec<Event>> {
        let events = self.events.list_events_by_user(user_id).await?;
        Ok(prepare(events))
    }

    /// Trainings or competitions only, soonest first.
    pub async fn list_events_by_type(&self, event_type: EventType) -> DomainResult<Vec<Event>> {
        let events = self
            .events
            .list_events()
            .await?
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect();
        Ok(prepare(events))
    }

    /// Partial update. Fails with `EventNotFound` or `Validation`, including
    /// a capacity below the approved count.
    pub async fn update_event(&self, id: &EventId, input: UpdateEventInput) -> DomainResult<Event> {
        let (_, event) = self
            .mutate(id, |event, now| {
                event.apply_update(input, now)?;
                Ok(())
            })
            .await?;
        tracing::info!(
            "Updated event {} (capacity {}, remaining {})",
            event.id,
            event.max_players,
            event.remaining
        );
        Ok(event)
    }

    /// Removes the event and its registrations. Fails with `EventNotFound`.
    pub async fn delete_event(&self, id: &EventId) -> DomainResult<()> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        if !self.events.delete_event(id).await? {
            return Err(DomainError::EventNotFound);
        }
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        tracing::info!("Deleted event {}", id);
        Ok(())
    }

    /// Files a pending request. Does not consume a seat. Fails with
    /// `EventNotFound` or `AlreadyRegistered`.
    pub async fn request_registration(&self, event_id: &EventId, user_id: TelegramId) -> DomainResult<()> {
        let (previous, _) = self
            .mutate(event_id, |event, now| {
                let previous = event.status_of(user_id);
                event.request(user_id, now)?;
                Ok(previous)
            })
            .await?;
        log_registration_transition(
            event_id.as_str(),
            user_id,
            previous.map_or("none", RegistrationStatus::as_str),
            RegistrationStatus::Pending.as_str(),
        );
        Ok(())
    }

    /// Drops the member's registration, releasing a seat if it was
    /// approved. Fails with `EventNotFound` or `RegistrationNotFound`.
    pub async fn unregister_user(&self, event_id: &EventId, user_id: TelegramId) -> DomainResult<()> {
        let (previous, _) = self
            .mutate(event_id, |event, now| event.unregister(user_id, now))
            .await?;
        log_registration_transition(event_id.as_str(), user_id, previous.as_str(), "none");
        Ok(())
    }

    /// The only operation that consumes a seat. Fails with `EventNotFound`,
    /// `RegistrationNotFound`, `AlreadyApproved`, `InvalidTransition` or
    /// `EventFull`.
    pub async fn approve_registration(&self, event_id: &EventId, user_id: TelegramId) -> DomainResult<()> {
        let (_, event) = self
            .mutate(event_id, |event, now| event.approve(user_id, now))
            .await?;
        log_registration_transition(
            event_id.as_str(),
            user_id,
            RegistrationStatus::Pending.as_str(),
            RegistrationStatus::Approved.as_str(),
        );
        tracing::debug!("Event {} has {} seats left", event.id, event.remaining);
        Ok(())
    }

    /// Rejects a request, releasing the seat of an approved member. Fails
    /// with `EventNotFound`, `RegistrationNotFound` or `AlreadyRejected`.
    pub async fn reject_registration(&self, event_id: &EventId, user_id: TelegramId) -> DomainResult<()> {
        let (previous, _) = self
            .mutate(event_id, |event, now| event.reject(user_id, now))
            .await?;
        log_registration_transition(
            event_id.as_str(),
            user_id,
            previous.as_str(),
            RegistrationStatus::Rejected.as_str(),
        );
        Ok(())
    }

    /// Pending registrations, oldest first. Fails with `EventNotFound`.
    pub async fn list_pending_registrations(&self, event_id: &EventId) -> DomainResult<Vec<EventRegistration>> {
        Ok(self.get_event(event_id).await?.pending_registrations())
    }

    /// Runs `apply` against a fresh copy of the event under its lock and
    /// persists the result. Nothing is saved when `apply` fails, and an
    /// event deleted since the load (directly or with its location) is
    /// reported as `EventNotFound`.
    async fn mutate<T, F>(&self, id: &EventId, apply: F) -> DomainResult<(T, Event)>
    where
        T: Send,
        F: FnOnce(&mut Event, DateTime<Utc>) -> DomainResult<T> + Send,
    {
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.lock().await;
            self.apply_and_save(id, apply).await
        };

        if matches!(result, Err(DomainError::EventNotFound)) {
            self.forget_lock(id, &lock);
        }
        result
    }

    async fn apply_and_save<T, F>(&self, id: &EventId, apply: F) -> DomainResult<(T, Event)>
    where
        T: Send,
        F: FnOnce(&mut Event, DateTime<Utc>) -> DomainResult<T> + Send,
    {
        let mut event = self.get_event(id).await?;
        let value = apply(&mut event, Utc::now())?;
        if !self.events.save_event(&event).await? {
            return Err(DomainError::EventNotFound);
        }
        Ok((value, event))
    }

    fn lock_for(&self, id: &EventId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(id.clone()).or_default().clone()
    }

    /// Drops the registry entry for an id that turned out not to exist,
    /// unless another caller is still holding or waiting on it.
    fn forget_lock(&self, id: &EventId, lock: &Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let unshared = locks
            .get(id)
            .is_some_and(|entry| Arc::ptr_eq(entry, lock) && Arc::strong_count(lock) == 2);
        if unshared {
            locks.remove(id);
        }
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

fn prepare(mut events: Vec<Event>) -> Vec<Event> {
    for event in &mut events {
        event.recompute_seats();
    }
    events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.created_at.cmp(&b.created_at)));
    events
}
