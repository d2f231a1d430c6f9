use chrono::{DateTime, Utc};

use crate::bot::callback_data::CallbackAction;
use crate::bot::presentation::{self, Screen};
use crate::bot::ClubServices;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::event::{Event, EventId};
use crate::domain::location::Location;
use crate::domain::user::TelegramId;

/// What happened when a member pressed Register.
#[derive(Debug)]
pub enum RegisterOutcome {
    /// No profile yet; the caller starts the profile wizard.
    NeedsProfile,
    Requested(Screen),
}

/// Events that have not started yet, keeping the engine's order.
pub fn upcoming(events: Vec<Event>, now: DateTime<Utc>) -> Vec<Event> {
    events.into_iter().filter(|e| e.date >= now).collect()
}

pub async fn events_screen(services: &ClubServices) -> DomainResult<Screen> {
    let events = upcoming(services.engine.list_events().await?, Utc::now());
    Ok(presentation::events(
        "📅 Upcoming events",
        &events,
        CallbackAction::Menu,
        services.config.offset(),
    ))
}

pub async fn my_events_screen(services: &ClubServices, user_id: TelegramId) -> DomainResult<Screen> {
    let events = services.engine.list_events_by_user(user_id).await?;
    Ok(presentation::my_events(&events, user_id, services.config.offset()))
}

pub async fn event_screen(
    services: &ClubServices,
    event_id: &EventId,
    user_id: TelegramId,
) -> DomainResult<Screen> {
    let event = services.engine.get_event(event_id).await?;
    let location = find_location(services, &event).await?;
    Ok(presentation::event_details(
        &event,
        location.as_ref(),
        user_id,
        services.config.offset(),
    ))
}

/// Files a pending request, or asks for a profile first.
pub async fn register(
    services: &ClubServices,
    event_id: &EventId,
    user_id: TelegramId,
) -> DomainResult<RegisterOutcome> {
    if !services.users.exists(user_id).await? {
        // Surface a missing event before the profile wizard starts.
        services.engine.get_event(event_id).await?;
        return Ok(RegisterOutcome::NeedsProfile);
    }

    services.engine.request_registration(event_id, user_id).await?;
    let mut screen = event_screen(services, event_id, user_id).await?;
    screen.text = format!("📨 Request sent! An admin will review it.\n\n{}", screen.text);
    Ok(RegisterOutcome::Requested(screen))
}

pub async fn unregister(
    services: &ClubServices,
    event_id: &EventId,
    user_id: TelegramId,
) -> DomainResult<Screen> {
    services.engine.unregister_user(event_id, user_id).await?;
    let mut screen = event_screen(services, event_id, user_id).await?;
    screen.text = format!("🚫 Registration cancelled.\n\n{}", screen.text);
    Ok(screen)
}

pub async fn participants_screen(services: &ClubServices, event_id: &EventId) -> DomainResult<Screen> {
    let event = services.engine.get_event(event_id).await?;
    let roster = services.moderation.event_roster(event_id).await?;
    Ok(presentation::participants(&event, &roster))
}

/// The event's location, `None` if it vanished in the meantime.
pub(crate) async fn find_location(
    services: &ClubServices,
    event: &Event,
) -> DomainResult<Option<Location>> {
    match services.locations.get(&event.location_id).await {
        Ok(location) => Ok(Some(location)),
        Err(DomainError::LocationNotFound) => Ok(None),
        Err(e) => Err(e),
    }
}
