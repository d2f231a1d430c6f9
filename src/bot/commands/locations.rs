use chrono::Utc;

use crate::bot::callback_data::CallbackAction;
use crate::bot::commands::events::upcoming;
use crate::bot::presentation::{self, Screen};
use crate::bot::ClubServices;
use crate::domain::error::DomainResult;
use crate::domain::location::LocationId;

pub async fn locations_screen(services: &ClubServices) -> DomainResult<Screen> {
    let locations = services.locations.list().await?;
    Ok(presentation::locations(&locations))
}

pub async fn location_screen(services: &ClubServices, id: &LocationId) -> DomainResult<Screen> {
    let location = services.locations.get(id).await?;
    Ok(presentation::location(&location))
}

/// Upcoming events at one location.
pub async fn location_events_screen(
    services: &ClubServices,
    id: &LocationId,
) -> DomainResult<Screen> {
    let location = services.locations.get(id).await?;
    let events = services.engine.list_events_by_location(id).await?;
    let events = upcoming(events, Utc::now());

    Ok(presentation::events(
        &format!("📍 {}", location.name),
        &events,
        CallbackAction::Location(location.id.clone()),
        services.config.offset(),
    ))
}
