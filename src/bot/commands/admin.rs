//! Admin panel: locations, events and the moderation queue.
//!
//! Callers check admin rights before reaching anything here.

use crate::bot::commands::events::find_location;
use crate::bot::presentation::{self, Screen};
use crate::bot::wizard::{EventDraft, WizardKey, WizardState};
use crate::bot::ClubServices;
use crate::domain::error::DomainResult;
use crate::domain::event::{CreateEventInput, EventId, EventType, RegistrationStatus};
use crate::domain::location::{CreateLocationInput, LocationId};
use crate::domain::user::TelegramId;

/// Result of an approve or reject press.
#[derive(Debug)]
pub struct Decision {
    /// Refreshed moderation list for the admin.
    pub screen: Screen,
    /// Member to notify and the text to send them.
    pub notice: (TelegramId, String),
}

pub async fn admin_locations_screen(services: &ClubServices) -> DomainResult<Screen> {
    let locations = services.locations.list().await?;
    Ok(presentation::admin_locations(&locations))
}

pub async fn delete_locations_screen(services: &ClubServices) -> DomainResult<Screen> {
    let locations = services.locations.list().await?;
    Ok(presentation::admin_delete_locations(&locations))
}

pub async fn create_location(
    services: &ClubServices,
    input: CreateLocationInput,
) -> DomainResult<Screen> {
    let location = services.locations.create(input).await?;
    Ok(presentation::location_created(&location))
}

/// Removes the location with its events and returns the refreshed list.
pub async fn delete_location(services: &ClubServices, id: &LocationId) -> DomainResult<Screen> {
    let name = services.locations.get(id).await?.name;
    services.locations.delete(id).await?;

    let mut screen = delete_locations_screen(services).await?;
    screen.text = format!("✅ Location {name} deleted.\n\n{}", screen.text);
    Ok(screen)
}

/// Events of one type, or all of them when `filter` is `None`.
pub async fn events_screen(
    services: &ClubServices,
    filter: Option<EventType>,
) -> DomainResult<Screen> {
    let (title, events) = match filter {
        Some(event_type) => (
            presentation::event_type_label(event_type).to_string(),
            services.engine.list_events_by_type(event_type).await?,
        ),
        None => (
            "📋 All events".to_string(),
            services.engine.list_events().await?,
        ),
    };
    Ok(presentation::admin_events(&title, &events, services.config.offset()))
}

pub async fn event_screen(services: &ClubServices, id: &EventId) -> DomainResult<Screen> {
    let event = services.engine.get_event(id).await?;
    let location = find_location(services, &event).await?;
    Ok(presentation::admin_event(
        &event,
        location.as_ref(),
        services.config.offset(),
    ))
}

pub async fn delete_event(services: &ClubServices, id: &EventId) -> DomainResult<Screen> {
    let name = services.engine.get_event(id).await?.name;
    services.engine.delete_event(id).await?;

    let mut screen = events_screen(services, None).await?;
    screen.text = format!("✅ Event {name} deleted.\n\n{}", screen.text);
    Ok(screen)
}

pub async fn moderation_screen(services: &ClubServices) -> DomainResult<Screen> {
    let queue = services.moderation.events_needing_moderation().await?;
    Ok(presentation::moderation_queue(&queue, services.config.offset()))
}

pub async fn event_moderation_screen(services: &ClubServices, id: &EventId) -> DomainResult<Screen> {
    let event = services.engine.get_event(id).await?;
    let pending = services.moderation.pending_with_users(id).await?;
    Ok(presentation::pending_registrations(&event, &pending))
}

pub async fn registration_screen(
    services: &ClubServices,
    event_id: &EventId,
    user_id: TelegramId,
) -> DomainResult<Screen> {
    let event = services.engine.get_event(event_id).await?;
    let entry = services
        .moderation
        .registration_detail(event_id, user_id)
        .await?;
    Ok(presentation::registration_detail(&event, &entry))
}

pub async fn decide(
    services: &ClubServices,
    event_id: &EventId,
    user_id: TelegramId,
    approve: bool,
) -> DomainResult<Decision> {
    let (profile, status) = if approve {
        (
            services.moderation.approve(event_id, user_id).await?,
            RegistrationStatus::Approved,
        )
    } else {
        (
            services.moderation.reject(event_id, user_id).await?,
            RegistrationStatus::Rejected,
        )
    };

    let who = profile.map_or_else(|| format!("User {user_id}"), |u| u.full_name());
    let event = services.engine.get_event(event_id).await?;
    let notice = presentation::decision_notice(&event, status, services.config.offset());

    let mut screen = event_moderation_screen(services, event_id).await?;
    let verb = if approve { "✅ Approved" } else { "❌ Rejected" };
    screen.text = format!("{verb}: {who}\n\n{}", screen.text);

    Ok(Decision {
        screen,
        notice: (user_id, notice),
    })
}

pub async fn new_event_locations_screen(services: &ClubServices) -> DomainResult<Screen> {
    let locations = services.locations.list().await?;
    Ok(presentation::new_event_locations(&locations))
}

pub async fn new_event_types_screen(
    services: &ClubServices,
    location_id: &LocationId,
) -> DomainResult<Screen> {
    let location = services.locations.get(location_id).await?;
    Ok(presentation::new_event_types(&location.id))
}

/// Checks the picked location and opens the text steps of the event wizard.
/// Returns the first prompt.
pub async fn start_event_wizard(
    services: &ClubServices,
    key: WizardKey,
    location_id: &LocationId,
    event_type: EventType,
) -> DomainResult<&'static str> {
    let location = services.locations.get(location_id).await?;
    let draft = EventDraft::new(location.id, event_type);
    let prompt = super::wizard_steps::prompt_for(draft.step);
    services
        .wizards
        .set(key, WizardState::CreatingEvent(draft))
        .await;
    Ok(prompt)
}

pub async fn create_event(services: &ClubServices, input: CreateEventInput) -> DomainResult<Screen> {
    let event = services.engine.create_event(input).await?;
    Ok(presentation::event_created(&event, services.config.offset()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::callback_data::CallbackAction;
    use crate::bot::commands::tests::services;
    use crate::domain::error::DomainError;
    use chrono::{Duration, Utc};

    async fn seed(services: &ClubServices, capacity: u32) -> (LocationId, EventId) {
        let location = services
            .locations
            .create(CreateLocationInput {
                name: "Arena".to_string(),
                address: None,
                map_url: None,
                description: None,
            })
            .await
            .unwrap();
        let event = services
            .engine
            .create_event(CreateEventInput {
                name: "League Match".to_string(),
                event_type: EventType::Competition,
                date: Utc::now() + Duration::days(1),
                max_players: capacity,
                location_id: location.id.clone(),
                trainer: None,
                description: None,
                payment_phone: None,
                price: Some(300),
            })
            .await
            .unwrap();
        (location.id, event.id)
    }

    #[tokio::test]
    async fn test_decide_approve_notifies_member() {
        let (services, _repo) = services();
        let (_, event_id) = seed(&services, 1).await;
        services.users.upsert(5, "Kim", "Lee").await.unwrap();
        services.engine.request_registration(&event_id, 5).await.unwrap();

        let queue = moderation_screen(&services).await.unwrap();
        assert!(queue
            .callback_payloads()
            .contains(&CallbackAction::AdminEventModeration(event_id.clone()).encode()));

        let decision = decide(&services, &event_id, 5, true).await.unwrap();
        assert!(decision.screen.text.starts_with("✅ Approved: Kim Lee"));
        assert_eq!(decision.notice.0, 5);
        assert!(decision.notice.1.contains("approved"));

        let event = services.engine.get_event(&event_id).await.unwrap();
        assert_eq!(event.remaining, 0);
        assert!(moderation_screen(&services).await.unwrap().text.contains("No pending"));
    }

    #[tokio::test]
    async fn test_decide_approve_when_full() {
        let (services, _repo) = services();
        let (_, event_id) = seed(&services, 1).await;
        for user in [1, 2] {
            services.engine.request_registration(&event_id, user).await.unwrap();
        }
        decide(&services, &event_id, 1, true).await.unwrap();

        let result = decide(&services, &event_id, 2, true).await;
        assert!(matches!(result, Err(DomainError::EventFull)));

        let decision = decide(&services, &event_id, 2, false).await.unwrap();
        assert!(decision.screen.text.starts_with("❌ Rejected: User 2"));
        assert!(decision.notice.1.contains("declined"));
    }

    #[tokio::test]
    async fn test_delete_location_cascades() {
        let (services, _repo) = services();
        let (location_id, event_id) = seed(&services, 3).await;

        let screen = delete_location(&services, &location_id).await.unwrap();
        assert!(screen.text.contains("Location Arena deleted"));
        assert!(matches!(
            services.engine.get_event(&event_id).await,
            Err(DomainError::EventNotFound)
        ));
    }

    #[tokio::test]
    async fn test_event_wizard_start_and_create() {
        let (services, _repo) = services();
        let (location_id, _) = seed(&services, 3).await;
        let key = WizardKey::new(10, 10);

        let prompt = start_event_wizard(&services, key, &location_id, EventType::Training)
            .await
            .unwrap();
        assert_eq!(prompt, presentation::PROMPT_MAX_PLAYERS);
        assert!(matches!(
            services.wizards.get(key).await,
            Some(WizardState::CreatingEvent(_))
        ));

        let missing = start_event_wizard(
            &services,
            WizardKey::new(11, 11),
            &LocationId::from("gone"),
            EventType::Training,
        )
        .await;
        assert!(matches!(missing, Err(DomainError::LocationNotFound)));

        let screen = create_event(
            &services,
            CreateEventInput {
                name: "Sprint".to_string(),
                event_type: EventType::Training,
                date: Utc::now() + Duration::days(2),
                max_players: 8,
                location_id,
                trainer: None,
                description: None,
                payment_phone: None,
                price: None,
            },
        )
        .await
        .unwrap();
        assert!(screen.text.contains("Event created"));

        let trainings = events_screen(&services, Some(EventType::Training)).await.unwrap();
        assert!(trainings.text.contains("Choose an event"));
        assert_eq!(trainings.callback_payloads().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_event() {
        let (services, _repo) = services();
        let (_, event_id) = seed(&services, 3).await;

        let screen = delete_event(&services, &event_id).await.unwrap();
        assert!(screen.text.contains("Event League Match deleted"));
        assert!(screen.text.contains("Nothing scheduled"));
        assert!(matches!(
            delete_event(&services, &event_id).await,
            Err(DomainError::EventNotFound)
        ));
    }
}
