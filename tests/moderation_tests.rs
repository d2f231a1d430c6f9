use std::sync::Arc;

use chrono::{Duration, Utc};
use club_events_bot::database::memory::MemoryRepository;
use club_events_bot::domain::engine::EventEngine;
use club_events_bot::domain::error::DomainError;
use club_events_bot::domain::event::{CreateEventInput, EventId, EventType, RegistrationStatus};
use club_events_bot::domain::location::{CreateLocationInput, LocationPolicy, LocationRegistry};
use club_events_bot::domain::moderation::ModerationWorkflow;
use club_events_bot::domain::user::UserDirectory;

struct Fixture {
    repo: Arc<MemoryRepository>,
    engine: EventEngine,
    users: UserDirectory,
    moderation: ModerationWorkflow,
}

async fn setup() -> (Fixture, EventId, EventId) {
    let repo = Arc::new(MemoryRepository::new());
    let location = LocationRegistry::new(repo.clone(), LocationPolicy::default())
        .create(CreateLocationInput {
            name: "Pool".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let engine = EventEngine::new(repo.clone(), repo.clone());
    let users = UserDirectory::new(repo.clone());
    let moderation = ModerationWorkflow::new(engine.clone(), users.clone());

    let mut ids = Vec::new();
    for (name, days) in [("Swim Sprint", 2), ("Water Polo", 1)] {
        let event = engine
            .create_event(CreateEventInput {
                name: name.to_string(),
                event_type: EventType::Training,
                date: Utc::now() + Duration::days(days),
                max_players: 1,
                location_id: location.id.clone(),
                trainer: None,
                description: None,
                payment_phone: None,
                price: None,
            })
            .await
            .unwrap();
        ids.push(event.id);
    }
    let polo = ids.pop().unwrap();
    let sprint = ids.pop().unwrap();

    (
        Fixture {
            repo,
            engine,
            users,
            moderation,
        },
        sprint,
        polo,
    )
}

#[tokio::test]
async fn test_queue_lists_events_with_pending_only() {
    let (fx, sprint, polo) = setup().await;
    assert!(fx.moderation.events_needing_moderation().await.unwrap().is_empty());

    fx.engine.request_registration(&sprint, 1).await.unwrap();
    fx.engine.request_registration(&sprint, 2).await.unwrap();
    fx.engine.request_registration(&polo, 3).await.unwrap();
    fx.engine.approve_registration(&polo, 3).await.unwrap();

    let queue = fx.moderation.events_needing_moderation().await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].0.id, sprint);
    assert_eq!(queue[0].1, 2);
}

#[tokio::test]
async fn test_pending_joined_with_profiles() {
    let (fx, sprint, _) = setup().await;
    fx.users.upsert(1, "Dina", "Ross").await.unwrap();
    fx.engine.request_registration(&sprint, 1).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    fx.engine.request_registration(&sprint, 2).await.unwrap();

    let pending = fx.moderation.pending_with_users(&sprint).await.unwrap();
    let names: Vec<String> = pending.iter().map(|p| p.display_name()).collect();
    assert_eq!(names, vec!["Dina Ross".to_string(), "User 2".to_string()]);
}

#[tokio::test]
async fn test_registration_detail() {
    let (fx, sprint, _) = setup().await;
    fx.engine.request_registration(&sprint, 1).await.unwrap();

    let detail = fx.moderation.registration_detail(&sprint, 1).await.unwrap();
    assert_eq!(detail.registration.status, RegistrationStatus::Pending);
    assert!(detail.user.is_none());

    assert!(matches!(
        fx.moderation.registration_detail(&sprint, 2).await,
        Err(DomainError::RegistrationNotFound)
    ));
}

#[tokio::test]
async fn test_approve_and_reject_return_profile() {
    let (fx, sprint, polo) = setup().await;
    fx.users.upsert(1, "Dina", "Ross").await.unwrap();
    fx.engine.request_registration(&sprint, 1).await.unwrap();
    fx.engine.request_registration(&polo, 1).await.unwrap();

    let approved = fx.moderation.approve(&sprint, 1).await.unwrap();
    assert_eq!(approved.map(|u| u.name), Some("Dina".to_string()));

    let rejected = fx.moderation.reject(&polo, 1).await.unwrap();
    assert!(rejected.is_some());

    let roster = fx.moderation.event_roster(&sprint).await.unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].registration.status, RegistrationStatus::Approved);
}

#[tokio::test]
async fn test_approve_full_event_keeps_pending() {
    let (fx, sprint, _) = setup().await;
    fx.engine.request_registration(&sprint, 1).await.unwrap();
    fx.engine.request_registration(&sprint, 2).await.unwrap();
    fx.moderation.approve(&sprint, 1).await.unwrap();

    assert!(matches!(
        fx.moderation.approve(&sprint, 2).await,
        Err(DomainError::EventFull)
    ));
    let pending = fx.moderation.pending_with_users(&sprint).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].registration.user_id, 2);
}

#[tokio::test]
async fn test_storage_failure_during_decision() {
    let (fx, sprint, _) = setup().await;
    fx.engine.request_registration(&sprint, 1).await.unwrap();

    fx.repo.set_fail_writes(true);
    assert!(matches!(
        fx.moderation.approve(&sprint, 1).await,
        Err(DomainError::Storage(_))
    ));
    fx.repo.set_fail_writes(false);

    let detail = fx.moderation.registration_detail(&sprint, 1).await.unwrap();
    assert_eq!(detail.registration.status, RegistrationStatus::Pending);
}
