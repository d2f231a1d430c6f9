use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use club_events_bot::database::memory::MemoryRepository;
use club_events_bot::domain::engine::EventEngine;
use club_events_bot::domain::error::{DomainError, StoreResult, ValidationError};
use club_events_bot::domain::event::{
    CreateEventInput, Event, EventId, EventType, RegistrationStatus, UpdateEventInput,
};
use club_events_bot::domain::location::{
    CreateLocationInput, LocationId, LocationPolicy, LocationRegistry,
};
use club_events_bot::domain::repository::EventRepository;
use club_events_bot::domain::user::TelegramId;
use tokio::sync::Notify;

struct Fixture {
    repo: Arc<MemoryRepository>,
    engine: EventEngine,
    location_id: LocationId,
}

async fn setup() -> Fixture {
    let repo = Arc::new(MemoryRepository::new());
    let registry = LocationRegistry::new(repo.clone(), LocationPolicy::default());
    let location = registry
        .create(CreateLocationInput {
            name: "Main Gym".to_string(),
            address: Some("1 Sport St".to_string()),
            map_url: None,
            description: None,
        })
        .await
        .unwrap();
    let engine = EventEngine::new(repo.clone(), repo.clone());

    Fixture {
        repo,
        engine,
        location_id: location.id,
    }
}

fn input(location_id: &LocationId, capacity: u32) -> CreateEventInput {
    CreateEventInput {
        name: "Evening Training".to_string(),
        event_type: EventType::Training,
        date: Utc::now() + Duration::days(2),
        max_players: capacity,
        location_id: location_id.clone(),
        trainer: Some("Coach".to_string()),
        description: None,
        payment_phone: None,
        price: None,
    }
}

async fn create(fx: &Fixture, capacity: u32) -> Event {
    fx.engine
        .create_event(input(&fx.location_id, capacity))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_event_starts_empty() {
    let fx = setup().await;
    let event = create(&fx, 10).await;

    assert_eq!(event.remaining, 10);
    assert!(event.players.is_empty());
    assert!(event.registrations.is_empty());

    let loaded = fx.engine.get_event(&event.id).await.unwrap();
    assert_eq!(loaded.name, "Evening Training");
    assert_eq!(loaded.trainer.as_deref(), Some("Coach"));
}

#[tokio::test]
async fn test_create_event_validation() {
    let fx = setup().await;

    let mut bad = input(&fx.location_id, 0);
    assert!(matches!(
        fx.engine.create_event(bad.clone()).await,
        Err(DomainError::Validation(ValidationError::CapacityInvalid))
    ));

    bad.max_players = 5;
    bad.date = Utc::now() - Duration::hours(1);
    assert!(matches!(
        fx.engine.create_event(bad.clone()).await,
        Err(DomainError::Validation(ValidationError::DateInPast))
    ));

    bad.date = Utc::now() + Duration::days(1);
    bad.name = "   ".to_string();
    assert!(matches!(
        fx.engine.create_event(bad).await,
        Err(DomainError::Validation(ValidationError::NameRequired))
    ));

    let unknown = input(&LocationId::from("no-such-location"), 5);
    assert!(matches!(
        fx.engine.create_event(unknown).await,
        Err(DomainError::LocationNotFound)
    ));

    assert!(fx.engine.list_events().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_request_does_not_take_a_seat() {
    let fx = setup().await;
    let event = create(&fx, 2).await;

    fx.engine.request_registration(&event.id, 1).await.unwrap();

    let event = fx.engine.get_event(&event.id).await.unwrap();
    assert_eq!(event.status_of(1), Some(RegistrationStatus::Pending));
    assert_eq!(event.remaining, 2);
    assert!(event.players.is_empty());
}

#[tokio::test]
async fn test_duplicate_request_refused() {
    let fx = setup().await;
    let event = create(&fx, 2).await;

    fx.engine.request_registration(&event.id, 1).await.unwrap();
    assert!(matches!(
        fx.engine.request_registration(&event.id, 1).await,
        Err(DomainError::AlreadyRegistered)
    ));

    fx.engine.approve_registration(&event.id, 1).await.unwrap();
    assert!(matches!(
        fx.engine.request_registration(&event.id, 1).await,
        Err(DomainError::AlreadyRegistered)
    ));
}

#[tokio::test]
async fn test_request_accepted_while_full() {
    let fx = setup().await;
    let event = create(&fx, 1).await;

    fx.engine.request_registration(&event.id, 1).await.unwrap();
    fx.engine.approve_registration(&event.id, 1).await.unwrap();

    fx.engine.request_registration(&event.id, 2).await.unwrap();
    let loaded = fx.engine.get_event(&event.id).await.unwrap();
    assert_eq!(loaded.status_of(2), Some(RegistrationStatus::Pending));
    assert_eq!(loaded.remaining, 0);

    assert!(matches!(
        fx.engine.approve_registration(&event.id, 2).await,
        Err(DomainError::EventFull)
    ));
    let loaded = fx.engine.get_event(&event.id).await.unwrap();
    assert_eq!(loaded.status_of(2), Some(RegistrationStatus::Pending));
}

#[tokio::test]
async fn test_approve_takes_seat_and_adds_player() {
    let fx = setup().await;
    let event = create(&fx, 3).await;

    for user in [1, 2] {
        fx.engine.request_registration(&event.id, user).await.unwrap();
    }
    fx.engine.approve_registration(&event.id, 2).await.unwrap();

    let event = fx.engine.get_event(&event.id).await.unwrap();
    assert_eq!(event.remaining, 2);
    assert_eq!(event.players, vec![2]);
    assert_eq!(event.status_of(1), Some(RegistrationStatus::Pending));

    assert!(matches!(
        fx.engine.approve_registration(&event.id, 2).await,
        Err(DomainError::AlreadyApproved)
    ));
    assert!(matches!(
        fx.engine.approve_registration(&event.id, 9).await,
        Err(DomainError::RegistrationNotFound)
    ));
}

#[tokio::test]
async fn test_reject_approved_frees_seat() {
    let fx = setup().await;
    let event = create(&fx, 1).await;

    fx.engine.request_registration(&event.id, 1).await.unwrap();
    fx.engine.approve_registration(&event.id, 1).await.unwrap();
    fx.engine.reject_registration(&event.id, 1).await.unwrap();

    let loaded = fx.engine.get_event(&event.id).await.unwrap();
    assert_eq!(loaded.status_of(1), Some(RegistrationStatus::Rejected));
    assert_eq!(loaded.remaining, 1);
    assert!(loaded.players.is_empty());

    assert!(matches!(
        fx.engine.reject_registration(&event.id, 1).await,
        Err(DomainError::AlreadyRejected)
    ));
    assert!(matches!(
        fx.engine.approve_registration(&event.id, 1).await,
        Err(DomainError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_rejected_member_can_apply_again() {
    let fx = setup().await;
    let event = create(&fx, 1).await;

    fx.engine.request_registration(&event.id, 1).await.unwrap();
    fx.engine.reject_registration(&event.id, 1).await.unwrap();
    let rejected = fx
        .engine
        .get_event(&event.id)
        .await
        .unwrap()
        .registration(1)
        .cloned()
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    fx.engine.request_registration(&event.id, 1).await.unwrap();

    let loaded = fx.engine.get_event(&event.id).await.unwrap();
    let fresh = loaded.registration(1).unwrap();
    assert_eq!(fresh.status, RegistrationStatus::Pending);
    assert!(fresh.created_at > rejected.created_at);
    assert!(fresh.updated_at > rejected.updated_at);
    assert_eq!(loaded.pending_registrations().len(), 1);
}

#[tokio::test]
async fn test_unregister_releases_seat() {
    let fx = setup().await;
    let event = create(&fx, 1).await;

    fx.engine.request_registration(&event.id, 1).await.unwrap();
    fx.engine.approve_registration(&event.id, 1).await.unwrap();
    fx.engine.unregister_user(&event.id, 1).await.unwrap();

    let loaded = fx.engine.get_event(&event.id).await.unwrap();
    assert_eq!(loaded.status_of(1), None);
    assert_eq!(loaded.remaining, 1);

    assert!(matches!(
        fx.engine.unregister_user(&event.id, 1).await,
        Err(DomainError::RegistrationNotFound)
    ));
}

#[tokio::test]
async fn test_unknown_event() {
    let fx = setup().await;
    let missing = EventId::from("missing");

    assert!(matches!(
        fx.engine.request_registration(&missing, 1).await,
        Err(DomainError::EventNotFound)
    ));
    assert!(matches!(
        fx.engine.delete_event(&missing).await,
        Err(DomainError::EventNotFound)
    ));
}

#[tokio::test]
async fn test_pending_list_is_oldest_first() {
    let fx = setup().await;
    let event = create(&fx, 5).await;

    for user in [30, 10, 20] {
        fx.engine.request_registration(&event.id, user).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    fx.engine.approve_registration(&event.id, 10).await.unwrap();

    let pending: Vec<i64> = fx
        .engine
        .list_pending_registrations(&event.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.user_id)
        .collect();
    assert_eq!(pending, vec![30, 20]);
}

#[tokio::test]
async fn test_failed_save_leaves_state_untouched() {
    let fx = setup().await;
    let event = create(&fx, 2).await;
    fx.engine.request_registration(&event.id, 1).await.unwrap();

    fx.repo.set_fail_writes(true);
    assert!(matches!(
        fx.engine.approve_registration(&event.id, 1).await,
        Err(DomainError::Storage(_))
    ));
    assert!(fx.engine.request_registration(&event.id, 2).await.is_err());
    fx.repo.set_fail_writes(false);

    let loaded = fx.engine.get_event(&event.id).await.unwrap();
    assert_eq!(loaded.status_of(1), Some(RegistrationStatus::Pending));
    assert_eq!(loaded.status_of(2), None);
    assert_eq!(loaded.remaining, 2);

    fx.engine.approve_registration(&event.id, 1).await.unwrap();
}

#[tokio::test]
async fn test_stale_remaining_is_recomputed() {
    let fx = setup().await;
    let event = create(&fx, 3).await;
    fx.engine.request_registration(&event.id, 1).await.unwrap();
    fx.engine.approve_registration(&event.id, 1).await.unwrap();

    let mut stored = fx.repo.get_event(&event.id).await.unwrap().unwrap();
    stored.remaining = 3;
    stored.players.clear();
    assert!(fx.repo.save_event(&stored).await.unwrap());

    let loaded = fx.engine.get_event(&event.id).await.unwrap();
    assert_eq!(loaded.remaining, 2);
    assert_eq!(loaded.players, vec![1]);
}

#[tokio::test]
async fn test_update_capacity() {
    let fx = setup().await;
    let event = create(&fx, 3).await;
    for user in [1, 2] {
        fx.engine.request_registration(&event.id, user).await.unwrap();
        fx.engine.approve_registration(&event.id, user).await.unwrap();
    }

    let shrunk = fx
        .engine
        .update_event(
            &event.id,
            UpdateEventInput {
                max_players: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(shrunk.remaining, 0);

    assert!(matches!(
        fx.engine
            .update_event(
                &event.id,
                UpdateEventInput {
                    max_players: Some(1),
                    ..Default::default()
                },
            )
            .await,
        Err(DomainError::Validation(ValidationError::CapacityBelowApproved { approved: 2 }))
    ));

    let renamed = fx
        .engine
        .update_event(
            &event.id,
            UpdateEventInput {
                name: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Renamed");
    assert_eq!(renamed.max_players, 2);
}

#[tokio::test]
async fn test_listings() {
    let fx = setup().await;
    let later = create(&fx, 2).await;

    let mut sooner_input = input(&fx.location_id, 2);
    sooner_input.date = Utc::now() + Duration::hours(3);
    sooner_input.event_type = EventType::Competition;
    let sooner = fx.engine.create_event(sooner_input).await.unwrap();

    let all: Vec<EventId> = fx
        .engine
        .list_events()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(all, vec![sooner.id.clone(), later.id.clone()]);

    let competitions = fx.engine.list_events_by_type(EventType::Competition).await.unwrap();
    assert_eq!(competitions.len(), 1);
    assert_eq!(competitions[0].id, sooner.id);

    fx.engine.request_registration(&later.id, 7).await.unwrap();
    fx.engine.request_registration(&sooner.id, 7).await.unwrap();
    fx.engine.reject_registration(&sooner.id, 7).await.unwrap();
    let mine = fx.engine.list_events_by_user(7).await.unwrap();
    assert_eq!(mine.len(), 2);

    let here = fx.engine.list_events_by_location(&fx.location_id).await.unwrap();
    assert_eq!(here.len(), 2);
    assert!(fx
        .engine
        .list_events_by_location(&LocationId::from("elsewhere"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_delete_event() {
    let fx = setup().await;
    let event = create(&fx, 2).await;
    fx.engine.request_registration(&event.id, 1).await.unwrap();
    fx.engine.approve_registration(&event.id, 1).await.unwrap();
    fx.engine.request_registration(&event.id, 2).await.unwrap();

    fx.engine.delete_event(&event.id).await.unwrap();
    assert!(matches!(
        fx.engine.get_event(&event.id).await,
        Err(DomainError::EventNotFound)
    ));
    assert!(matches!(
        fx.engine.list_pending_registrations(&event.id).await,
        Err(DomainError::EventNotFound)
    ));
    for user in [1, 2] {
        assert!(fx.engine.list_events_by_user(user).await.unwrap().is_empty());
    }
    assert!(fx.repo.get_event(&event.id).await.unwrap().is_none());
}

/// Event store whose loads pause until the test lets them continue.
struct PausedLoads {
    inner: Arc<MemoryRepository>,
    loaded: Notify,
    resume: Notify,
}

#[async_trait]
impl EventRepository for PausedLoads {
    async fn get_event(&self, id: &EventId) -> StoreResult<Option<Event>> {
        let event = self.inner.get_event(id).await?;
        self.loaded.notify_one();
        self.resume.notified().await;
        Ok(event)
    }

    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        self.inner.list_events().await
    }

    async fn list_events_by_location(&self, location_id: &LocationId) -> StoreResult<Vec<Event>> {
        self.inner.list_events_by_location(location_id).await
    }

    async fn list_events_by_user(&self, user_id: TelegramId) -> StoreResult<Vec<Event>> {
        self.inner.list_events_by_user(user_id).await
    }

    async fn insert_event(&self, event: &Event) -> StoreResult<()> {
        self.inner.insert_event(event).await
    }

    async fn save_event(&self, event: &Event) -> StoreResult<bool> {
        self.inner.save_event(event).await
    }

    async fn delete_event(&self, id: &EventId) -> StoreResult<bool> {
        self.inner.delete_event(id).await
    }
}

#[tokio::test]
async fn test_location_delete_during_request_does_not_revive_event() {
    let fx = setup().await;
    let store = Arc::new(PausedLoads {
        inner: fx.repo.clone(),
        loaded: Notify::new(),
        resume: Notify::new(),
    });
    let engine = EventEngine::new(store.clone(), fx.repo.clone());
    let event = engine
        .create_event(input(&fx.location_id, 2))
        .await
        .unwrap();

    let request = tokio::spawn({
        let engine = engine.clone();
        let id = event.id.clone();
        async move { engine.request_registration(&id, 7).await }
    });

    store.loaded.notified().await;
    let registry = LocationRegistry::new(fx.repo.clone(), LocationPolicy::default());
    registry.delete(&fx.location_id).await.unwrap();
    store.resume.notify_one();

    let result = request.await.unwrap();
    assert!(matches!(result, Err(DomainError::EventNotFound)));
    assert!(fx.repo.get_event(&event.id).await.unwrap().is_none());
    assert!(fx.repo.list_events_by_user(7).await.unwrap().is_empty());
}
