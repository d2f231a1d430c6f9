use std::sync::Arc;

use chrono::{Duration, Utc};
use club_events_bot::database::memory::MemoryRepository;
use club_events_bot::domain::engine::EventEngine;
use club_events_bot::domain::error::DomainError;
use club_events_bot::domain::event::{CreateEventInput, Event, EventType, RegistrationStatus};
use club_events_bot::domain::location::{CreateLocationInput, LocationPolicy, LocationRegistry};

async fn event_with_capacity(capacity: u32) -> (EventEngine, Event) {
    let repo = Arc::new(MemoryRepository::new());
    let location = LocationRegistry::new(repo.clone(), LocationPolicy::default())
        .create(CreateLocationInput {
            name: "Stadium".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let engine = EventEngine::new(repo.clone(), repo);
    let event = engine
        .create_event(CreateEventInput {
            name: "Cup".to_string(),
            event_type: EventType::Competition,
            date: Utc::now() + Duration::days(1),
            max_players: capacity,
            location_id: location.id,
            trainer: None,
            description: None,
            payment_phone: None,
            price: None,
        })
        .await
        .unwrap();
    (engine, event)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_approvals_never_overbook() {
    let (engine, event) = event_with_capacity(3).await;
    let users: Vec<i64> = (1..=20).collect();
    for user in &users {
        engine.request_registration(&event.id, *user).await.unwrap();
    }

    let handles: Vec<_> = users
        .iter()
        .map(|user| {
            let engine = engine.clone();
            let id = event.id.clone();
            let user = *user;
            tokio::spawn(async move { engine.approve_registration(&id, user).await })
        })
        .collect();

    let mut approved = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => approved += 1,
            Err(DomainError::EventFull) => full += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(approved, 3);
    assert_eq!(full, 17);

    let event = engine.get_event(&event.id).await.unwrap();
    assert_eq!(event.remaining, 0);
    assert_eq!(event.players.len(), 3);
    assert_eq!(
        event
            .registrations
            .values()
            .filter(|r| r.status == RegistrationStatus::Pending)
            .count(),
        17
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_all_recorded() {
    let (engine, event) = event_with_capacity(2).await;

    let handles: Vec<_> = (1..=50)
        .map(|user| {
            let engine = engine.clone();
            let id = event.id.clone();
            tokio::spawn(async move { engine.request_registration(&id, user).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let event = engine.get_event(&event.id).await.unwrap();
    assert_eq!(event.registrations.len(), 50);
    assert_eq!(event.remaining, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_duplicate_concurrent_requests_file_once() {
    let (engine, event) = event_with_capacity(2).await;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let engine = engine.clone();
            let id = event.id.clone();
            tokio::spawn(async move { engine.request_registration(&id, 42).await })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => accepted += 1,
            Err(DomainError::AlreadyRegistered) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(accepted, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_seat_with_release() {
    let (engine, event) = event_with_capacity(1).await;
    for user in [1, 2] {
        engine.request_registration(&event.id, user).await.unwrap();
    }
    engine.approve_registration(&event.id, 1).await.unwrap();

    let release = {
        let engine = engine.clone();
        let id = event.id.clone();
        tokio::spawn(async move { engine.unregister_user(&id, 1).await })
    };
    let approve = {
        let engine = engine.clone();
        let id = event.id.clone();
        tokio::spawn(async move { engine.approve_registration(&id, 2).await })
    };

    release.await.unwrap().unwrap();
    let approved_second = approve.await.unwrap();

    let event = engine.get_event(&event.id).await.unwrap();
    match approved_second {
        Ok(()) => {
            assert_eq!(event.players, vec![2]);
            assert_eq!(event.remaining, 0);
        }
        Err(DomainError::EventFull) => {
            assert!(event.players.is_empty());
            assert_eq!(event.remaining, 1);
        }
        Err(e) => panic!("unexpected error: {e}"),
    }
}
