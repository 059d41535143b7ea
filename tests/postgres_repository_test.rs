//! Postgres repository tests
//!
//! Need Docker (or `TEST_DATABASE_URL`); run with `cargo test -- --ignored`.

mod helpers;

use std::sync::Arc;
use std::time::Duration;
use assert_matches::assert_matches;
use chrono::{Duration as ChronoDuration, Utc};
use helpers::*;
use serial_test::serial;
use PickMe::database::{CreateEventRequest, DatabaseService};
use PickMe::lottery::{EventStore, LocalRunLock, LotteryRunCoordinator, WaitingListStore};
use PickMe::models::{EntrantStatus, Event, WaitingListEntrant};
use PickMe::LotteryError;

async fn create_event(db: &DatabaseService, max_winners: i32) -> Event {
    db.events
        .create(CreateEventRequest {
            title: "Repository test".to_string(),
            description: None,
            organizer_id: ORGANIZER_ID,
            event_date: Utc::now() + ChronoDuration::days(3),
            location: None,
            max_entrants: None,
            max_winners,
            geolocation_required: false,
        })
        .await
        .unwrap()
}

async fn add_waiting(db: &DatabaseService, event_id: i64, ids: std::ops::Range<i64>) {
    for id in ids {
        assert!(db.waiting_list.add_entrant(WaitingListEntrant::new(event_id, id, None)).await.unwrap());
    }
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_duplicate_join_is_reported() {
    let test_db = TestDatabase::new().await.unwrap();
    test_db.cleanup().await.unwrap();
    let db = DatabaseService::new(test_db.pool.clone());
    let event = create_event(&db, 2).await;

    add_waiting(&db, event.id, 1..2).await;
    assert!(!db.waiting_list.add_entrant(WaitingListEntrant::new(event.id, 1, None)).await.unwrap());
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_transition_with_repeated_ids() {
    let test_db = TestDatabase::new().await.unwrap();
    test_db.cleanup().await.unwrap();
    let db = DatabaseService::new(test_db.pool.clone());
    let event = create_event(&db, 2).await;
    add_waiting(&db, event.id, 1..3).await;

    db.waiting_list
        .apply_status_transition(event.id, &[1, 2, 1], EntrantStatus::Waiting, EntrantStatus::Selected)
        .await
        .unwrap();

    let counts = db.waiting_list.status_counts(event.id).await.unwrap();
    assert_eq!(counts.selected, 2);
    assert_eq!(counts.waiting, 0);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_transition_rolls_back_on_conflict() {
    let test_db = TestDatabase::new().await.unwrap();
    test_db.cleanup().await.unwrap();
    let db = DatabaseService::new(test_db.pool.clone());
    let event = create_event(&db, 2).await;
    add_waiting(&db, event.id, 1..4).await;

    db.waiting_list
        .apply_status_transition(event.id, &[2], EntrantStatus::Waiting, EntrantStatus::Cancelled)
        .await
        .unwrap();

    let err = db
        .waiting_list
        .apply_status_transition(event.id, &[1, 2, 3], EntrantStatus::Waiting, EntrantStatus::Selected)
        .await
        .unwrap_err();
    assert_matches!(err, LotteryError::ConcurrentModification { ref entrant_ids, .. } if entrant_ids == &vec![2]);

    let counts = db.waiting_list.status_counts(event.id).await.unwrap();
    assert_eq!(counts.waiting, 2);
    assert_eq!(counts.selected, 0);
    assert_eq!(counts.cancelled, 1);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_lottery_run_against_postgres() {
    let test_db = TestDatabase::new().await.unwrap();
    test_db.cleanup().await.unwrap();
    let db = DatabaseService::new(test_db.pool.clone());
    let event = create_event(&db, 3).await;
    add_waiting(&db, event.id, 1..11).await;

    let coordinator = LotteryRunCoordinator::new(
        db.event_store(),
        db.waiting_list_store(),
        Arc::new(LocalRunLock::new(Duration::from_secs(5))),
    );
    let run = coordinator.run_lottery(event.id, ORGANIZER_ID).await.unwrap();
    assert_eq!(run.winners.len(), 3);

    let selected = db.waiting_list.entrants_with_status(event.id, EntrantStatus::Selected).await.unwrap();
    assert_eq!(selected.len(), 3);

    let stored = db.events.get_event(event.id).await.unwrap().unwrap();
    assert!(stored.has_lottery_executed);

    let organizer_events = db.events.get_organizer_events(ORGANIZER_ID).await.unwrap();
    assert_eq!(organizer_events.len(), 1);
}
