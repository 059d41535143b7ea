//! Test data helpers for building events, entrants and coordinators

use std::sync::Arc;
use std::time::Duration;
use chrono::{Duration as ChronoDuration, Utc};
use PickMe::lottery::{LocalRunLock, LotteryRunCoordinator, MemoryStore};
use PickMe::models::{EntrantStatus, Event, WaitingListEntrant};

pub const ORGANIZER_ID: i64 = 1_000;
pub const EVENT_ID: i64 = 42;

/// Upcoming event owned by `ORGANIZER_ID`
pub fn create_test_event(id: i64, max_winners: i32, max_entrants: Option<i32>) -> Event {
    let now = Utc::now();
    Event {
        id,
        title: format!("Test event {}", id),
        description: Some("Lottery test event".to_string()),
        organizer_id: ORGANIZER_ID,
        event_date: now + ChronoDuration::days(14),
        location: Some("Community hall".to_string()),
        max_entrants,
        max_winners,
        geolocation_required: false,
        has_lottery_executed: false,
        created_at: now,
        updated_at: now,
    }
}

pub fn create_past_event(id: i64) -> Event {
    let mut event = create_test_event(id, 5, None);
    event.event_date = Utc::now() - ChronoDuration::hours(1);
    event
}

/// Seed `count` entrants in `status` with ids starting at `first_id`
pub async fn seed_entrants(store: &MemoryStore, event_id: i64, first_id: i64, count: usize, status: EntrantStatus) -> Vec<i64> {
    let mut ids = Vec::with_capacity(count);
    for offset in 0..count as i64 {
        let mut entrant = WaitingListEntrant::new(event_id, first_id + offset, None);
        entrant.status = status;
        store.insert_entrant(entrant).await;
        ids.push(first_id + offset);
    }
    ids
}

/// Store holding one event with the given accepted and waiting entrants
pub async fn seeded_store(max_winners: i32, accepted: usize, waiting: usize) -> MemoryStore {
    let store = MemoryStore::new();
    store.insert_event(create_test_event(EVENT_ID, max_winners, None)).await;
    seed_entrants(&store, EVENT_ID, 1, accepted, EntrantStatus::Accepted).await;
    seed_entrants(&store, EVENT_ID, 10_000, waiting, EntrantStatus::Waiting).await;
    store
}

pub fn coordinator_for(store: &MemoryStore) -> LotteryRunCoordinator {
    LotteryRunCoordinator::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(LocalRunLock::new(Duration::from_secs(5))),
    )
    .with_seed(7)
}

pub async fn ids_with_status(store: &MemoryStore, event_id: i64, status: EntrantStatus) -> Vec<i64> {
    let mut ids: Vec<i64> = store
        .entrants(event_id)
        .await
        .into_iter()
        .filter(|e| e.status == status)
        .map(|e| e.entrant_id)
        .collect();
    ids.sort_unstable();
    ids
}
