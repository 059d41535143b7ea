//! In-process implementation of the lottery stores
//!
//! Used by tests and by callers embedding the lottery without a database.

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use crate::lottery::store::{EventStore, WaitingListStore};
use crate::models::{EntrantStatus, Event, StatusCounts, WaitingListEntrant};
use crate::utils::errors::{LotteryError, LotteryResult};

#[derive(Debug, Default)]
struct Inner {
    events: HashMap<i64, Event>,
    // Entrants kept in join order per event
    entrants: HashMap<i64, Vec<WaitingListEntrant>>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_event(&self, event: Event) {
        let mut inner = self.inner.write().await;
        inner.entrants.entry(event.id).or_default();
        inner.events.insert(event.id, event);
    }

    pub async fn insert_entrant(&self, entrant: WaitingListEntrant) {
        let mut inner = self.inner.write().await;
        let list = inner.entrants.entry(entrant.event_id).or_default();
        list.retain(|e| e.entrant_id != entrant.entrant_id);
        list.push(entrant);
    }

    /// Unconditional status overwrite, for seeding fixtures
    pub async fn force_status(&self, event_id: i64, entrant_id: i64, status: EntrantStatus) -> bool {
        let mut inner = self.inner.write().await;
        let Some(list) = inner.entrants.get_mut(&event_id) else {
            return false;
        };
        match list.iter_mut().find(|e| e.entrant_id == entrant_id) {
            Some(entrant) => {
                entrant.status = status;
                entrant.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub async fn entrants(&self, event_id: i64) -> Vec<WaitingListEntrant> {
        let inner = self.inner.read().await;
        inner.entrants.get(&event_id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn get_event(&self, event_id: i64) -> LotteryResult<Option<Event>> {
        Ok(self.inner.read().await.events.get(&event_id).cloned())
    }

    async fn mark_lottery_executed(&self, event_id: i64) -> LotteryResult<()> {
        let mut inner = self.inner.write().await;
        let event = inner
            .events
            .get_mut(&event_id)
            .ok_or(LotteryError::EventNotFound { event_id })?;
        event.has_lottery_executed = true;
        event.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl WaitingListStore for MemoryStore {
    async fn entrants_with_status(
        &self,
        event_id: i64,
        status: EntrantStatus,
    ) -> LotteryResult<Vec<WaitingListEntrant>> {
        let inner = self.inner.read().await;
        Ok(inner
            .entrants
            .get(&event_id)
            .map(|list| list.iter().filter(|e| e.status == status).cloned().collect())
            .unwrap_or_default())
    }

    async fn apply_status_transition(
        &self,
        event_id: i64,
        entrant_ids: &[i64],
        from: EntrantStatus,
        to: EntrantStatus,
    ) -> LotteryResult<()> {
        let mut inner = self.inner.write().await;
        let list = inner.entrants.entry(event_id).or_default();

        let conflicting: Vec<i64> = entrant_ids
            .iter()
            .copied()
            .filter(|id| !list.iter().any(|e| e.entrant_id == *id && e.status == from))
            .collect();
        if !conflicting.is_empty() {
            return Err(LotteryError::ConcurrentModification { event_id, entrant_ids: conflicting });
        }

        let now = Utc::now();
        for entrant in list.iter_mut().filter(|e| entrant_ids.contains(&e.entrant_id)) {
            entrant.status = to;
            entrant.updated_at = now;
        }
        Ok(())
    }

    async fn status_counts(&self, event_id: i64) -> LotteryResult<StatusCounts> {
        let inner = self.inner.read().await;
        Ok(inner
            .entrants
            .get(&event_id)
            .map(|list| StatusCounts::from_entrants(list))
            .unwrap_or_default())
    }

    async fn find_entrant(&self, event_id: i64, entrant_id: i64) -> LotteryResult<Option<WaitingListEntrant>> {
        let inner = self.inner.read().await;
        Ok(inner
            .entrants
            .get(&event_id)
            .and_then(|list| list.iter().find(|e| e.entrant_id == entrant_id).cloned()))
    }

    async fn add_entrant(&self, entrant: WaitingListEntrant) -> LotteryResult<bool> {
        let mut inner = self.inner.write().await;
        let list = inner.entrants.entry(entrant.event_id).or_default();
        if list.iter().any(|e| e.entrant_id == entrant.entrant_id) {
            return Ok(false);
        }
        list.push(entrant);
        Ok(true)
    }

    async fn mark_notified(&self, event_id: i64, entrant_ids: &[i64]) -> LotteryResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(list) = inner.entrants.get_mut(&event_id) {
            for entrant in list.iter_mut().filter(|e| entrant_ids.contains(&e.entrant_id)) {
                entrant.notified = true;
            }
        }
        Ok(())
    }
}
