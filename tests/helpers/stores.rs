//! Instrumented stores and notifiers

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use async_trait::async_trait;
use PickMe::lottery::{DeliveryReport, EventStore, LotteryNotice, MemoryStore, NotificationDispatcher, WaitingListStore};
use PickMe::models::{EntrantStatus, Event, WaitingListEntrant};
use PickMe::{LotteryError, LotteryResult};

/// Moves the chosen entrants to CANCELLED just before the first batch
/// transition reaches the inner store, as if they left mid-run.
pub struct LeavingDuringRunStore {
    pub inner: MemoryStore,
    pub leaving: Vec<i64>,
    fired: AtomicUsize,
}

impl LeavingDuringRunStore {
    pub fn new(inner: MemoryStore, leaving: Vec<i64>) -> Self {
        Self { inner, leaving, fired: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl WaitingListStore for LeavingDuringRunStore {
    async fn entrants_with_status(&self, event_id: i64, status: EntrantStatus) -> LotteryResult<Vec<WaitingListEntrant>> {
        self.inner.entrants_with_status(event_id, status).await
    }

    async fn apply_status_transition(
        &self,
        event_id: i64,
        entrant_ids: &[i64],
        from: EntrantStatus,
        to: EntrantStatus,
    ) -> LotteryResult<()> {
        if self.fired.fetch_add(1, Ordering::SeqCst) == 0 {
            for id in &self.leaving {
                self.inner.force_status(event_id, *id, EntrantStatus::Cancelled).await;
            }
        }
        self.inner.apply_status_transition(event_id, entrant_ids, from, to).await
    }

    async fn find_entrant(&self, event_id: i64, entrant_id: i64) -> LotteryResult<Option<WaitingListEntrant>> {
        self.inner.find_entrant(event_id, entrant_id).await
    }

    async fn add_entrant(&self, entrant: WaitingListEntrant) -> LotteryResult<bool> {
        self.inner.add_entrant(entrant).await
    }

    async fn mark_notified(&self, event_id: i64, entrant_ids: &[i64]) -> LotteryResult<()> {
        self.inner.mark_notified(event_id, entrant_ids).await
    }
}

/// Reads succeed, every write fails as if the database went away
pub struct UnavailableWritesStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl WaitingListStore for UnavailableWritesStore {
    async fn entrants_with_status(&self, event_id: i64, status: EntrantStatus) -> LotteryResult<Vec<WaitingListEntrant>> {
        self.inner.entrants_with_status(event_id, status).await
    }

    async fn apply_status_transition(&self, _: i64, _: &[i64], _: EntrantStatus, _: EntrantStatus) -> LotteryResult<()> {
        Err(LotteryError::StorageUnavailable("connection reset".to_string()))
    }

    async fn find_entrant(&self, event_id: i64, entrant_id: i64) -> LotteryResult<Option<WaitingListEntrant>> {
        self.inner.find_entrant(event_id, entrant_id).await
    }

    async fn add_entrant(&self, _: WaitingListEntrant) -> LotteryResult<bool> {
        Err(LotteryError::StorageUnavailable("connection reset".to_string()))
    }

    async fn mark_notified(&self, _: i64, _: &[i64]) -> LotteryResult<()> {
        Err(LotteryError::StorageUnavailable("connection reset".to_string()))
    }
}

/// Every read stalls for `delay` before answering
pub struct StallingStore {
    pub inner: MemoryStore,
    pub delay: Duration,
}

#[async_trait]
impl WaitingListStore for StallingStore {
    async fn entrants_with_status(&self, event_id: i64, status: EntrantStatus) -> LotteryResult<Vec<WaitingListEntrant>> {
        tokio::time::sleep(self.delay).await;
        self.inner.entrants_with_status(event_id, status).await
    }

    async fn apply_status_transition(
        &self,
        event_id: i64,
        entrant_ids: &[i64],
        from: EntrantStatus,
        to: EntrantStatus,
    ) -> LotteryResult<()> {
        self.inner.apply_status_transition(event_id, entrant_ids, from, to).await
    }

    async fn find_entrant(&self, event_id: i64, entrant_id: i64) -> LotteryResult<Option<WaitingListEntrant>> {
        self.inner.find_entrant(event_id, entrant_id).await
    }

    async fn add_entrant(&self, entrant: WaitingListEntrant) -> LotteryResult<bool> {
        self.inner.add_entrant(entrant).await
    }

    async fn mark_notified(&self, event_id: i64, entrant_ids: &[i64]) -> LotteryResult<()> {
        self.inner.mark_notified(event_id, entrant_ids).await
    }
}

/// Records every notice; entrants listed in `unreachable` fail delivery
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    pub notices: Arc<Mutex<Vec<LotteryNotice>>>,
    pub unreachable: Vec<i64>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<LotteryNotice> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn dispatch(&self, notice: &LotteryNotice) -> anyhow::Result<DeliveryReport> {
        self.notices.lock().unwrap().push(notice.clone());
        let (failed, delivered): (Vec<i64>, Vec<i64>) = notice
            .recipients
            .iter()
            .copied()
            .partition(|id| self.unreachable.contains(id));
        Ok(DeliveryReport { delivered, failed })
    }
}

/// Fails every dispatch
pub struct BrokenNotifier;

#[async_trait]
impl NotificationDispatcher for BrokenNotifier {
    async fn dispatch(&self, _: &LotteryNotice) -> anyhow::Result<DeliveryReport> {
        anyhow::bail!("telegram is down")
    }
}

/// Events whose executed flag takes `delay` to write
pub struct SlowFlagEventStore {
    pub inner: MemoryStore,
    pub delay: Duration,
}

#[async_trait]
impl EventStore for SlowFlagEventStore {
    async fn get_event(&self, event_id: i64) -> LotteryResult<Option<Event>> {
        self.inner.get_event(event_id).await
    }

    async fn mark_lottery_executed(&self, event_id: i64) -> LotteryResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.mark_lottery_executed(event_id).await
    }
}
