//! Entry point for running an event's lottery
//!
//! One run at a time per event: the run lock is held from the first read of
//! the event until the winners are committed. The run timeout bounds that
//! section only; the executed flag and notices follow after release.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use crate::config::LotteryConfig;
use crate::lottery::engine::{DrawPlan, LotteryEngine};
use crate::lottery::lock::RunLock;
use crate::lottery::notify::{LotteryNotice, NoticeKind, NotificationDispatcher};
use crate::lottery::store::{transition_excluding_conflicts, EventStore, WaitingListStore};
use crate::models::{EntrantStatus, Event, StatusCounts};
use crate::utils::errors::{LotteryError, LotteryResult};
use crate::utils::logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Winners were drawn and committed
    Drawn,
    /// The target number of participants is already met
    NothingToDraw,
    /// The event's seat cap is exhausted
    CapacityReached,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Drawn => "drawn",
            RunOutcome::NothingToDraw => "nothing_to_draw",
            RunOutcome::CapacityReached => "capacity_reached",
        }
    }
}

/// Result of one committed lottery run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryRun {
    pub event_id: i64,
    pub outcome: RunOutcome,
    /// Entrants moved from WAITING to SELECTED by this run
    pub winners: Vec<i64>,
    /// Drawn entrants dropped because their status changed before commit
    pub excluded: Vec<i64>,
    pub pool_size: usize,
}

impl LotteryRun {
    fn no_op(event_id: i64, outcome: RunOutcome, pool_size: usize) -> Self {
        Self {
            event_id,
            outcome,
            winners: Vec::new(),
            excluded: Vec::new(),
            pool_size,
        }
    }
}

/// What a run would do right now, without locking or writing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawPreview {
    pub plan: DrawPlan,
    pub pool_size: usize,
    pub counts: StatusCounts,
}

#[derive(Clone)]
pub struct LotteryRunCoordinator {
    events: Arc<dyn EventStore>,
    entrants: Arc<dyn WaitingListStore>,
    lock: Arc<dyn RunLock>,
    notifier: Option<Arc<dyn NotificationDispatcher>>,
    engine: LotteryEngine,
    rng: Arc<Mutex<StdRng>>,
    run_timeout: Duration,
    notify_not_selected: bool,
}

impl LotteryRunCoordinator {
    pub fn new(
        events: Arc<dyn EventStore>,
        entrants: Arc<dyn WaitingListStore>,
        lock: Arc<dyn RunLock>,
    ) -> Self {
        Self {
            events,
            entrants,
            lock,
            notifier: None,
            engine: LotteryEngine::default(),
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
            run_timeout: Duration::from_secs(15),
            notify_not_selected: false,
        }
    }

    /// Build a coordinator with the policies from configuration
    pub fn from_config(
        config: &LotteryConfig,
        events: Arc<dyn EventStore>,
        entrants: Arc<dyn WaitingListStore>,
        lock: Arc<dyn RunLock>,
    ) -> Self {
        let mut coordinator = Self::new(events, entrants, lock)
            .with_engine(LotteryEngine::new(config.cancelled_invites))
            .with_run_timeout(config.run_timeout());
        coordinator.notify_not_selected = config.notify_not_selected;
        coordinator
    }

    pub fn with_engine(mut self, engine: LotteryEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_notify_not_selected(mut self, enabled: bool) -> Self {
        self.notify_not_selected = enabled;
        self
    }

    /// Make draws reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    pub fn with_run_timeout(mut self, run_timeout: Duration) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    /// Run the lottery for `event_id` on behalf of `caller_id`.
    ///
    /// Concurrent calls for the same event are serialized; the later call
    /// sees the state the earlier one committed.
    pub async fn run_lottery(&self, event_id: i64, caller_id: i64) -> LotteryResult<LotteryRun> {
        let lease = self.lock.acquire(event_id).await?;

        let result = match tokio::time::timeout(self.run_timeout, self.run_locked(event_id, caller_id)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(event_id = event_id, timeout_ms = self.run_timeout.as_millis() as u64, "Lottery run timed out");
                Err(LotteryError::TimedOut { event_id })
            }
        };

        if let Err(e) = self.lock.release(lease).await {
            warn!(event_id = event_id, error = %e, "Failed to release lottery run lock");
        }

        let (event, run) = result?;
        if !run.winners.is_empty() && !event.has_lottery_executed {
            self.flag_executed(event_id).await;
        }
        logging::log_lottery_run(event_id, caller_id, run.outcome.as_str(), run.winners.len(), run.excluded.len());

        if !run.winners.is_empty() {
            self.dispatch_notices(&event, &run).await;
        }

        Ok(run)
    }

    /// Draw size the next run would use; performs the same access checks
    pub async fn preview(&self, event_id: i64, caller_id: i64) -> LotteryResult<DrawPreview> {
        let event = self.fetch_event(event_id).await?;
        let target = self.engine.authorize(&event, caller_id, Utc::now())?;
        let snapshot = self.engine.snapshot(self.entrants.as_ref(), event_id).await?;

        Ok(DrawPreview {
            plan: self.engine.plan(&target, &snapshot),
            pool_size: snapshot.waiting.len(),
            counts: snapshot.counts,
        })
    }

    async fn fetch_event(&self, event_id: i64) -> LotteryResult<Event> {
        self.events
            .get_event(event_id)
            .await?
            .ok_or(LotteryError::EventNotFound { event_id })
    }

    async fn run_locked(&self, event_id: i64, caller_id: i64) -> LotteryResult<(Event, LotteryRun)> {
        let event = self.fetch_event(event_id).await?;
        let mut rng = self.run_rng();

        let draw = self
            .engine
            .draw(self.entrants.as_ref(), &event, caller_id, Utc::now(), &mut rng)
            .await?;

        let outcome = match draw.plan {
            DrawPlan::Draw(_) => RunOutcome::Drawn,
            DrawPlan::NothingToDraw => RunOutcome::NothingToDraw,
            DrawPlan::CapacityReached => RunOutcome::CapacityReached,
        };
        if outcome != RunOutcome::Drawn {
            debug!(event_id = event_id, outcome = outcome.as_str(), "Lottery run is a no-op");
            return Ok((event, LotteryRun::no_op(event_id, outcome, draw.pool_size)));
        }

        let committed = transition_excluding_conflicts(
            self.entrants.as_ref(),
            event_id,
            draw.winners,
            EntrantStatus::Waiting,
            EntrantStatus::Selected,
        )
        .await?;

        let run = LotteryRun {
            event_id,
            outcome,
            winners: committed.applied,
            excluded: committed.excluded,
            pool_size: draw.pool_size,
        };
        Ok((event, run))
    }

    /// Best effort, bounded by the run timeout; the winners stay committed either way
    async fn flag_executed(&self, event_id: i64) {
        match tokio::time::timeout(self.run_timeout, self.events.mark_lottery_executed(event_id)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(event_id = event_id, error = %e, "Failed to flag event as drawn"),
            Err(_) => warn!(event_id = event_id, "Timed out flagging event as drawn"),
        }
    }

    fn run_rng(&self) -> StdRng {
        let mut source = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        StdRng::seed_from_u64(source.gen())
    }

    async fn dispatch_notices(&self, event: &Event, run: &LotteryRun) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        let selected = LotteryNotice {
            event_id: event.id,
            event_title: event.title.clone(),
            kind: NoticeKind::Selected,
            recipients: run.winners.clone(),
        };

        match notifier.dispatch(&selected).await {
            Ok(report) => {
                info!(
                    event_id = event.id,
                    delivered = report.delivered.len(),
                    failed = report.failed.len(),
                    "Winner notices dispatched"
                );
                if !report.delivered.is_empty() {
                    if let Err(e) = self.entrants.mark_notified(event.id, &report.delivered).await {
                        warn!(event_id = event.id, error = %e, "Failed to flag winners as notified");
                    }
                }
            }
            Err(e) => warn!(event_id = event.id, error = %e, "Winner notices failed"),
        }

        if !self.notify_not_selected {
            return;
        }

        let waiting = match self.entrants.entrants_with_status(event.id, EntrantStatus::Waiting).await {
            Ok(waiting) => waiting,
            Err(e) => {
                warn!(event_id = event.id, error = %e, "Could not load waiting entrants for notices");
                return;
            }
        };
        if waiting.is_empty() {
            return;
        }

        let not_selected = LotteryNotice {
            event_id: event.id,
            event_title: event.title.clone(),
            kind: NoticeKind::NotSelected,
            recipients: waiting.iter().map(|e| e.entrant_id).collect(),
        };
        if let Err(e) = notifier.dispatch(&not_selected).await {
            warn!(event_id = event.id, error = %e, "Not-selected notices failed");
        }
    }
}
