//! Single lottery draw
//!
//! The engine validates preconditions, sizes the draw and picks winners. It
//! only reads from the store; persisting the result is the coordinator's job.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::config::CancelledInvitePolicy;
use crate::lottery::capacity::{self, DrawTarget};
use crate::lottery::store::WaitingListStore;
use crate::models::{EntrantStatus, Event, StatusCounts, WaitingListEntrant};
use crate::utils::errors::{LotteryError, LotteryResult};

/// Immutable view of an event's list taken at the start of a draw
#[derive(Debug, Clone)]
pub struct PoolSnapshot {
    pub counts: StatusCounts,
    pub waiting: Vec<WaitingListEntrant>,
}

/// How many entrants a run should draw, or why it draws none
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawPlan {
    Draw(u32),
    /// The accepted/selected target is already met
    NothingToDraw,
    /// The event's hard seat cap is exhausted
    CapacityReached,
}

impl DrawPlan {
    pub fn count(&self) -> u32 {
        match self {
            DrawPlan::Draw(n) => *n,
            DrawPlan::NothingToDraw | DrawPlan::CapacityReached => 0,
        }
    }
}

/// Result of one draw before persistence
#[derive(Debug, Clone)]
pub struct Draw {
    pub plan: DrawPlan,
    pub pool_size: usize,
    pub winners: Vec<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct LotteryEngine {
    cancelled_invites: CancelledInvitePolicy,
}

impl Default for LotteryEngine {
    fn default() -> Self {
        Self::new(CancelledInvitePolicy::ReleaseSeat)
    }
}

impl LotteryEngine {
    pub fn new(cancelled_invites: CancelledInvitePolicy) -> Self {
        Self { cancelled_invites }
    }

    /// Organizer check, then timing check, then configuration check
    pub fn authorize(&self, event: &Event, caller_id: i64, now: DateTime<Utc>) -> LotteryResult<DrawTarget> {
        if !event.is_organized_by(caller_id) {
            return Err(LotteryError::NotAuthorized { event_id: event.id, caller_id });
        }

        if event.has_passed(now) {
            return Err(LotteryError::EventAlreadyOccurred {
                event_id: event.id,
                event_date: event.event_date,
            });
        }

        DrawTarget::from_event(event)
    }

    /// Fetch the counts and the waiting pool, both settled before returning
    pub async fn snapshot<S>(&self, store: &S, event_id: i64) -> LotteryResult<PoolSnapshot>
    where
        S: WaitingListStore + ?Sized,
    {
        let (counts, waiting) = futures::try_join!(
            store.status_counts(event_id),
            store.entrants_with_status(event_id, EntrantStatus::Waiting),
        )?;

        Ok(PoolSnapshot { counts, waiting })
    }

    pub fn plan(&self, target: &DrawTarget, snapshot: &PoolSnapshot) -> DrawPlan {
        let committed = capacity::committed_seats(&snapshot.counts, self.cancelled_invites);

        if capacity::capacity_reached(committed, target.max_entrants) {
            return DrawPlan::CapacityReached;
        }

        let pool = snapshot.waiting.len() as u32;
        let wanted = capacity::num_to_draw(committed, pool, target.num_winners);
        let allowed = capacity::clamp_to_cap(wanted, committed, target.max_entrants);

        if allowed == 0 {
            DrawPlan::NothingToDraw
        } else {
            DrawPlan::Draw(allowed)
        }
    }

    /// Uniformly pick `count` distinct entrants from the pool
    pub fn select<R>(&self, pool: &[WaitingListEntrant], count: u32, rng: &mut R) -> Vec<i64>
    where
        R: Rng + ?Sized,
    {
        if count == 0 || pool.is_empty() {
            return Vec::new();
        }

        let mut ids: Vec<i64> = pool.iter().map(|e| e.entrant_id).collect();
        ids.shuffle(rng);
        ids.truncate((count as usize).min(pool.len()));
        ids
    }

    /// Full draw: preconditions, snapshot, plan and selection
    pub async fn draw<S, R>(
        &self,
        store: &S,
        event: &Event,
        caller_id: i64,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> LotteryResult<Draw>
    where
        S: WaitingListStore + ?Sized,
        R: Rng + Send + ?Sized,
    {
        let target = self.authorize(event, caller_id, now)?;
        let snapshot = self.snapshot(store, event.id).await?;
        let plan = self.plan(&target, &snapshot);

        debug!(
            event_id = event.id,
            plan = ?plan,
            pool = snapshot.waiting.len(),
            accepted = snapshot.counts.accepted,
            selected = snapshot.counts.selected,
            "Lottery draw planned"
        );

        let winners = self.select(&snapshot.waiting, plan.count(), rng);

        Ok(Draw {
            plan,
            pool_size: snapshot.waiting.len(),
            winners,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn event(max_winners: i32, max_entrants: Option<i32>) -> Event {
        Event {
            id: 1,
            title: "Open mic night".to_string(),
            description: None,
            organizer_id: 100,
            event_date: Utc::now() + Duration::days(3),
            location: None,
            max_entrants,
            max_winners,
            geolocation_required: false,
            has_lottery_executed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn snapshot(waiting: u32, selected: u32, accepted: u32, cancelled: u32) -> PoolSnapshot {
        let pool = (0..waiting as i64).map(|id| WaitingListEntrant::new(1, id, None)).collect();
        PoolSnapshot {
            counts: StatusCounts { waiting, selected, accepted, rejected: 0, cancelled },
            waiting: pool,
        }
    }

    #[test]
    fn test_authorize_checks_in_order() {
        let engine = LotteryEngine::default();
        let mut past = event(5, None);
        past.event_date = Utc::now() - Duration::hours(1);

        // Non-organizer on a passed event is reported as unauthorized first
        assert!(matches!(
            engine.authorize(&past, 7, Utc::now()),
            Err(LotteryError::NotAuthorized { caller_id: 7, .. })
        ));
        assert!(matches!(
            engine.authorize(&past, 100, Utc::now()),
            Err(LotteryError::EventAlreadyOccurred { .. })
        ));

        let misconfigured = event(-1, None);
        assert!(matches!(
            engine.authorize(&misconfigured, 100, Utc::now()),
            Err(LotteryError::Configuration { .. })
        ));
    }

    #[test]
    fn test_plan_scenarios() {
        let engine = LotteryEngine::default();
        let target = DrawTarget { num_winners: 5, max_entrants: None };

        assert_eq!(engine.plan(&target, &snapshot(20, 0, 0, 0)), DrawPlan::Draw(5));
        assert_eq!(engine.plan(&target, &snapshot(10, 0, 3, 0)), DrawPlan::Draw(2));
        assert_eq!(engine.plan(&target, &snapshot(8, 0, 5, 0)), DrawPlan::NothingToDraw);
        assert_eq!(engine.plan(&target, &snapshot(3, 0, 1, 0)), DrawPlan::Draw(3));
    }

    #[test]
    fn test_outstanding_invites_hold_seats() {
        let engine = LotteryEngine::default();
        let target = DrawTarget { num_winners: 5, max_entrants: None };

        assert_eq!(engine.plan(&target, &snapshot(10, 3, 2, 0)), DrawPlan::NothingToDraw);
        assert_eq!(engine.plan(&target, &snapshot(10, 2, 1, 0)), DrawPlan::Draw(2));
    }

    #[test]
    fn test_cancelled_invite_policy() {
        let target = DrawTarget { num_winners: 5, max_entrants: None };
        let snap = snapshot(10, 2, 1, 2);

        let releasing = LotteryEngine::new(CancelledInvitePolicy::ReleaseSeat);
        assert_eq!(releasing.plan(&target, &snap), DrawPlan::Draw(2));

        let holding = LotteryEngine::new(CancelledInvitePolicy::HoldSeat);
        assert_eq!(holding.plan(&target, &snap), DrawPlan::NothingToDraw);
    }

    #[test]
    fn test_plan_respects_hard_cap() {
        let engine = LotteryEngine::default();

        let capped = DrawTarget { num_winners: 10, max_entrants: Some(4) };
        assert_eq!(engine.plan(&capped, &snapshot(20, 0, 1, 0)), DrawPlan::Draw(3));

        let full = DrawTarget { num_winners: 10, max_entrants: Some(4) };
        assert_eq!(engine.plan(&full, &snapshot(20, 1, 3, 0)), DrawPlan::CapacityReached);
    }

    #[test]
    fn test_select_returns_distinct_pool_members() {
        let engine = LotteryEngine::default();
        let snap = snapshot(20, 0, 0, 0);
        let mut rng = StdRng::seed_from_u64(7);

        let winners = engine.select(&snap.waiting, 5, &mut rng);
        let unique: HashSet<_> = winners.iter().copied().collect();
        assert_eq!(winners.len(), 5);
        assert_eq!(unique.len(), 5);
        assert!(winners.iter().all(|id| (0..20).contains(id)));

        assert_eq!(engine.select(&snap.waiting, 50, &mut rng).len(), 20);
        assert!(engine.select(&snap.waiting, 0, &mut rng).is_empty());
    }

    #[test]
    fn test_selection_is_uniform() {
        let engine = LotteryEngine::default();
        let snap = snapshot(10, 0, 0, 0);
        let mut rng = StdRng::seed_from_u64(2024);
        let trials = 20_000;
        let k = 3;
        let mut hits = [0u32; 10];

        for _ in 0..trials {
            for id in engine.select(&snap.waiting, k, &mut rng) {
                hits[id as usize] += 1;
            }
        }

        let expected = trials as f64 * k as f64 / 10.0;
        for count in hits {
            let deviation = (count as f64 - expected).abs() / expected;
            assert!(deviation < 0.05, "selection frequency off by {:.3}", deviation);
        }
    }
}
