//! Waiting-list service implementation
//!
//! Entrant-facing operations around the lottery: joining and leaving the
//! list, answering an invitation, and the organizer's cleanup of stale
//! invites.

use std::sync::Arc;
use chrono::Utc;
use tracing::{debug, info, warn};
use crate::lottery::lock::RunLock;
use crate::lottery::store::{transition_excluding_conflicts, EventStore, WaitingListStore};
use crate::models::{EntrantStatus, Event, JoinWaitingListRequest, StatusCounts, WaitingListEntrant};
use crate::utils::errors::{LotteryError, PickMeError, Result};
use crate::utils::logging;

#[derive(Clone)]
pub struct WaitingListService {
    events: Arc<dyn EventStore>,
    entrants: Arc<dyn WaitingListStore>,
    lock: Arc<dyn RunLock>,
}

impl WaitingListService {
    pub fn new(events: Arc<dyn EventStore>, entrants: Arc<dyn WaitingListStore>, lock: Arc<dyn RunLock>) -> Self {
        Self { events, entrants, lock }
    }

    /// Put an entrant on the event's waiting list.
    ///
    /// Runs under the event's run lock so the admission cap cannot be
    /// overrun by concurrent joins or a concurrent draw.
    pub async fn join(&self, request: JoinWaitingListRequest) -> Result<WaitingListEntrant> {
        let event_id = request.event_id;
        let lease = self.lock.acquire(event_id).await?;
        let result = self.join_locked(request).await;

        if let Err(e) = self.lock.release(lease).await {
            warn!(event_id = event_id, error = %e, "Failed to release lock after join");
        }
        result
    }

    async fn join_locked(&self, request: JoinWaitingListRequest) -> Result<WaitingListEntrant> {
        let event = self.fetch_event(request.event_id).await?;

        if event.has_passed(Utc::now()) {
            return Err(LotteryError::EventAlreadyOccurred {
                event_id: event.id,
                event_date: event.event_date,
            }
            .into());
        }
        if event.geolocation_required && request.geolocation.is_none() {
            return Err(PickMeError::InvalidInput(format!(
                "Event {} requires a location to join",
                event.id
            )));
        }
        if self.entrants.find_entrant(event.id, request.entrant_id).await?.is_some() {
            return Err(PickMeError::AlreadyJoined {
                event_id: event.id,
                entrant_id: request.entrant_id,
            });
        }

        if let Some(max_entrants) = event.max_entrants {
            let counts = self.entrants.status_counts(event.id).await?;
            if i64::from(counts.active()) >= i64::from(max_entrants) {
                return Err(PickMeError::WaitingListFull { event_id: event.id, max_entrants });
            }
        }

        let entrant = WaitingListEntrant::new(event.id, request.entrant_id, request.geolocation);
        if !self.entrants.add_entrant(entrant.clone()).await? {
            return Err(PickMeError::AlreadyJoined {
                event_id: event.id,
                entrant_id: request.entrant_id,
            });
        }

        info!(event_id = event.id, entrant_id = request.entrant_id, "Entrant joined waiting list");
        Ok(entrant)
    }

    /// Leave the list; only possible before being drawn
    pub async fn leave(&self, event_id: i64, entrant_id: i64) -> Result<()> {
        self.transition_one(event_id, entrant_id, EntrantStatus::Waiting, EntrantStatus::Cancelled)
            .await
    }

    pub async fn accept(&self, event_id: i64, entrant_id: i64) -> Result<()> {
        self.transition_one(event_id, entrant_id, EntrantStatus::Selected, EntrantStatus::Accepted)
            .await
    }

    pub async fn decline(&self, event_id: i64, entrant_id: i64) -> Result<()> {
        self.transition_one(event_id, entrant_id, EntrantStatus::Selected, EntrantStatus::Rejected)
            .await
    }

    /// Revoke every unanswered invitation. Returns the cancelled entrants.
    pub async fn cancel_pending(&self, event_id: i64, caller_id: i64) -> Result<Vec<i64>> {
        self.cancel_all(event_id, caller_id, EntrantStatus::Selected).await
    }

    /// Move every declined entrant out of the event. Returns the cancelled entrants.
    pub async fn cancel_rejected(&self, event_id: i64, caller_id: i64) -> Result<Vec<i64>> {
        self.cancel_all(event_id, caller_id, EntrantStatus::Rejected).await
    }

    pub async fn status_counts(&self, event_id: i64) -> Result<StatusCounts> {
        self.fetch_event(event_id).await?;
        Ok(self.entrants.status_counts(event_id).await?)
    }

    async fn fetch_event(&self, event_id: i64) -> Result<Event> {
        self.events
            .get_event(event_id)
            .await?
            .ok_or(PickMeError::EventNotFound { event_id })
    }

    async fn transition_one(
        &self,
        event_id: i64,
        entrant_id: i64,
        from: EntrantStatus,
        to: EntrantStatus,
    ) -> Result<()> {
        Self::check_transition(from, to)?;
        let entrant = self
            .entrants
            .find_entrant(event_id, entrant_id)
            .await?
            .ok_or(PickMeError::EntrantNotFound { event_id, entrant_id })?;

        if entrant.status != from {
            return Err(PickMeError::InvalidStateTransition {
                from: entrant.status.to_string(),
                to: to.to_string(),
            });
        }

        match self.entrants.apply_status_transition(event_id, &[entrant_id], from, to).await {
            Ok(()) => {
                logging::log_entrant_transition(event_id, entrant_id, from, to);
                Ok(())
            }
            Err(LotteryError::ConcurrentModification { .. }) => {
                // Lost a race with another writer; report the state it left behind.
                let current = self
                    .entrants
                    .find_entrant(event_id, entrant_id)
                    .await?
                    .map(|e| e.status.to_string())
                    .unwrap_or_else(|| "missing".to_string());
                Err(PickMeError::InvalidStateTransition { from: current, to: to.to_string() })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn check_transition(from: EntrantStatus, to: EntrantStatus) -> Result<()> {
        if !from.can_transition_to(to) {
            return Err(PickMeError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }

    async fn cancel_all(&self, event_id: i64, caller_id: i64, from: EntrantStatus) -> Result<Vec<i64>> {
        Self::check_transition(from, EntrantStatus::Cancelled)?;
        let event = self.fetch_event(event_id).await?;
        if !event.is_organized_by(caller_id) {
            return Err(LotteryError::NotAuthorized { event_id, caller_id }.into());
        }

        let ids: Vec<i64> = self
            .entrants
            .entrants_with_status(event_id, from)
            .await?
            .into_iter()
            .map(|e| e.entrant_id)
            .collect();
        if ids.is_empty() {
            debug!(event_id = event_id, status = %from, "No entrants to cancel");
            return Ok(Vec::new());
        }

        let result = transition_excluding_conflicts(
            self.entrants.as_ref(),
            event_id,
            ids,
            from,
            EntrantStatus::Cancelled,
        )
        .await?;

        info!(
            event_id = event_id,
            from = %from,
            cancelled = result.applied.len(),
            skipped = result.excluded.len(),
            "Cancelled entrants"
        );
        Ok(result.applied)
    }
}
