//! Storage seams consumed by the lottery core
//!
//! Every method may suspend; implementations talk to the database.

use std::collections::HashSet;
use async_trait::async_trait;
use crate::models::{EntrantStatus, Event, StatusCounts, WaitingListEntrant};
use crate::utils::errors::{LotteryError, LotteryResult};
use crate::utils::logging;

/// Event lookup and the derived fields the lottery maintains on it
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn get_event(&self, event_id: i64) -> LotteryResult<Option<Event>>;

    /// Record that a draw has selected entrants for this event
    async fn mark_lottery_executed(&self, event_id: i64) -> LotteryResult<()>;
}

/// Entrants of an event, partitioned by status
#[async_trait]
pub trait WaitingListStore: Send + Sync {
    /// Snapshot of every entrant currently in `status`; empty is not an error
    async fn entrants_with_status(
        &self,
        event_id: i64,
        status: EntrantStatus,
    ) -> LotteryResult<Vec<WaitingListEntrant>>;

    /// Move every listed entrant from `from` to `to` as one atomic batch.
    ///
    /// Fails with `LotteryError::ConcurrentModification` naming the offending
    /// entrants when any of them is not in `from` at write time; nothing is
    /// written in that case.
    async fn apply_status_transition(
        &self,
        event_id: i64,
        entrant_ids: &[i64],
        from: EntrantStatus,
        to: EntrantStatus,
    ) -> LotteryResult<()>;

    async fn status_counts(&self, event_id: i64) -> LotteryResult<StatusCounts> {
        let mut counts = StatusCounts::default();
        for status in EntrantStatus::ALL {
            let entrants = self.entrants_with_status(event_id, status).await?;
            counts.set(status, entrants.len() as u32);
        }
        Ok(counts)
    }

    async fn find_entrant(&self, event_id: i64, entrant_id: i64) -> LotteryResult<Option<WaitingListEntrant>>;

    /// Insert a new `WAITING` record; returns false when the entrant already has one
    async fn add_entrant(&self, entrant: WaitingListEntrant) -> LotteryResult<bool>;

    async fn mark_notified(&self, event_id: i64, entrant_ids: &[i64]) -> LotteryResult<()>;
}

/// Entrants split by whether their transition was committed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionResult {
    pub applied: Vec<i64>,
    /// Entrants whose status had moved away from the expected one
    pub excluded: Vec<i64>,
}

/// Apply a batch transition, dropping entrants that conflict and retrying
/// the rest until a batch commits or nothing is left. Repeated ids count once.
pub async fn transition_excluding_conflicts<S>(
    store: &S,
    event_id: i64,
    entrant_ids: Vec<i64>,
    from: EntrantStatus,
    to: EntrantStatus,
) -> LotteryResult<TransitionResult>
where
    S: WaitingListStore + ?Sized,
{
    let mut pending = entrant_ids;
    let mut seen = HashSet::with_capacity(pending.len());
    pending.retain(|id| seen.insert(*id));
    let mut excluded = Vec::new();

    while !pending.is_empty() {
        match store.apply_status_transition(event_id, &pending, from, to).await {
            Ok(()) => {
                for id in &pending {
                    logging::log_entrant_transition(event_id, *id, from, to);
                }
                return Ok(TransitionResult { applied: pending, excluded });
            }
            Err(LotteryError::ConcurrentModification { entrant_ids: conflicting, .. }) => {
                logging::log_store_conflict(event_id, &conflicting);
                let before = pending.len();
                excluded.extend(pending.iter().copied().filter(|id| conflicting.contains(id)));
                pending.retain(|id| !conflicting.contains(id));

                if pending.len() == before {
                    return Err(LotteryError::StorageUnavailable(format!(
                        "store reported conflicts outside the batch for event {}",
                        event_id
                    )));
                }
            }
            Err(e) => return Err(e),
        }
    }

    Ok(TransitionResult { applied: pending, excluded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lottery::memory::MemoryStore;
    use crate::models::WaitingListEntrant;

    async fn store_with_waiting(ids: &[i64]) -> MemoryStore {
        let store = MemoryStore::new();
        for id in ids {
            store.add_entrant(WaitingListEntrant::new(3, *id, None)).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_repeated_ids_are_applied_once() {
        let store = store_with_waiting(&[1, 2]).await;

        let result = transition_excluding_conflicts(&store, 3, vec![1, 2, 1], EntrantStatus::Waiting, EntrantStatus::Selected)
            .await
            .unwrap();

        assert_eq!(result.applied, vec![1, 2]);
        assert!(result.excluded.is_empty());
        assert_eq!(store.status_counts(3).await.unwrap().selected, 2);
    }

    #[tokio::test]
    async fn test_conflicting_ids_are_excluded() {
        let store = store_with_waiting(&[1, 2, 3]).await;
        store.force_status(3, 2, EntrantStatus::Cancelled).await;

        let result = transition_excluding_conflicts(&store, 3, vec![1, 2, 3], EntrantStatus::Waiting, EntrantStatus::Selected)
            .await
            .unwrap();

        assert_eq!(result.applied, vec![1, 3]);
        assert_eq!(result.excluded, vec![2]);
    }
}
