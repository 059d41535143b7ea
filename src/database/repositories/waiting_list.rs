//! Waiting-list repository implementation

use std::collections::HashSet;
use async_trait::async_trait;
use sqlx::PgPool;
use chrono::Utc;
use crate::lottery::store::WaitingListStore;
use crate::models::{EntrantStatus, StatusCounts, WaitingListEntrant};
use crate::utils::errors::{LotteryError, LotteryResult};

const ENTRANT_COLUMNS: &str = "event_id, entrant_id, status, joined_at, latitude, longitude, notified, updated_at";

#[derive(Debug, Clone)]
pub struct WaitingListRepository {
    pool: PgPool,
}

impl WaitingListRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WaitingListStore for WaitingListRepository {
    async fn entrants_with_status(
        &self,
        event_id: i64,
        status: EntrantStatus,
    ) -> LotteryResult<Vec<WaitingListEntrant>> {
        let entrants = sqlx::query_as::<_, WaitingListEntrant>(&format!(
            "SELECT {} FROM waiting_list_entrants WHERE event_id = $1 AND status = $2 ORDER BY joined_at ASC",
            ENTRANT_COLUMNS
        ))
        .bind(event_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(entrants)
    }

    async fn apply_status_transition(
        &self,
        event_id: i64,
        entrant_ids: &[i64],
        from: EntrantStatus,
        to: EntrantStatus,
    ) -> LotteryResult<()> {
        if entrant_ids.is_empty() {
            return Ok(());
        }
        let mut seen = HashSet::with_capacity(entrant_ids.len());
        let unique: Vec<i64> = entrant_ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let mut tx = self.pool.begin().await?;

        // Rows whose status moved since the caller read them stay untouched.
        let updated: Vec<(i64,)> = sqlx::query_as(
            r#"
            UPDATE waiting_list_entrants
            SET status = $4, updated_at = $5
            WHERE event_id = $1 AND entrant_id = ANY($2) AND status = $3
            RETURNING entrant_id
            "#
        )
        .bind(event_id)
        .bind(unique.as_slice())
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(Utc::now())
        .fetch_all(&mut *tx)
        .await?;

        if updated.len() != unique.len() {
            let applied: HashSet<i64> = updated.into_iter().map(|(id,)| id).collect();
            let conflicting: Vec<i64> = unique
                .into_iter()
                .filter(|id| !applied.contains(id))
                .collect();
            tx.rollback().await?;
            return Err(LotteryError::ConcurrentModification { event_id, entrant_ids: conflicting });
        }

        tx.commit().await?;
        Ok(())
    }

    async fn status_counts(&self, event_id: i64) -> LotteryResult<StatusCounts> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM waiting_list_entrants WHERE event_id = $1 GROUP BY status"
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            let status: EntrantStatus = status
                .parse()
                .map_err(|e: crate::models::UnknownStatus| LotteryError::StorageUnavailable(e.to_string()))?;
            counts.set(status, count as u32);
        }
        Ok(counts)
    }

    async fn find_entrant(&self, event_id: i64, entrant_id: i64) -> LotteryResult<Option<WaitingListEntrant>> {
        let entrant = sqlx::query_as::<_, WaitingListEntrant>(&format!(
            "SELECT {} FROM waiting_list_entrants WHERE event_id = $1 AND entrant_id = $2",
            ENTRANT_COLUMNS
        ))
        .bind(event_id)
        .bind(entrant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entrant)
    }

    async fn add_entrant(&self, entrant: WaitingListEntrant) -> LotteryResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO waiting_list_entrants (event_id, entrant_id, status, joined_at, latitude, longitude, notified, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (event_id, entrant_id) DO NOTHING
            "#
        )
        .bind(entrant.event_id)
        .bind(entrant.entrant_id)
        .bind(entrant.status.as_str())
        .bind(entrant.joined_at)
        .bind(entrant.latitude)
        .bind(entrant.longitude)
        .bind(entrant.notified)
        .bind(entrant.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_notified(&self, event_id: i64, entrant_ids: &[i64]) -> LotteryResult<()> {
        sqlx::query(
            "UPDATE waiting_list_entrants SET notified = TRUE, updated_at = $3 WHERE event_id = $1 AND entrant_id = ANY($2)"
        )
        .bind(event_id)
        .bind(entrant_ids)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
