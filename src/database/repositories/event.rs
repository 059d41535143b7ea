//! Event repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::lottery::store::EventStore;
use crate::models::event::Event;
use crate::utils::errors::{LotteryResult, PickMeError};

const EVENT_COLUMNS: &str = "id, title, description, organizer_id, event_date, location, max_entrants, max_winners, geolocation_required, has_lottery_executed, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub organizer_id: i64,
    pub event_date: DateTime<Utc>,
    pub location: Option<String>,
    pub max_entrants: Option<i32>,
    pub max_winners: i32,
    pub geolocation_required: bool,
}

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event
    pub async fn create(&self, request: CreateEventRequest) -> Result<Event, PickMeError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (title, description, organizer_id, event_date, location, max_entrants, max_winners, geolocation_required, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(request.title)
        .bind(request.description)
        .bind(request.organizer_id)
        .bind(request.event_date)
        .bind(request.location)
        .bind(request.max_entrants)
        .bind(request.max_winners)
        .bind(request.geolocation_required)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>, PickMeError> {
        let event = sqlx::query_as::<_, Event>(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// Get events created by an organizer
    pub async fn get_organizer_events(&self, organizer_id: i64) -> Result<Vec<Event>, PickMeError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE organizer_id = $1 ORDER BY event_date ASC",
            EVENT_COLUMNS
        ))
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Flag the event as having run its lottery
    pub async fn set_lottery_executed(&self, id: i64) -> Result<(), PickMeError> {
        let result = sqlx::query("UPDATE events SET has_lottery_executed = TRUE, updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PickMeError::EventNotFound { event_id: id });
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for EventRepository {
    async fn get_event(&self, event_id: i64) -> LotteryResult<Option<Event>> {
        Ok(self.find_by_id(event_id).await?)
    }

    async fn mark_lottery_executed(&self, event_id: i64) -> LotteryResult<()> {
        Ok(self.set_lottery_executed(event_id).await?)
    }
}
