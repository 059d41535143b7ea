//! Event model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub organizer_id: i64,
    pub event_date: DateTime<Utc>,
    pub location: Option<String>,
    /// Hard cap on seats (selected + accepted); also caps waiting-list admission
    pub max_entrants: Option<i32>,
    /// Target number of accepted participants
    pub max_winners: i32,
    pub geolocation_required: bool,
    pub has_lottery_executed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_organized_by(&self, user_id: i64) -> bool {
        self.organizer_id == user_id
    }

    /// An event counts as passed once its start time is strictly before `now`
    pub fn has_passed(&self, now: DateTime<Utc>) -> bool {
        self.event_date < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event_at(event_date: DateTime<Utc>) -> Event {
        Event {
            id: 1,
            title: "Social".to_string(),
            description: None,
            organizer_id: 42,
            event_date,
            location: None,
            max_entrants: None,
            max_winners: 5,
            geolocation_required: false,
            has_lottery_executed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_passed() {
        let now = Utc::now();
        assert!(event_at(now - Duration::minutes(1)).has_passed(now));
        assert!(!event_at(now + Duration::minutes(1)).has_passed(now));
        assert!(!event_at(now).has_passed(now));
    }

    #[test]
    fn test_is_organized_by() {
        let event = event_at(Utc::now());
        assert!(event.is_organized_by(42));
        assert!(!event.is_organized_by(7));
    }
}
