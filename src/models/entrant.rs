//! Waiting-list entrant model

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use thiserror::Error;

/// Position of an entrant in an event's waiting list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrantStatus {
    /// Joined the list and eligible for a draw
    Waiting,
    /// Drawn by a lottery run, invitation not answered yet
    Selected,
    /// Accepted the invitation
    Accepted,
    /// Declined the invitation
    Rejected,
    /// Removed from drawing (revoked invite or left the list)
    Cancelled,
}

impl EntrantStatus {
    pub const ALL: [EntrantStatus; 5] = [
        EntrantStatus::Waiting,
        EntrantStatus::Selected,
        EntrantStatus::Accepted,
        EntrantStatus::Rejected,
        EntrantStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntrantStatus::Waiting => "waiting",
            EntrantStatus::Selected => "selected",
            EntrantStatus::Accepted => "accepted",
            EntrantStatus::Rejected => "rejected",
            EntrantStatus::Cancelled => "cancelled",
        }
    }

    /// Whether `self -> next` is a legal move
    pub fn can_transition_to(&self, next: EntrantStatus) -> bool {
        matches!(
            (self, next),
            (EntrantStatus::Waiting, EntrantStatus::Selected)
                | (EntrantStatus::Waiting, EntrantStatus::Cancelled)
                | (EntrantStatus::Selected, EntrantStatus::Accepted)
                | (EntrantStatus::Selected, EntrantStatus::Rejected)
                | (EntrantStatus::Selected, EntrantStatus::Cancelled)
                | (EntrantStatus::Rejected, EntrantStatus::Cancelled)
        )
    }
}

impl fmt::Display for EntrantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown entrant status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for EntrantStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "waiting" => Ok(EntrantStatus::Waiting),
            "selected" => Ok(EntrantStatus::Selected),
            "accepted" => Ok(EntrantStatus::Accepted),
            "rejected" => Ok(EntrantStatus::Rejected),
            "cancelled" => Ok(EntrantStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for EntrantStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WaitingListEntrant {
    pub event_id: i64,
    pub entrant_id: i64,
    #[sqlx(try_from = "String")]
    pub status: EntrantStatus,
    pub joined_at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notified: bool,
    pub updated_at: DateTime<Utc>,
}

impl WaitingListEntrant {
    pub fn new(event_id: i64, entrant_id: i64, geolocation: Option<GeoPoint>) -> Self {
        let now = Utc::now();
        Self {
            event_id,
            entrant_id,
            status: EntrantStatus::Waiting,
            joined_at: now,
            latitude: geolocation.map(|g| g.latitude),
            longitude: geolocation.map(|g| g.longitude),
            notified: false,
            updated_at: now,
        }
    }

    pub fn geolocation(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinWaitingListRequest {
    pub event_id: i64,
    pub entrant_id: i64,
    pub geolocation: Option<GeoPoint>,
}

/// Number of entrants of one event in each status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub waiting: u32,
    pub selected: u32,
    pub accepted: u32,
    pub rejected: u32,
    pub cancelled: u32,
}

impl StatusCounts {
    pub fn get(&self, status: EntrantStatus) -> u32 {
        match status {
            EntrantStatus::Waiting => self.waiting,
            EntrantStatus::Selected => self.selected,
            EntrantStatus::Accepted => self.accepted,
            EntrantStatus::Rejected => self.rejected,
            EntrantStatus::Cancelled => self.cancelled,
        }
    }

    pub fn set(&mut self, status: EntrantStatus, count: u32) {
        match status {
            EntrantStatus::Waiting => self.waiting = count,
            EntrantStatus::Selected => self.selected = count,
            EntrantStatus::Accepted => self.accepted = count,
            EntrantStatus::Rejected => self.rejected = count,
            EntrantStatus::Cancelled => self.cancelled = count,
        }
    }

    /// Records still occupying a place on the list
    pub fn active(&self) -> u32 {
        self.waiting + self.selected + self.accepted + self.rejected
    }

    pub fn from_entrants<'a, I>(entrants: I) -> Self
    where
        I: IntoIterator<Item = &'a WaitingListEntrant>,
    {
        let mut counts = Self::default();
        for entrant in entrants {
            let next = counts.get(entrant.status) + 1;
            counts.set(entrant.status, next);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_text() {
        for status in EntrantStatus::ALL {
            assert_eq!(status.as_str().parse::<EntrantStatus>(), Ok(status));
        }
        assert_eq!("SELECTED".parse::<EntrantStatus>(), Ok(EntrantStatus::Selected));
        assert!("pending".parse::<EntrantStatus>().is_err());
    }

    #[test]
    fn test_transitions_are_one_directional() {
        assert!(EntrantStatus::Waiting.can_transition_to(EntrantStatus::Selected));
        assert!(EntrantStatus::Selected.can_transition_to(EntrantStatus::Accepted));
        assert!(EntrantStatus::Selected.can_transition_to(EntrantStatus::Cancelled));
        assert!(!EntrantStatus::Selected.can_transition_to(EntrantStatus::Waiting));
        assert!(!EntrantStatus::Cancelled.can_transition_to(EntrantStatus::Waiting));
        assert!(!EntrantStatus::Accepted.can_transition_to(EntrantStatus::Rejected));
    }

    #[test]
    fn test_counts_from_entrants() {
        let mut entrants: Vec<_> = (1..=4).map(|id| WaitingListEntrant::new(9, id, None)).collect();
        entrants[0].status = EntrantStatus::Accepted;
        entrants[1].status = EntrantStatus::Cancelled;

        let counts = StatusCounts::from_entrants(&entrants);
        assert_eq!(counts.waiting, 2);
        assert_eq!(counts.accepted, 1);
        assert_eq!(counts.cancelled, 1);
        assert_eq!(counts.active(), 3);
    }

    #[test]
    fn test_geolocation_requires_both_coordinates() {
        let entrant = WaitingListEntrant::new(1, 2, Some(GeoPoint { latitude: 53.5, longitude: -113.5 }));
        assert_eq!(entrant.geolocation().map(|g| g.latitude), Some(53.5));

        let mut partial = entrant.clone();
        partial.longitude = None;
        assert!(partial.geolocation().is_none());
    }
}
