//! Draw-count policy
//!
//! Pure arithmetic over status counts; no I/O and no randomness.

use serde::{Deserialize, Serialize};
use crate::models::{Event, StatusCounts};
use crate::config::CancelledInvitePolicy;
use crate::utils::errors::{LotteryError, LotteryResult};

/// Validated seat configuration of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawTarget {
    /// Intended number of accepted participants
    pub num_winners: u32,
    /// Hard seat cap, when the event sets one
    pub max_entrants: Option<u32>,
}

impl DrawTarget {
    /// Validate the raw event configuration before any draw is attempted
    pub fn from_event(event: &Event) -> LotteryResult<Self> {
        let num_winners = u32::try_from(event.max_winners).map_err(|_| LotteryError::Configuration {
            event_id: event.id,
            reason: format!("max_winners must be non-negative, got {}", event.max_winners),
        })?;

        let max_entrants = match event.max_entrants {
            Some(cap) => Some(u32::try_from(cap).map_err(|_| LotteryError::Configuration {
                event_id: event.id,
                reason: format!("max_entrants must be non-negative, got {}", cap),
            })?),
            None => None,
        };

        Ok(Self { num_winners, max_entrants })
    }
}

/// Entrants that already hold a seat under the given cancellation policy
pub fn committed_seats(counts: &StatusCounts, policy: CancelledInvitePolicy) -> u32 {
    let held = counts.accepted + counts.selected;
    match policy {
        CancelledInvitePolicy::ReleaseSeat => held,
        CancelledInvitePolicy::HoldSeat => held + counts.cancelled,
    }
}

/// Number of entrants to draw, evaluated row by row:
///
/// | condition                                  | result             |
/// |--------------------------------------------|--------------------|
/// | `accepted >= winners`                      | 0                  |
/// | `accepted == 0 && waiting > winners`       | `winners`          |
/// | `accepted > 0 && waiting > winners`        | `winners - accepted` |
/// | otherwise                                  | `waiting`          |
///
/// The last row is additionally bounded by `winners - accepted`, so the
/// result never exceeds the seats still open nor the pool size.
pub fn num_to_draw(num_accepted: u32, num_waiting: u32, num_winners: u32) -> u32 {
    if num_accepted >= num_winners {
        return 0;
    }

    let remaining = num_winners - num_accepted;
    if num_waiting > num_winners {
        if num_accepted == 0 {
            num_winners
        } else {
            remaining
        }
    } else {
        num_waiting.min(remaining)
    }
}

/// Further bound a draw so committed seats never pass the hard cap
pub fn clamp_to_cap(draw: u32, committed: u32, max_entrants: Option<u32>) -> u32 {
    match max_entrants {
        Some(cap) => draw.min(cap.saturating_sub(committed)),
        None => draw,
    }
}

/// Whether the hard cap is already exhausted
pub fn capacity_reached(committed: u32, max_entrants: Option<u32>) -> bool {
    matches!(max_entrants, Some(cap) if committed >= cap)
}
