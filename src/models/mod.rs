//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod event;
pub mod entrant;

// Re-export commonly used models
pub use event::Event;
pub use entrant::{EntrantStatus, GeoPoint, JoinWaitingListRequest, StatusCounts, UnknownStatus, WaitingListEntrant};
