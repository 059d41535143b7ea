//! PickMe
//!
//! Waiting-list lottery for events: entrants join an event's waiting list,
//! the organizer draws winners uniformly at random up to the event's seat
//! targets, and declined seats are redrawn on the next run. Exposed as a
//! Telegram bot backed by Postgres, with an optional Redis run lock for
//! multi-instance deployments.

#![allow(non_snake_case)]

pub mod config;
pub mod database;
pub mod handlers;
pub mod lottery;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{LotteryError, LotteryResult, PickMeError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use lottery::{LotteryRun, LotteryRunCoordinator, RunOutcome};
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
