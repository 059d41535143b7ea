//! Error handling for PickMe
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Main error type for PickMe application
#[derive(Error, Debug)]
pub enum PickMeError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Lottery error: {0}")]
    Lottery(#[from] LotteryError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Entrant {entrant_id} is not on the waiting list of event {event_id}")]
    EntrantNotFound { event_id: i64, entrant_id: i64 },

    #[error("Entrant {entrant_id} already joined the waiting list of event {event_id}")]
    AlreadyJoined { event_id: i64, entrant_id: i64 },

    #[error("Waiting list of event {event_id} is full ({max_entrants} entrants)")]
    WaitingListFull { event_id: i64, max_entrants: i32 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Failures reported by the lottery core
///
/// A run that finds its capacity already reached is not an error; it
/// completes with `RunOutcome::CapacityReached`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LotteryError {
    #[error("User {caller_id} is not the organizer of event {event_id}")]
    NotAuthorized { event_id: i64, caller_id: i64 },

    #[error("Event {event_id} already took place at {event_date}")]
    EventAlreadyOccurred { event_id: i64, event_date: DateTime<Utc> },

    #[error("Event {event_id} is misconfigured: {reason}")]
    Configuration { event_id: i64, reason: String },

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Entrants {entrant_ids:?} of event {event_id} changed status concurrently")]
    ConcurrentModification { event_id: i64, entrant_ids: Vec<i64> },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("A lottery run for event {event_id} is already in progress")]
    RunInProgress { event_id: i64 },

    #[error("Lottery run for event {event_id} timed out")]
    TimedOut { event_id: i64 },
}

impl From<sqlx::Error> for LotteryError {
    fn from(err: sqlx::Error) -> Self {
        LotteryError::StorageUnavailable(err.to_string())
    }
}

impl From<redis::RedisError> for LotteryError {
    fn from(err: redis::RedisError) -> Self {
        LotteryError::StorageUnavailable(format!("redis: {}", err))
    }
}

impl From<PickMeError> for LotteryError {
    fn from(err: PickMeError) -> Self {
        match err {
            PickMeError::Lottery(inner) => inner,
            PickMeError::EventNotFound { event_id } => LotteryError::EventNotFound { event_id },
            other => LotteryError::StorageUnavailable(other.to_string()),
        }
    }
}

/// Result type alias for PickMe operations
pub type Result<T> = std::result::Result<T, PickMeError>;

/// Result type alias for lottery core operations
pub type LotteryResult<T> = std::result::Result<T, LotteryError>;

impl LotteryError {
    /// Whether the caller may simply invoke the run again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LotteryError::StorageUnavailable(_)
                | LotteryError::RunInProgress { .. }
                | LotteryError::TimedOut { .. }
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LotteryError::NotAuthorized { .. } => ErrorSeverity::Warning,
            LotteryError::EventAlreadyOccurred { .. } => ErrorSeverity::Info,
            LotteryError::Configuration { .. } => ErrorSeverity::Critical,
            LotteryError::EventNotFound { .. } => ErrorSeverity::Info,
            LotteryError::ConcurrentModification { .. } => ErrorSeverity::Warning,
            LotteryError::RunInProgress { .. } => ErrorSeverity::Warning,
            LotteryError::StorageUnavailable(_) | LotteryError::TimedOut { .. } => ErrorSeverity::Error,
        }
    }
}

impl PickMeError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            PickMeError::Database(_) => false,
            PickMeError::Migration(_) => false,
            PickMeError::Telegram(_) => true,
            PickMeError::Lottery(e) => e.is_retryable(),
            PickMeError::Config(_) => false,
            PickMeError::EventNotFound { .. } => false,
            PickMeError::EntrantNotFound { .. } => false,
            PickMeError::AlreadyJoined { .. } => false,
            PickMeError::WaitingListFull { .. } => false,
            PickMeError::InvalidStateTransition { .. } => false,
            PickMeError::Redis(_) => true,
            PickMeError::Serialization(_) => false,
            PickMeError::Io(_) => true,
            PickMeError::InvalidInput(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PickMeError::Database(_) => ErrorSeverity::Critical,
            PickMeError::Migration(_) => ErrorSeverity::Critical,
            PickMeError::Config(_) => ErrorSeverity::Critical,
            PickMeError::Lottery(e) => e.severity(),
            PickMeError::WaitingListFull { .. } => ErrorSeverity::Info,
            PickMeError::AlreadyJoined { .. } => ErrorSeverity::Info,
            PickMeError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_lottery_errors() {
        assert!(LotteryError::StorageUnavailable("down".to_string()).is_retryable());
        assert!(LotteryError::RunInProgress { event_id: 1 }.is_retryable());
        assert!(LotteryError::TimedOut { event_id: 1 }.is_retryable());
        assert!(!LotteryError::NotAuthorized { event_id: 1, caller_id: 2 }.is_retryable());
        assert!(!LotteryError::Configuration { event_id: 1, reason: "x".to_string() }.is_retryable());
    }

    #[test]
    fn test_lottery_error_wraps_into_app_error() {
        let err: PickMeError = LotteryError::RunInProgress { event_id: 7 }.into();
        assert!(err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(err.to_string().contains("already in progress"));
    }
}
