//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the lottery and waiting-list flows.

use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::models::EntrantStatus;
use crate::utils::errors::{PickMeError, Result};

/// Initialize logging based on configuration
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()
        .map_err(|e| PickMeError::Config(format!("Failed to install logger: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log the outcome of one lottery run
pub fn log_lottery_run(event_id: i64, caller_id: i64, outcome: &str, drawn: usize, conflicts: usize) {
    info!(
        event_id = event_id,
        caller_id = caller_id,
        outcome = outcome,
        drawn = drawn,
        conflicts = conflicts,
        "Lottery run finished"
    );
}

/// Log an entrant status change
pub fn log_entrant_transition(event_id: i64, entrant_id: i64, from: EntrantStatus, to: EntrantStatus) {
    debug!(
        event_id = event_id,
        entrant_id = entrant_id,
        from = %from,
        to = %to,
        "Entrant status transitioned"
    );
}

/// Log entrants dropped from a draw because their status moved underneath it
pub fn log_store_conflict(event_id: i64, entrant_ids: &[i64]) {
    warn!(
        event_id = event_id,
        entrant_ids = ?entrant_ids,
        "Entrant status changed during persistence, excluding from winners"
    );
}
