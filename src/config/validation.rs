//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{PickMeError, Result};
use super::settings::LockBackend;
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis, &settings.lottery)?;
    validate_lottery_config(&settings.lottery)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(PickMeError::Config(
            "Bot token is required".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(PickMeError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(PickMeError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(PickMeError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration; only required when the run lock lives there
fn validate_redis_config(config: &super::RedisConfig, lottery: &super::LotteryConfig) -> Result<()> {
    if lottery.lock_backend == LockBackend::Redis && config.url.is_empty() {
        return Err(PickMeError::Config(
            "Redis URL is required for the redis lock backend".to_string()
        ));
    }

    Ok(())
}

/// Validate lottery run configuration
fn validate_lottery_config(config: &super::LotteryConfig) -> Result<()> {
    if config.run_timeout_ms == 0 {
        return Err(PickMeError::Config(
            "Lottery run timeout must be greater than 0".to_string()
        ));
    }

    if config.lock_ttl_ms == 0 {
        return Err(PickMeError::Config(
            "Lottery lock TTL must be greater than 0".to_string()
        ));
    }

    // A lease that can expire mid-run would let a second run in.
    if config.lock_backend == LockBackend::Redis && config.lock_ttl_ms <= config.run_timeout_ms {
        return Err(PickMeError::Config(format!(
            "Lottery lock TTL ({}ms) must exceed the run timeout ({}ms)",
            config.lock_ttl_ms, config.run_timeout_ms
        )));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(PickMeError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(PickMeError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    if config.directory.is_empty() {
        return Err(PickMeError::Config(
            "Log directory is required".to_string()
        ));
    }

    Ok(())
}
