//! Services module
//!
//! Wires the lottery core to its storage, run lock and message delivery

pub mod notification;
pub mod waiting_list;

// Re-export commonly used services
pub use notification::{MessageTemplate, TelegramNotifier};
pub use waiting_list::WaitingListService;

use std::sync::Arc;
use teloxide::Bot;
use tracing::info;
use crate::config::settings::{LockBackend, Settings};
use crate::lottery::{LocalRunLock, LotteryRunCoordinator, RedisRunLock, RunLock};
use crate::lottery::store::{EventStore, WaitingListStore};
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub lottery: LotteryRunCoordinator,
    pub waiting_list: WaitingListService,
    lock_backend: LockBackend,
    redis_client: Option<::redis::Client>,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(
        bot: Option<Bot>,
        settings: &Settings,
        events: Arc<dyn EventStore>,
        entrants: Arc<dyn WaitingListStore>,
    ) -> Result<Self> {
        let lottery_config = &settings.lottery;

        let (lock, redis_client): (Arc<dyn RunLock>, Option<::redis::Client>) = match lottery_config.lock_backend {
            LockBackend::Local => (Arc::new(LocalRunLock::new(lottery_config.lock_wait())), None),
            LockBackend::Redis => {
                let client = ::redis::Client::open(settings.redis.url.as_str())?;
                let lock = RedisRunLock::new(
                    client.clone(),
                    settings.redis.prefix.clone(),
                    lottery_config.lock_wait(),
                    lottery_config.lock_ttl(),
                );
                (Arc::new(lock), Some(client))
            }
        };
        info!(backend = ?lottery_config.lock_backend, "Lottery run lock configured");

        let mut lottery = LotteryRunCoordinator::from_config(lottery_config, events.clone(), entrants.clone(), lock.clone());
        if lottery_config.notify_winners {
            if let Some(bot) = bot {
                lottery = lottery.with_notifier(Arc::new(TelegramNotifier::new(bot)));
            }
        }

        let waiting_list = WaitingListService::new(events, entrants, lock);

        Ok(Self {
            lottery,
            waiting_list,
            lock_backend: lottery_config.lock_backend,
            redis_client,
        })
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let redis_healthy = match &self.redis_client {
            Some(client) => Self::ping(client).await,
            None => true,
        };

        ServiceHealthStatus {
            lock_backend: self.lock_backend,
            redis_healthy,
        }
    }

    async fn ping(client: &::redis::Client) -> bool {
        let Ok(mut conn) = client.get_async_connection().await else {
            return false;
        };
        let pong: ::redis::RedisResult<String> = ::redis::cmd("PING").query_async(&mut conn).await;
        pong.is_ok()
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    pub lock_backend: LockBackend,
    pub redis_healthy: bool,
}

impl ServiceHealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.redis_healthy
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.redis_healthy {
            issues.push("Redis connection failed; lottery runs cannot take the run lock".to_string());
        }
        issues
    }
}
