//! Per-event single-writer guard for lottery runs
//!
//! A second run for the same event queues behind the first for at most the
//! configured wait and then fails with `RunInProgress`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;
use crate::utils::errors::{LotteryError, LotteryResult};

/// Proof of holding the run lock for one event
#[derive(Debug)]
pub struct RunLease {
    pub event_id: i64,
    pub token: String,
    _guard: Option<OwnedMutexGuard<()>>,
}

impl RunLease {
    fn new(event_id: i64, guard: Option<OwnedMutexGuard<()>>) -> Self {
        Self {
            event_id,
            token: Uuid::new_v4().to_string(),
            _guard: guard,
        }
    }
}

#[async_trait]
pub trait RunLock: Send + Sync {
    async fn acquire(&self, event_id: i64) -> LotteryResult<RunLease>;

    async fn release(&self, lease: RunLease) -> LotteryResult<()>;
}

/// In-process lock: one async mutex per event
#[derive(Debug, Clone)]
pub struct LocalRunLock {
    slots: Arc<Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>>,
    wait: Duration,
}

impl LocalRunLock {
    pub fn new(wait: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            wait,
        }
    }

    fn slot(&self, event_id: i64) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slots
            .entry(event_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

#[async_trait]
impl RunLock for LocalRunLock {
    async fn acquire(&self, event_id: i64) -> LotteryResult<RunLease> {
        let slot = self.slot(event_id);
        match tokio::time::timeout(self.wait, slot.lock_owned()).await {
            Ok(guard) => {
                debug!(event_id = event_id, "Local run lock acquired");
                Ok(RunLease::new(event_id, Some(guard)))
            }
            Err(_) => {
                warn!(event_id = event_id, wait_ms = self.wait.as_millis() as u64, "Timed out waiting for run lock");
                Err(LotteryError::RunInProgress { event_id })
            }
        }
    }

    async fn release(&self, lease: RunLease) -> LotteryResult<()> {
        let event_id = lease.event_id;
        drop(lease);

        // Only the map still points at the slot: nobody holds or waits for it.
        let mut slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if slots.get(&event_id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            slots.remove(&event_id);
        }
        debug!(event_id = event_id, "Local run lock released");
        Ok(())
    }
}

/// Lease stored in Redis so every instance shares the same lock
#[derive(Debug, Clone)]
pub struct RedisRunLock {
    client: redis::Client,
    prefix: String,
    wait: Duration,
    ttl: Duration,
    retry_every: Duration,
}

const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

impl RedisRunLock {
    pub fn new(client: redis::Client, prefix: impl Into<String>, wait: Duration, ttl: Duration) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            wait,
            ttl,
            retry_every: Duration::from_millis(50),
        }
    }

    fn key(&self, event_id: i64) -> String {
        format!("{}lottery_lock:{}", self.prefix, event_id)
    }

    async fn try_set(&self, key: &str, token: &str) -> LotteryResult<bool> {
        let mut conn = self.client.get_async_connection().await?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg(self.ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }
}

#[async_trait]
impl RunLock for RedisRunLock {
    async fn acquire(&self, event_id: i64) -> LotteryResult<RunLease> {
        let key = self.key(event_id);
        let lease = RunLease::new(event_id, None);
        let deadline = tokio::time::Instant::now() + self.wait;

        loop {
            if self.try_set(&key, &lease.token).await? {
                debug!(event_id = event_id, key = %key, "Redis run lock acquired");
                return Ok(lease);
            }

            if tokio::time::Instant::now() + self.retry_every > deadline {
                warn!(event_id = event_id, key = %key, "Timed out waiting for redis run lock");
                return Err(LotteryError::RunInProgress { event_id });
            }
            tokio::time::sleep(self.retry_every).await;
        }
    }

    async fn release(&self, lease: RunLease) -> LotteryResult<()> {
        let key = self.key(lease.event_id);
        let mut conn = self.client.get_async_connection().await?;
        let deleted: i32 = redis::Script::new(RELEASE_SCRIPT)
            .key(&key)
            .arg(&lease.token)
            .invoke_async(&mut conn)
            .await?;

        if deleted == 0 {
            // The TTL ran out and another run may own the key now.
            warn!(event_id = lease.event_id, key = %key, "Redis run lock had already expired");
        } else {
            debug!(event_id = lease.event_id, key = %key, "Redis run lock released");
        }
        Ok(())
    }
}
