//! Admission Controller: per-client fixed-window rate limiting.
//!
//! Every analyze call passes through [`AdmissionController::check_and_admit`]
//! before any expensive work. Accounting is never rolled back: a request that
//! later fails downstream still consumes one unit of the client's quota.
//!
//! Window state lives behind the [`WindowStore`] trait so a single instance
//! can keep it in memory while a fleet shares it through Redis.

pub mod client_id;
pub mod memory;
pub mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use client_id::ClientId;
pub use memory::MemoryWindowStore;
pub use redis_store::RedisWindowStore;

/// Ceiling and window length applied to every client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted { remaining: u32 },
    Refused { retry_after: Duration },
}

impl Admission {
    #[cfg(test)]
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted { .. })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Unexpected store reply: {0}")]
    Protocol(String),
}

/// Backing store for client windows.
///
/// `check_and_admit` must be atomic per key: concurrent calls for the same
/// client may never both observe the same count.
#[async_trait]
pub trait WindowStore: Send + Sync {
    /// Opens, resets, or increments the window for `client_id` and decides admission.
    async fn check_and_admit(
        &self,
        client_id: &str,
        policy: RateLimitPolicy,
    ) -> Result<Admission, StoreError>;

    /// Drops windows whose reset time has passed. Returns how many were removed.
    async fn sweep_expired(&self) -> Result<usize, StoreError>;
}

#[derive(Clone)]
pub struct AdmissionController {
    store: Arc<dyn WindowStore>,
    policy: RateLimitPolicy,
}

impl AdmissionController {
    pub fn new(store: Arc<dyn WindowStore>, policy: RateLimitPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    pub async fn check_and_admit(&self, client_id: &str) -> Result<Admission, StoreError> {
        let admission = self.store.check_and_admit(client_id, self.policy).await?;
        match admission {
            Admission::Admitted { remaining } => {
                debug!("Admitted client {client_id} ({remaining} remaining in window)")
            }
            Admission::Refused { retry_after } => warn!(
                "Rate limited client {client_id}; window resets in {}s",
                retry_after.as_secs()
            ),
        }
        Ok(admission)
    }

    /// Spawns the periodic sweep of stale windows. Runs until the runtime shuts down.
    pub fn spawn_sweeper(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match store.sweep_expired().await {
                    Ok(0) => {}
                    Ok(removed) => info!("Swept {removed} expired rate-limit windows"),
                    Err(e) => warn!("Rate-limit sweep failed: {e}"),
                }
            }
        })
    }
}
