//! In-process window store for single-instance deployments.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::{Duration, Instant};

use super::{Admission, RateLimitPolicy, StoreError, WindowStore};

/// Request count and reset deadline for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientWindow {
    pub count: u32,
    pub reset_at: Instant,
}

impl ClientWindow {
    fn opened_at(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            reset_at: now + window,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.reset_at
    }
}

/// `DashMap`-backed store. The shard lock held by `entry()` is the per-key
/// critical section; no lock is held across an await point.
#[derive(Default)]
pub struct MemoryWindowStore {
    windows: DashMap<String, ClientWindow>,
}

impl MemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Snapshot of one client's window.
    #[cfg(test)]
    pub fn get(&self, client_id: &str) -> Option<ClientWindow> {
        self.windows.get(client_id).map(|w| *w)
    }

    fn admit_at(&self, client_id: &str, policy: RateLimitPolicy, now: Instant) -> Admission {
        let opened = || Admission::Admitted {
            remaining: policy.max_requests.saturating_sub(1),
        };

        match self.windows.entry(client_id.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(ClientWindow::opened_at(now, policy.window));
                opened()
            }
            Entry::Occupied(mut slot) => {
                let window = slot.get_mut();
                if window.is_expired(now) {
                    *window = ClientWindow::opened_at(now, policy.window);
                    opened()
                } else if window.count < policy.max_requests {
                    window.count += 1;
                    Admission::Admitted {
                        remaining: policy.max_requests - window.count,
                    }
                } else {
                    Admission::Refused {
                        retry_after: window.reset_at - now,
                    }
                }
            }
        }
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| !window.is_expired(now));
        before.saturating_sub(self.windows.len())
    }
}

#[async_trait]
impl WindowStore for MemoryWindowStore {
    async fn check_and_admit(
        &self,
        client_id: &str,
        policy: RateLimitPolicy,
    ) -> Result<Admission, StoreError> {
        Ok(self.admit_at(client_id, policy, Instant::now()))
    }

    async fn sweep_expired(&self) -> Result<usize, StoreError> {
        Ok(self.sweep_at(Instant::now()))
    }
}
