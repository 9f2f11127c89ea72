//! Redis-backed window store for multi-instance deployments.
//!
//! One Lua script performs the whole get / compare / increment / reset cycle
//! server-side, so concurrent instances never lose an update. Windows expire
//! through key TTLs, which makes the periodic sweep a no-op here.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Script;
use tokio::time::Duration;
use tracing::info;

use super::{Admission, RateLimitPolicy, StoreError, WindowStore};

const KEY_PREFIX: &str = "roast:ratelimit";

/// KEYS[1] = window key, ARGV[1] = ceiling, ARGV[2] = window in ms.
/// Returns {admitted (0|1), count, ttl_ms}.
const ADMIT_SCRIPT: &str = r#"
local count = redis.call('GET', KEYS[1])
if not count then
  redis.call('SET', KEYS[1], 1, 'PX', ARGV[2])
  return {1, 1, tonumber(ARGV[2])}
end
count = tonumber(count)
local ttl = redis.call('PTTL', KEYS[1])
if count < tonumber(ARGV[1]) then
  redis.call('INCR', KEYS[1])
  return {1, count + 1, ttl}
end
return {0, count, ttl}
"#;

pub struct RedisWindowStore {
    conn: MultiplexedConnection,
    script: Script,
}

impl RedisWindowStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Redis window store connected");
        Ok(Self {
            conn,
            script: Script::new(ADMIT_SCRIPT),
        })
    }
}

fn window_key(client_id: &str) -> String {
    format!("{KEY_PREFIX}:{client_id}")
}

fn decode_reply(reply: &[i64], policy: RateLimitPolicy) -> Result<Admission, StoreError> {
    let [admitted, count, ttl_ms] = reply else {
        return Err(StoreError::Protocol(format!(
            "expected 3 integers from admission script, got {reply:?}"
        )));
    };
    if *admitted == 1 {
        let count = u32::try_from(*count).unwrap_or(u32::MAX);
        Ok(Admission::Admitted {
            remaining: policy.max_requests.saturating_sub(count),
        })
    } else {
        Ok(Admission::Refused {
            retry_after: Duration::from_millis((*ttl_ms).max(0) as u64),
        })
    }
}

#[async_trait]
impl WindowStore for RedisWindowStore {
    async fn check_and_admit(
        &self,
        client_id: &str,
        policy: RateLimitPolicy,
    ) -> Result<Admission, StoreError> {
        let mut conn = self.conn.clone();
        let window_ms = u64::try_from(policy.window.as_millis()).unwrap_or(u64::MAX);
        let reply: Vec<i64> = self
            .script
            .key(window_key(client_id))
            .arg(policy.max_requests)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await?;
        decode_reply(&reply, policy)
    }

    async fn sweep_expired(&self) -> Result<usize, StoreError> {
        Ok(0)
    }
}
