use std::time::{Duration, Instant};

use dashmap::DashMap;
use redis::AsyncCommands;

/// In-process cache tier: serialized values with a per-entry absolute expiry.
///
/// Expiry is checked on every read, so a stale entry is never served even if
/// the sweep has not run yet.
pub struct LocalStore {
    entries: DashMap<String, LocalEntry>,
}

struct LocalEntry {
    raw: String,
    expires_at: Instant,
}

impl LocalStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.raw.clone());
            }
            drop(entry);
            self.entries.remove(key);
        }
        None
    }

    pub fn insert(&self, key: &str, raw: String, ttl: Duration) {
        let entry = LocalEntry {
            raw,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Remote cache tier backed by Redis (`GET` / `SET key value EX ttl`).
pub struct RemoteStore {
    client: redis::Client,
}

impl RemoteStore {
    pub fn open(url: &str) -> Result<Self, redis::RedisError> {
        Ok(Self {
            client: redis::Client::open(url)?,
        })
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    pub async fn set(&self, key: &str, raw: &str, ttl: Duration) -> Result<(), redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, raw, ttl.as_secs()).await?;
        Ok(())
    }
}
