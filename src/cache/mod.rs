mod key;
mod store;

pub use key::cache_key;
pub use store::{LocalStore, RemoteStore};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppResult;

/// Two-tier response cache: optional remote tier (Redis) over an always-on
/// in-process tier. Values cross the cache as serialized JSON strings so one
/// instance serves every response type.
///
/// Remote-tier failures are logged and swallowed; the caller only ever sees
/// producer errors. Concurrent misses for the same key are not de-duplicated:
/// each caller runs the producer and the last write wins.
pub struct ResponseCache {
    remote: Option<RemoteStore>,
    local: LocalStore,
}

impl ResponseCache {
    /// Build the cache, attaching the remote tier when a URL is configured.
    /// An unparseable URL disables the remote tier rather than failing startup.
    pub fn new(redis_url: Option<&str>) -> Self {
        let remote = redis_url.and_then(|url| match RemoteStore::open(url) {
            Ok(store) => {
                tracing::info!("remote cache tier enabled");
                Some(store)
            }
            Err(e) => {
                tracing::warn!(error = %e, "invalid redis url, running with in-process cache only");
                None
            }
        });
        Self {
            remote,
            local: LocalStore::new(),
        }
    }

    pub fn local_only() -> Self {
        Self {
            remote: None,
            local: LocalStore::new(),
        }
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn local_entries(&self) -> usize {
        self.local.len()
    }

    /// Return the cached value for `key`, or produce, cache and return a
    /// fresh one. Producer failures propagate unchanged; nothing is cached
    /// on failure.
    pub async fn fetch<T, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if let Some(remote) = &self.remote {
            match remote.get(key).await {
                Ok(Some(raw)) => match serde_json::from_str(&raw) {
                    Ok(value) => return Ok(value),
                    Err(e) => {
                        tracing::warn!(key, error = %e, "discarding undecodable remote cache entry")
                    }
                },
                Ok(None) => {}
                Err(e) => tracing::warn!(key, error = %e, "remote cache read failed"),
            }
        }

        if let Some(raw) = self.local.get(key) {
            match serde_json::from_str(&raw) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(key, error = %e, "discarding undecodable local cache entry")
                }
            }
        }

        let value = producer().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Some(remote) = &self.remote {
                    if let Err(e) = remote.set(key, &raw, ttl).await {
                        tracing::warn!(key, error = %e, "remote cache write failed");
                    }
                }
                self.local.insert(key, raw, ttl);
            }
            Err(e) => tracing::warn!(key, error = %e, "value not cacheable, serving uncached"),
        }

        Ok(value)
    }

    /// Drop expired in-process entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.local.sweep()
    }
}

/// Background task that periodically evicts expired in-process entries.
/// Bounds memory growth only; expired entries are never served regardless.
pub async fn sweep_loop(cache: Arc<ResponseCache>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;
        let removed = cache.sweep();
        if removed > 0 {
            tracing::debug!(removed, "swept expired cache entries");
        }
    }
}
