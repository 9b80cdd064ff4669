//! Short-lived cache of GET results keyed by request path and query.

use std::{
    collections::HashMap,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::ClientError;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

struct CachedQuery {
    value: serde_json::Value,
    expires_at: Instant,
}

pub struct QueryCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedQuery>>,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    generation: AtomicU64,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl QueryCache {
    /// A zero `ttl` turns caching off.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub async fn insert<T: Serialize>(&self, key: &str, value: &T) {
        if self.ttl.is_zero() {
            return;
        }
        let Ok(value) = serde_json::to_value(value) else {
            return;
        };
        self.entries.write().await.insert(
            key.to_string(),
            CachedQuery {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drops every entry whose key starts with `prefix`.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        debug!(prefix, dropped = before - entries.len(), "cache: invalidated");
    }

    pub async fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Serves `key` from the cache or runs `fetch`. Concurrent callers for
    /// the same key wait for the first fetch instead of issuing their own.
    /// A result fetched across an invalidation is returned but not stored.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, fetch: F) -> Result<T, ClientError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        if let Some(hit) = self.get(key).await {
            return Ok(hit);
        }

        let gate = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let result = {
            let _guard = gate.lock().await;
            if let Some(hit) = self.get(key).await {
                Ok(hit)
            } else {
                let generation = self.generation.load(Ordering::SeqCst);
                let fetched = fetch().await;
                if let Ok(value) = &fetched {
                    if self.generation.load(Ordering::SeqCst) == generation {
                        self.insert(key, value).await;
                    }
                }
                fetched
            }
        };

        let mut in_flight = self.in_flight.lock().await;
        if Arc::strong_count(&gate) <= 2 {
            in_flight.remove(key);
        }
        result
    }
}
