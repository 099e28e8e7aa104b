//! Time-expiring key/value cache.
//!
//! Entries expire a fixed time after insertion and are never invalidated
//! explicitly. Expired entries are invisible to `get` immediately; memory is
//! reclaimed by `purge_expired`, usually from a background sweeper.

use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::RwLock, task::JoinHandle, time::Instant};

/// Default entry lifetime
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Default interval between sweeps of expired entries
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Cache capability injected into components that memoize remote lookups
#[async_trait]
pub trait ExpiringCache<V>: Send + Sync {
    /// Live value for `key`, if any
    async fn get(&self, key: &str) -> Option<V>;

    /// Store `value` under `key`, replacing any previous entry and resetting its lifetime
    async fn insert(&self, key: String, value: V);

    /// Drop expired entries and return how many were removed
    async fn purge_expired(&self) -> usize;
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// In-process cache with a single TTL for every entry
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Spawn a task purging expired entries every `interval`.
    ///
    /// The task holds a strong reference; abort the returned handle to stop it.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.purge_expired().await;
                if removed > 0 {
                    log::debug!("Purged {removed} expired cache entries");
                }
            }
        })
    }
}

impl<V: Clone + Send + Sync + 'static> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[async_trait]
impl<V: Clone + Send + Sync + 'static> ExpiringCache<V> for TtlCache<V> {
    async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    async fn insert(&self, key: String, value: V) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.write().await.insert(key, entry);
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }
}
