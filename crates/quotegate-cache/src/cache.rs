//! Expiring cache with FIFO eviction.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use quotegate_types::clock::{SharedClock, system_clock};
use quotegate_types::config::HasCacheConfig;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::CacheConfig;

/// Entry stored in the cache.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    /// `None` when the TTL reaches past what an `Instant` can represent.
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_live_at(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

/// Bounded key-value cache with per-entry expiry.
///
/// Entries are ordered by the time they were last `set`. Reads never
/// change that order: the underlying [`LruCache`] is only touched through
/// `peek`, so eviction drops the entry that was set longest ago rather
/// than the one read longest ago.
///
/// Expired entries stay in memory until a `get` observes them, a `set`
/// overwrites them, or [`purge_expired`](Self::purge_expired) runs.
pub struct ExpiringCache<V> {
    entries: Arc<Mutex<LruCache<String, CacheEntry<V>>>>,
    clock: SharedClock,
    config: CacheConfig,
}

impl<V> ExpiringCache<V> {
    /// Create a cache on the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, system_clock())
    }

    /// Create a cache from any cache capability provider.
    pub fn from_provider<C: HasCacheConfig>(provider: &C) -> Self {
        Self::new(CacheConfig::from_provider(provider))
    }

    /// Create a cache driven by an explicit clock.
    ///
    /// A `max_size` of zero is treated as one.
    pub fn with_clock(config: CacheConfig, clock: SharedClock) -> Self {
        let cap = NonZeroUsize::new(config.max_size).unwrap_or(NonZeroUsize::MIN);

        Self {
            entries: Arc::new(Mutex::new(LruCache::new(cap))),
            clock,
            config,
        }
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Number of stored entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Whether a live entry exists for `key`. Does not remove expired entries.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .lock()
            .peek(key)
            .is_some_and(|entry| entry.is_live_at(now))
    }

    /// Store `value` under `key` with the default TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.config.default_ttl);
    }

    /// Store `value` under `key`, expiring after `ttl`.
    ///
    /// A zero `ttl` means the default TTL. A TTL too large to add to the
    /// current instant never expires.
    ///
    /// When the cache is full and `key` is new, the entry set longest ago
    /// is evicted first, whether or not it has expired. Re-setting an
    /// existing key never evicts and moves it to the back of the queue.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let ttl = if ttl.is_zero() {
            self.config.default_ttl
        } else {
            ttl
        };
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        if !entries.contains(&key)
            && entries.len() >= entries.cap().get()
            && let Some((evicted, _)) = entries.pop_lru()
        {
            debug!(key = %evicted, "Evicting oldest cache entry to make room");
        }

        entries.put(
            key.clone(),
            CacheEntry {
                value,
                expires_at: now.checked_add(ttl),
            },
        );

        trace!(
            key = %key,
            ttl_ms = ttl.as_millis() as u64,
            cache_size = entries.len(),
            "Cache entry stored"
        );
    }

    /// Remove `key` if present.
    pub fn delete(&self, key: &str) {
        if self.entries.lock().pop(key).is_some() {
            trace!(key = %key, "Cache entry deleted");
        }
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        debug!(count = count, "Cache cleared");
    }

    /// Remove every expired entry and return how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_live_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key);
        }

        if !expired.is_empty() {
            debug!(count = expired.len(), "Purged expired cache entries");
        }

        expired.len()
    }
}

impl<V: Clone> ExpiringCache<V> {
    /// Get a live value.
    ///
    /// An entry whose expiry has passed is removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let entry = entries.peek(key)?;
        if entry.is_live_at(now) {
            trace!(key = %key, "Cache hit");
            return Some(entry.value.clone());
        }

        entries.pop(key);
        debug!(key = %key, "Cache entry expired, removing");
        None
    }

    /// Return the live value for `key`, or compute, store and return a new one.
    ///
    /// The lock is released while `compute` runs, so concurrent callers
    /// that miss at the same time may each compute; the last one stored wins.
    pub fn get_or_insert_with<F>(&self, key: &str, ttl: Option<Duration>, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(key) {
            return value;
        }

        let value = compute();
        self.set_with_ttl(
            key,
            value.clone(),
            ttl.unwrap_or(self.config.default_ttl),
        );
        value
    }

    /// Fallible form of [`get_or_insert_with`](Self::get_or_insert_with).
    /// Errors are returned as-is and nothing is cached.
    pub fn try_get_or_insert_with<F, E>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = compute()?;
        self.set_with_ttl(
            key,
            value.clone(),
            ttl.unwrap_or(self.config.default_ttl),
        );
        Ok(value)
    }
}

impl<V: Serialize + fmt::Debug> ExpiringCache<V> {
    /// Get cache statistics.
    ///
    /// `memory_estimate` is the JSON-encoded size of every stored value.
    /// A value that cannot be encoded is measured by its `Debug` output.
    pub fn get_stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.entries.lock();

        let mut active_entries = 0;
        let mut memory_estimate = 0;
        for (_, entry) in entries.iter() {
            if entry.is_live_at(now) {
                active_entries += 1;
            }
            memory_estimate += estimated_size(&entry.value);
        }

        CacheStats {
            total_entries: entries.len(),
            active_entries,
            memory_estimate,
            max_size: entries.cap().get(),
        }
    }
}

fn estimated_size<V: Serialize + fmt::Debug>(value: &V) -> usize {
    match serde_json::to_vec(value) {
        Ok(bytes) => bytes.len(),
        Err(e) => {
            trace!(error = %e, "Value not serializable, estimating from Debug output");
            format!("{value:?}").len()
        }
    }
}

impl<V> Clone for ExpiringCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl<V> fmt::Debug for ExpiringCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("config", &self.config)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Stored entries, including expired ones not yet removed.
    pub total_entries: usize,

    /// Entries that have not expired.
    pub active_entries: usize,

    /// Approximate size of all stored values in bytes.
    pub memory_estimate: usize,

    /// Entry ceiling.
    pub max_size: usize,
}
