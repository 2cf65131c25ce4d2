//! In-memory LRU cache with per-entry expiry.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use herd_core::constants::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL_SECONDS};
use herd_core::error::{HerdError, Result};
use herd_core::traits::CacheStore;
use herd_core::types::{CacheKey, CacheValue, Ttl};

/// Cache entry with an optional deadline.
#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of entries (0 = unbounded)
    pub max_entries: usize,
    /// TTL in seconds applied to entries stored with `Ttl::Default`
    pub default_ttl_seconds: u64,
    /// Whether to drop expired entries before evicting live ones
    pub auto_cleanup: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
            auto_cleanup: true,
        }
    }
}

impl StoreConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the capacity.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Sets the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_seconds = ttl.as_secs();
        self
    }

    /// Enables or disables cleanup of expired entries at capacity.
    pub fn with_auto_cleanup(mut self, enabled: bool) -> Self {
        self.auto_cleanup = enabled;
        self
    }

    fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}

/// Thread-safe in-memory store.
///
/// Bounded by least-recently-used eviction; expired entries read as absent
/// and are dropped lazily on access, at capacity (with `auto_cleanup`), or
/// by [`MemoryStore::cleanup_expired`].
pub struct MemoryStore<K, V>
where
    K: Hash + Eq,
{
    entries: Mutex<LruCache<K, CacheEntry<V>>>,
    config: StoreConfig,
    evictions: AtomicU64,
    closed: AtomicBool,
}

impl<K, V> MemoryStore<K, V>
where
    K: CacheKey,
    V: CacheValue,
{
    /// Creates a store with default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates a store with custom configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        let entries = match NonZeroUsize::new(config.max_entries) {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };
        Self {
            entries: Mutex::new(entries),
            config,
            evictions: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns true once [`CacheStore::teardown`] has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Removes all expired entries, returning how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        Self::purge_expired(&mut entries, Instant::now())
    }

    fn purge_expired(entries: &mut LruCache<K, CacheEntry<V>>, now: Instant) -> usize {
        let expired: Vec<K> = entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        let entries = self.entries.lock();
        let now = Instant::now();
        let expired = entries.iter().filter(|(_, e)| e.is_expired(now)).count();
        StoreStats {
            total_entries: entries.len(),
            expired_entries: expired,
            valid_entries: entries.len().saturating_sub(expired),
            capacity: self.config.max_entries,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Returns how long ago `key` was stored, if it is live.
    pub fn age(&self, key: &K) -> Option<Duration> {
        let entries = self.entries.lock();
        let now = Instant::now();
        entries
            .peek(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| now.saturating_duration_since(e.inserted_at))
    }
}

impl<K, V> Default for MemoryStore<K, V>
where
    K: CacheKey,
    V: CacheValue,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CacheStore<K, V> for MemoryStore<K, V>
where
    K: CacheKey + AsRef<str>,
    V: CacheValue,
{
    fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        let expired = match entries.get(key) {
            Some(e) if !e.is_expired(now) => return Some(e.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        None
    }

    fn put(&self, key: K, value: V, ttl: Ttl) {
        if self.is_closed() {
            debug!(?key, "Ignoring put on closed store");
            return;
        }

        let now = Instant::now();
        // A deadline past the end of `Instant` never arrives.
        let expires_at = ttl
            .resolve(self.config.default_ttl())
            .and_then(|ttl| now.checked_add(ttl));

        let mut entries = self.entries.lock();

        if self.config.auto_cleanup
            && !entries.contains(&key)
            && entries.len() >= entries.cap().get()
        {
            Self::purge_expired(&mut entries, now);
        }

        let entry = CacheEntry {
            value,
            inserted_at: now,
            expires_at,
        };
        if let Some((evicted, _)) = entries.push(key.clone(), entry) {
            if evicted != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(?evicted, "Evicted least recently used entry");
            }
        }
    }

    fn delete(&self, key: &K) -> Result<()> {
        if self.is_closed() {
            return Err(HerdError::Store("store has been torn down".into()));
        }
        self.entries.lock().pop(key);
        Ok(())
    }

    fn delay_delete(&self, key: &K, delay: Duration) -> Result<()> {
        if self.is_closed() {
            return Err(HerdError::Store("store has been torn down".into()));
        }
        let deadline = Instant::now()
            .checked_add(delay)
            .ok_or_else(|| HerdError::Store(format!("delay {delay:?} out of range")))?;

        let mut entries = self.entries.lock();
        if let Some(entry) = entries.peek_mut(key) {
            entry.expires_at = Some(match entry.expires_at {
                Some(current) => current.min(deadline),
                None => deadline,
            });
        }
        Ok(())
    }

    fn exists(&self, key: &K) -> bool {
        let entries = self.entries.lock();
        entries
            .peek(key)
            .is_some_and(|e| !e.is_expired(Instant::now()))
    }

    fn clear_all(&self) {
        self.entries.lock().clear();
    }

    fn clear_prefix(&self, prefix: &str) {
        let mut entries = self.entries.lock();
        let matching: Vec<K> = entries
            .iter()
            .filter(|(k, _)| k.as_ref().starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &matching {
            entries.pop(key);
        }
        debug!(prefix, removed = matching.len(), "Cleared keys by prefix");
    }

    fn teardown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut entries = self.entries.lock();
        let dropped = entries.len();
        entries.clear();
        info!(dropped, "Memory store torn down");
    }
}

/// Store statistics.
#[derive(Clone, Debug, Serialize)]
pub struct StoreStats {
    /// Total entries (including expired)
    pub total_entries: usize,
    /// Expired entries not yet dropped
    pub expired_entries: usize,
    /// Valid (non-expired) entries
    pub valid_entries: usize,
    /// Configured capacity (0 = unbounded)
    pub capacity: usize,
    /// Live entries evicted to make room
    pub evictions: u64,
}
