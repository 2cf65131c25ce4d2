//! Request-coalescing cache-aside fetcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use herd_cache::{MemoryStore, StoreConfig};
use herd_core::error::{HerdError, Result};
use herd_core::traits::{CacheStore, DataSource};
use herd_core::types::{Fetched, Ttl};

use crate::config::FetcherConfig;
use crate::hit_rate::{percentage, HitRate};
use crate::inflight::{Claim, InFlight};

/// Snapshot of a fetcher's counters.
#[derive(Clone, Debug, Serialize)]
pub struct FetchStats {
    /// Fetcher name
    pub name: String,
    /// Organic lookups through `get`
    pub total: u64,
    /// Lookups that went to the data source
    pub misses: u64,
    /// Lookups answered by the store
    pub hits: u64,
    /// Hit rate as a percentage
    pub hit_rate: f64,
    /// Keys with a fetch currently running
    pub in_flight: usize,
}

/// Cache-aside access layer in front of a [`DataSource`].
///
/// On a store miss, exactly one caller per key runs the data source fetch;
/// concurrent callers for the same key block until it finishes and receive
/// the identical result. Callers for other keys are never blocked.
///
/// Coalescing is best-effort across waves: a caller that misses the store
/// just before the leader's `put` lands can start one more fetch.
///
/// # Thread Safety
///
/// All operations take `&self`; share the fetcher behind an `Arc`.
pub struct Fetcher<S, C>
where
    S: DataSource,
    C: CacheStore<S::Key, S::Value>,
{
    config: FetcherConfig,
    source: S,
    store: C,
    in_flight: InFlight<S::Key, S::Value>,
    counters: HitRate,
    enabled: AtomicBool,
    destroyed: AtomicBool,
}

impl<S, C> Fetcher<S, C>
where
    S: DataSource,
    C: CacheStore<S::Key, S::Value>,
{
    /// Creates a fetcher with default configuration.
    ///
    /// The source's `init` runs here; if it fails the fetcher starts
    /// disabled and every operation returns [`HerdError::Destroyed`].
    pub fn new(source: S, store: C) -> Self {
        Self::build(FetcherConfig::default(), source, store)
    }

    /// Creates a fetcher with custom configuration.
    pub fn with_config(config: FetcherConfig, source: S, store: C) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, source, store))
    }

    fn build(config: FetcherConfig, source: S, store: C) -> Self {
        let enabled = match source.init() {
            Ok(()) => {
                info!(fetcher = %config.name, wait_timeout = ?config.wait_timeout(), "Fetcher created");
                true
            }
            Err(e) => {
                warn!(fetcher = %config.name, error = %e, "Data source init failed, fetcher disabled");
                false
            }
        };

        Self {
            config,
            source,
            store,
            in_flight: InFlight::new(),
            counters: HitRate::new(),
            enabled: AtomicBool::new(enabled),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Returns the fetcher name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Returns the cache store.
    pub fn store(&self) -> &C {
        &self.store
    }

    /// Returns the data source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns true until [`Fetcher::destroy`] runs (or if init failed).
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    fn ensure_enabled(&self) -> Result<()> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(HerdError::Destroyed)
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // READ PATH
    // ═══════════════════════════════════════════════════════════════════════════

    /// Returns the value for `key`, fetching it from the source on a miss.
    ///
    /// Waits on another caller's fetch for at most the configured
    /// `wait_timeout`, or indefinitely when none is set.
    pub fn get(&self, key: &S::Key) -> Result<S::Value> {
        self.get_inner(key, self.config.wait_timeout())
    }

    /// Like [`Fetcher::get`], but gives up waiting on another caller's
    /// fetch after `timeout`.
    ///
    /// Only followers time out. A caller that runs the fetch itself always
    /// waits for it, so the key is released for everyone.
    pub fn get_timeout(&self, key: &S::Key, timeout: Duration) -> Result<S::Value> {
        self.get_inner(key, Some(timeout))
    }

    #[instrument(level = "debug", skip_all, fields(fetcher = %self.config.name, key = ?key))]
    fn get_inner(&self, key: &S::Key, timeout: Option<Duration>) -> Result<S::Value> {
        self.ensure_enabled()?;
        self.counters.record_access();

        if let Some(value) = self.store.get(key) {
            return Ok(value);
        }

        match self.in_flight.claim(key) {
            Claim::Leader(guard) => {
                self.counters.record_miss();
                debug!("Cache miss, fetching from source");
                let result = self.load(key);
                guard.complete(&result);
                result
            }
            Claim::Follower(pending) => {
                debug!("Fetch already in flight, waiting");
                match timeout {
                    Some(timeout) => pending.wait_timeout(timeout),
                    None => pending.wait(),
                }
            }
        }
    }

    /// Fetches from the source and caches a successful result.
    fn load(&self, key: &S::Key) -> Result<S::Value> {
        match self.source.fetch(key) {
            Ok(Fetched { value, ttl }) => {
                self.store.put(key.clone(), value.clone(), ttl);
                Ok(value)
            }
            Err(e) => {
                debug!(error = %e, "Source fetch failed");
                Err(HerdError::from_source(e))
            }
        }
    }

    /// Re-reads `key` from the source and overwrites the cached entry.
    ///
    /// Skips the store and the in-flight registry; concurrent refreshes of
    /// one key each reach the source. Hit-rate counters are not touched.
    ///
    /// Whatever the source returns is cached, so with `V = Option<T>` a
    /// `None` replaces a good cached `Some`.
    #[instrument(level = "debug", skip_all, fields(fetcher = %self.config.name, key = ?key))]
    pub fn refresh(&self, key: &S::Key) -> Result<S::Value> {
        self.ensure_enabled()?;
        debug!("Forced refresh");
        self.load(key)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // WRITE PATH
    // ═══════════════════════════════════════════════════════════════════════════

    /// Writes `value` to the source.
    ///
    /// When the source rejects the write, the cached entry for `key` is
    /// evicted. A successful write leaves the store untouched.
    #[instrument(level = "debug", skip_all, fields(fetcher = %self.config.name, key = ?key))]
    pub fn write(&self, key: &S::Key, value: &S::Value) -> Result<()> {
        self.ensure_enabled()?;

        if let Err(e) = self.source.write(key, value) {
            warn!(error = %e, "Source write failed, evicting cached entry");
            if let Err(evict_err) = self.store.delete(key) {
                warn!(error = %evict_err, "Eviction after failed write also failed");
            }
            return Err(HerdError::from_source(e));
        }
        Ok(())
    }

    /// Stores `value` locally without touching the source.
    pub fn set_local(&self, key: S::Key, value: S::Value, ttl: Ttl) -> Result<()> {
        self.ensure_enabled()?;
        self.store.put(key, value, ttl);
        Ok(())
    }

    /// Removes `key` from the store now.
    pub fn delete(&self, key: &S::Key) -> Result<()> {
        self.ensure_enabled()?;
        self.store.delete(key)
    }

    /// Removes `key` from the store once `delay` has elapsed.
    pub fn delete_after(&self, key: &S::Key, delay: Duration) -> Result<()> {
        self.ensure_enabled()?;
        self.store.delay_delete(key, delay)
    }

    /// Returns true if the store holds a live entry for `key`.
    pub fn exists(&self, key: &S::Key) -> Result<bool> {
        self.ensure_enabled()?;
        Ok(self.store.exists(key))
    }

    /// Empties the store.
    pub fn clear_all(&self) -> Result<()> {
        self.ensure_enabled()?;
        self.store.clear_all();
        Ok(())
    }

    /// Removes every stored key starting with `prefix`.
    pub fn clear_prefix(&self, prefix: &str) -> Result<()> {
        self.ensure_enabled()?;
        self.store.clear_prefix(prefix);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STATISTICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Percentage of `get` calls answered by the store.
    pub fn hit_rate(&self) -> f64 {
        self.counters.rate()
    }

    /// Zeroes the counters and returns the rate they held.
    pub fn reset_hit_rate(&self) -> f64 {
        let rate = self.counters.reset();
        debug!(fetcher = %self.config.name, rate, "Hit rate reset");
        rate
    }

    /// Number of keys with a fetch currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> FetchStats {
        let (total, misses) = self.counters.counts();
        let hits = total.saturating_sub(misses);
        FetchStats {
            name: self.config.name.clone(),
            total,
            misses,
            hits,
            hit_rate: percentage(total, misses),
            in_flight: self.in_flight(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Disables the fetcher and tears down the store and the source.
    ///
    /// Later calls fail with [`HerdError::Destroyed`]. Fetches already
    /// running are not interrupted and may still write to the torn-down
    /// store. Calling it again does nothing.
    pub fn destroy(&self) {
        self.enabled.store(false, Ordering::Release);
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.store.teardown();
        self.source.teardown();
        info!(fetcher = %self.config.name, "Fetcher destroyed");
    }
}

/// A fetcher backed by the bundled in-memory store.
pub type MemoryFetcher<S> =
    Fetcher<S, MemoryStore<<S as DataSource>::Key, <S as DataSource>::Value>>;

impl<S> Fetcher<S, MemoryStore<S::Key, S::Value>>
where
    S: DataSource,
    S::Key: AsRef<str>,
{
    /// Creates a fetcher over a fresh [`MemoryStore`].
    pub fn with_memory_store(
        config: FetcherConfig,
        store_config: StoreConfig,
        source: S,
    ) -> Result<Self> {
        Self::with_config(config, source, MemoryStore::with_config(store_config))
    }
}
