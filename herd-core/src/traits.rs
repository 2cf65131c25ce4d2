//! Collaborator traits for herd.
//!
//! The fetcher never talks to a database, a network service, or a cache
//! engine directly. It goes through these two seams, both of which must be
//! safe to call from many threads at once.

use std::time::Duration;

use crate::error::Result;
use crate::types::{CacheKey, CacheValue, Fetched, Ttl};

// ═══════════════════════════════════════════════════════════════════════════════
// DATA SOURCE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Authoritative (and usually slow) source of values.
///
/// Implemented by the embedding application. Implementations might wrap:
/// - A SQL or document database
/// - A remote HTTP or RPC service
/// - An expensive local computation
pub trait DataSource: Send + Sync {
    /// Key type understood by this source.
    type Key: CacheKey;
    /// Value type produced by this source.
    type Value: CacheValue;
    /// Failure type reported by this source.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Prepares the source. Called exactly once when the fetcher is built.
    ///
    /// A failure leaves the fetcher permanently disabled.
    fn init(&self) -> std::result::Result<(), Self::Error>;

    /// Reads the authoritative value for `key`.
    fn fetch(&self, key: &Self::Key) -> std::result::Result<Fetched<Self::Value>, Self::Error>;

    /// Writes `value` for `key` to the source.
    fn write(&self, key: &Self::Key, value: &Self::Value) -> std::result::Result<(), Self::Error>;

    /// Releases resources. Called once, best-effort, on teardown.
    fn teardown(&self);
}

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Fast local key-value store with expiry and prefix deletion.
///
/// Eviction policy, storage layout, and persistence are the store's own
/// business. Expired entries must read as absent.
pub trait CacheStore<K, V>: Send + Sync {
    /// Returns the live value for `key`, if any.
    fn get(&self, key: &K) -> Option<V>;

    /// Inserts or replaces `key`.
    fn put(&self, key: K, value: V, ttl: Ttl);

    /// Removes `key` immediately.
    fn delete(&self, key: &K) -> Result<()>;

    /// Removes `key` once `delay` has elapsed, and not before.
    fn delay_delete(&self, key: &K, delay: Duration) -> Result<()>;

    /// Returns true if a live entry exists for `key`.
    fn exists(&self, key: &K) -> bool;

    /// Removes every entry.
    fn clear_all(&self);

    /// Removes every entry whose key starts with `prefix`.
    fn clear_prefix(&self, prefix: &str);

    /// Releases resources. Called once, best-effort, on teardown.
    fn teardown(&self);
}

impl<K, V, S> CacheStore<K, V> for std::sync::Arc<S>
where
    S: CacheStore<K, V> + ?Sized,
{
    fn get(&self, key: &K) -> Option<V> {
        (**self).get(key)
    }

    fn put(&self, key: K, value: V, ttl: Ttl) {
        (**self).put(key, value, ttl)
    }

    fn delete(&self, key: &K) -> Result<()> {
        (**self).delete(key)
    }

    fn delay_delete(&self, key: &K, delay: Duration) -> Result<()> {
        (**self).delay_delete(key, delay)
    }

    fn exists(&self, key: &K) -> bool {
        (**self).exists(key)
    }

    fn clear_all(&self) {
        (**self).clear_all()
    }

    fn clear_prefix(&self, prefix: &str) {
        (**self).clear_prefix(prefix)
    }

    fn teardown(&self) {
        (**self).teardown()
    }
}

impl<D> DataSource for std::sync::Arc<D>
where
    D: DataSource + ?Sized,
{
    type Key = D::Key;
    type Value = D::Value;
    type Error = D::Error;

    fn init(&self) -> std::result::Result<(), Self::Error> {
        (**self).init()
    }

    fn fetch(&self, key: &Self::Key) -> std::result::Result<Fetched<Self::Value>, Self::Error> {
        (**self).fetch(key)
    }

    fn write(&self, key: &Self::Key, value: &Self::Value) -> std::result::Result<(), Self::Error> {
        (**self).write(key, value)
    }

    fn teardown(&self) {
        (**self).teardown()
    }
}
