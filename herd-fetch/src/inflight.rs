//! In-flight fetch registry.
//!
//! Tracks, per key, whether a fetch is running and lets later callers block
//! until it finishes. The registry lock covers map lookups, inserts, and
//! removals only; it is never held while a fetch runs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tracing::warn;

use herd_core::constants::IN_FLIGHT_INITIAL_CAPACITY;
use herd_core::error::{HerdError, Result};
use herd_core::types::{CacheKey, CacheValue};

/// Reported to waiters whose leader unwound before producing a result.
#[derive(Debug, Error)]
#[error("in-flight fetch for key {key} was abandoned")]
pub struct AbandonedFetch {
    /// Debug rendering of the key.
    pub key: String,
}

/// One running fetch, observable by any number of waiters.
///
/// The slot is written exactly once; every waiter clones the same result.
pub struct Pending<V> {
    slot: Mutex<Option<Result<V>>>,
    done: Condvar,
}

impl<V: CacheValue> Pending<V> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn fire(&self, result: Result<V>) {
        let mut slot = self.slot.lock();
        *slot = Some(result);
        drop(slot);
        self.done.notify_all();
    }

    /// Returns true once the fetch has produced a result.
    pub fn is_done(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Blocks until the fetch completes.
    pub fn wait(&self) -> Result<V> {
        let mut slot = self.slot.lock();
        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            self.done.wait(&mut slot);
        }
    }

    /// Blocks until the fetch completes or `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<V> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.wait();
        };
        let mut slot = self.slot.lock();
        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            if self.done.wait_until(&mut slot, deadline).timed_out() {
                return slot
                    .as_ref()
                    .cloned()
                    .unwrap_or(Err(HerdError::WaitTimeout(timeout)));
            }
        }
    }
}

/// Outcome of registering interest in a key.
pub enum Claim<'a, K: CacheKey, V: CacheValue> {
    /// No fetch was running; the caller must perform it.
    Leader(LeaderGuard<'a, K, V>),
    /// A fetch is already running; wait on it.
    Follower(Arc<Pending<V>>),
}

/// Registry of running fetches keyed by cache key.
pub struct InFlight<K, V> {
    pending: Mutex<HashMap<K, Arc<Pending<V>>>>,
}

impl<K: CacheKey, V: CacheValue> InFlight<K, V> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::with_capacity(IN_FLIGHT_INITIAL_CAPACITY)),
        }
    }

    /// Joins the running fetch for `key`, or registers a new one.
    pub fn claim(&self, key: &K) -> Claim<'_, K, V> {
        let mut pending = self.pending.lock();
        if let Some(existing) = pending.get(key) {
            return Claim::Follower(Arc::clone(existing));
        }
        let entry = Arc::new(Pending::new());
        pending.insert(key.clone(), Arc::clone(&entry));
        Claim::Leader(LeaderGuard {
            registry: self,
            key: key.clone(),
            pending: entry,
            completed: false,
        })
    }

    /// Number of keys with a running fetch.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Returns true if no fetch is running.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Returns true if a fetch for `key` is running.
    pub fn contains(&self, key: &K) -> bool {
        self.pending.lock().contains_key(key)
    }

    fn release(&self, key: &K, entry: &Arc<Pending<V>>) {
        let mut pending = self.pending.lock();
        if pending.get(key).is_some_and(|e| Arc::ptr_eq(e, entry)) {
            pending.remove(key);
        }
    }
}

impl<K: CacheKey, V: CacheValue> Default for InFlight<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Held by the caller that performs a fetch.
///
/// Completing the guard removes the registry entry and then wakes every
/// waiter. Dropping it uncompleted (the fetch panicked) does the same with
/// an [`AbandonedFetch`] error, so waiters are never stranded.
pub struct LeaderGuard<'a, K: CacheKey, V: CacheValue> {
    registry: &'a InFlight<K, V>,
    key: K,
    pending: Arc<Pending<V>>,
    completed: bool,
}

impl<K: CacheKey, V: CacheValue> LeaderGuard<'_, K, V> {
    /// Publishes `result` to every waiter.
    pub fn complete(mut self, result: &Result<V>) {
        self.finish(result.clone());
    }

    fn finish(&mut self, result: Result<V>) {
        if self.completed {
            return;
        }
        self.completed = true;
        // Entry goes first so a late caller starts a fresh fetch instead of
        // joining one that already finished.
        self.registry.release(&self.key, &self.pending);
        self.pending.fire(result);
    }
}

impl<K: CacheKey, V: CacheValue> Drop for LeaderGuard<'_, K, V> {
    fn drop(&mut self) {
        if !self.completed {
            warn!(key = ?self.key, "In-flight fetch abandoned, releasing waiters");
            let err = HerdError::from_source(AbandonedFetch {
                key: format!("{:?}", self.key),
            });
            self.finish(Err(err));
        }
    }
}
