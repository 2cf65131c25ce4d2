//! Lock-free hit-rate counters.

use std::sync::atomic::{AtomicU64, Ordering};

use herd_core::constants::HIT_RATE_SCALE;

/// Counts organic lookups and the subset that missed the cache.
///
/// Each fetcher owns its own counters. A miss is only recorded after its
/// access was, so `misses <= total` outside of a racing [`HitRate::reset`].
#[derive(Debug, Default)]
pub struct HitRate {
    total: AtomicU64,
    misses: AtomicU64,
}

impl HitRate {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one lookup.
    pub fn record_access(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one lookup that had to go to the data source.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns `(total, misses)`.
    pub fn counts(&self) -> (u64, u64) {
        let misses = self.misses.load(Ordering::Relaxed);
        let total = self.total.load(Ordering::Relaxed);
        (total, misses)
    }

    /// Hit rate as a percentage, 0 when nothing was recorded.
    pub fn rate(&self) -> f64 {
        let (total, misses) = self.counts();
        percentage(total, misses)
    }

    /// Zeroes both counters and returns the rate they held.
    ///
    /// The two swaps are individually atomic but not atomic together: an
    /// access racing with the reset may land in either epoch.
    pub fn reset(&self) -> f64 {
        let misses = self.misses.swap(0, Ordering::Relaxed);
        let total = self.total.swap(0, Ordering::Relaxed);
        percentage(total, misses)
    }
}

pub(crate) fn percentage(total: u64, misses: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    total.saturating_sub(misses) as f64 / total as f64 * HIT_RATE_SCALE
}
