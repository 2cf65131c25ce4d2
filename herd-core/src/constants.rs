//! Default tuning values shared by the herd crates.

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE STORE DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default capacity of the in-memory store.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Default time-to-live applied to entries stored with [`Ttl::Default`].
///
/// [`Ttl::Default`]: crate::types::Ttl::Default
pub const DEFAULT_TTL_SECONDS: u64 = 3600;

// ═══════════════════════════════════════════════════════════════════════════════
// FETCHER DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Name given to a fetcher constructed without an explicit one.
pub const DEFAULT_FETCHER_NAME: &str = "herd";

/// Initial capacity of the in-flight registry.
pub const IN_FLIGHT_INITIAL_CAPACITY: usize = 64;

/// Scale factor for reported hit rates (percent).
pub const HIT_RATE_SCALE: f64 = 100.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_usable() {
        assert!(DEFAULT_MAX_ENTRIES > 0);
        assert!(DEFAULT_TTL_SECONDS > 0);
        assert!(!DEFAULT_FETCHER_NAME.is_empty());
    }
}
