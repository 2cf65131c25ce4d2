//! Key and value bounds.

use std::fmt::Debug;
use std::hash::Hash;

/// Bound for cache keys.
///
/// Keys are opaque to the fetcher: it only compares, hashes, and clones
/// them. Implemented automatically for every qualifying type.
pub trait CacheKey: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T> CacheKey for T where T: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

/// Bound for cached values.
///
/// Values are cloned once per waiter when an in-flight fetch completes.
pub trait CacheValue: Clone + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_key<K: CacheKey>() {}
    fn assert_value<V: CacheValue>() {}

    #[test]
    fn test_common_types_qualify() {
        assert_key::<String>();
        assert_key::<u64>();
        assert_key::<(String, u32)>();
        assert_value::<Vec<u8>>();
        assert_value::<std::sync::Arc<str>>();
    }
}
