//! Error types for herd.
//!
//! Every public operation of the fetcher returns [`Result`]. Errors are
//! `Clone` so that a single failed fetch can be handed, unchanged, to every
//! caller that was waiting on it.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using `HerdError`.
pub type Result<T> = std::result::Result<T, HerdError>;

/// An adapter error shared between all waiters of one fetch.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for all herd operations.
#[derive(Debug, Clone, Error)]
pub enum HerdError {
    // ═══════════════════════════════════════════════════════════════════════════
    // LIFECYCLE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The fetcher was torn down, or its data source failed to initialize.
    #[error("fetcher has been destroyed")]
    Destroyed,

    // ═══════════════════════════════════════════════════════════════════════════
    // COLLABORATOR ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The data source failed a fetch or a write.
    #[error("data source error: {0}")]
    Source(#[source] SharedError),

    /// The cache store rejected an operation.
    #[error("cache store error: {0}")]
    Store(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // CALLER ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Gave up waiting on another caller's in-flight fetch.
    #[error("timed out after {0:?} waiting for in-flight fetch")]
    WaitTimeout(Duration),

    /// Configuration rejected at construction.
    #[error("configuration error: {0}")]
    Config(String),
}

impl HerdError {
    /// Wraps an adapter error.
    pub fn from_source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HerdError::Source(Arc::new(err))
    }

    /// Returns true if a caller may reasonably retry the operation.
    ///
    /// Nothing in herd retries on its own.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, HerdError::Source(_) | HerdError::WaitTimeout(_))
    }

    /// Returns true if the fetcher is no longer usable.
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(self, HerdError::Destroyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::fmt;

    #[derive(Debug)]
    struct Unreachable;

    impl fmt::Display for Unreachable {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("backend unreachable")
        }
    }

    impl std::error::Error for Unreachable {}

    #[test]
    fn test_error_display() {
        let err = HerdError::from_source(Unreachable);
        assert_eq!(err.to_string(), "data source error: backend unreachable");

        let err = HerdError::WaitTimeout(Duration::from_millis(250));
        assert!(err.to_string().contains("250ms"));
    }

    #[test]
    fn test_source_chain_preserved() {
        let err = HerdError::from_source(Unreachable);
        let inner = err.source().expect("source error should be chained");
        assert_eq!(inner.to_string(), "backend unreachable");
    }

    #[test]
    fn test_clone_shares_adapter_error() {
        let err = HerdError::from_source(Unreachable);
        let copy = err.clone();
        match (err, copy) {
            (HerdError::Source(a), HerdError::Source(b)) => assert!(Arc::ptr_eq(&a, &b)),
            other => panic!("unexpected variants: {other:?}"),
        }
    }

    #[test]
    fn test_error_classification() {
        assert!(HerdError::from_source(Unreachable).is_recoverable());
        assert!(HerdError::WaitTimeout(Duration::from_secs(1)).is_recoverable());
        assert!(!HerdError::Destroyed.is_recoverable());
        assert!(!HerdError::Store("closed".into()).is_recoverable());

        assert!(HerdError::Destroyed.is_lifecycle_error());
        assert!(!HerdError::Config("empty name".into()).is_lifecycle_error());
    }
}
