//! In-memory cache store for herd.
//!
//! Thread-safe LRU store with per-entry expiry, delayed deletion, and prefix
//! clearing. Implements [`herd_core::CacheStore`] for any string-like key.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cache;

pub use cache::{MemoryStore, StoreConfig, StoreStats};
