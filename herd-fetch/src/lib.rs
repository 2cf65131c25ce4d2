//! # herd fetch
//!
//! Request-coalescing cache-aside access layer.
//!
//! A [`Fetcher`] sits between callers, a fast [`CacheStore`], and a slow
//! [`DataSource`]. On a cache miss only one caller per key reaches the
//! source; everyone else asking for that key waits for, and shares, its
//! result.
//!
//! ## Features
//!
//! - **Coalescing**: at most one running fetch per key
//! - **Write-through with invalidation**: failed writes evict the cached entry
//! - **Hit-rate tracking**: lock-free counters with reset
//! - **Bounded waits**: optional timeout for callers joining a running fetch
//!
//! ## Example
//!
//! ```rust,ignore
//! use herd_fetch::{Fetcher, FetcherConfig};
//! use herd_cache::StoreConfig;
//!
//! let fetcher = Fetcher::with_memory_store(
//!     FetcherConfig::new("users"),
//!     StoreConfig::default(),
//!     UserTable::connect(url),
//! )?;
//!
//! // First call reaches the table; concurrent callers share it.
//! let user = fetcher.get(&"user:42".to_string())?;
//! println!("hit rate: {:.2}%", fetcher.hit_rate());
//! ```
//!
//! [`CacheStore`]: herd_core::CacheStore
//! [`DataSource`]: herd_core::DataSource

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod config;
mod fetcher;
mod hit_rate;
pub mod inflight;

#[cfg(test)]
mod testing;

pub use config::FetcherConfig;
pub use fetcher::{FetchStats, Fetcher, MemoryFetcher};
pub use hit_rate::HitRate;
pub use inflight::AbandonedFetch;

// Re-export the collaborator seams from core
pub use herd_core::{CacheStore, DataSource, Fetched, HerdError, Result, Ttl};
