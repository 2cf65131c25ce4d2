//! Domain types for herd.
//!
//! - [`CacheKey`]: bound satisfied by every key type the fetcher accepts
//! - [`Ttl`]: expiry requested for a cached entry
//! - [`Fetched`]: value plus expiry returned by a data source

mod key;
mod ttl;

pub use key::*;
pub use ttl::*;
