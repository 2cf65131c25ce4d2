//! # herd core
//!
//! Core types, errors, and collaborator traits for the herd cache-aside layer.
//!
//! This crate provides the building blocks shared by the other herd crates:
//!
//! - **Types**: Key/value bounds, [`Ttl`], and [`Fetched`]
//! - **Errors**: [`HerdError`] and the crate-wide [`Result`] alias
//! - **Constants**: Default capacities and lifetimes
//! - **Traits**: [`DataSource`] and [`CacheStore`], the two external seams
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use herd_core::{Fetched, Ttl};
//!
//! let fetched = Fetched::new("value", Duration::from_secs(30));
//! assert_eq!(fetched.ttl, Ttl::After(Duration::from_secs(30)));
//! assert_eq!(Ttl::from_secs_signed(-1), Ttl::Never);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

pub use constants::*;
pub use error::{HerdError, Result, SharedError};
pub use traits::*;
pub use types::*;
