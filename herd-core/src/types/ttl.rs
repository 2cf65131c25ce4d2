//! Entry expiry.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long a cache store should keep an entry.
///
/// The exact meaning of [`Ttl::Default`] is store-defined; stores shipped
/// with herd map it to their configured default TTL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ttl {
    /// Use the store's configured default.
    #[default]
    Default,
    /// Never expires.
    Never,
    /// Expires once the duration has elapsed since insertion.
    After(Duration),
}

impl Ttl {
    /// Builds a TTL from signed seconds: negative never expires, zero uses
    /// the store default.
    pub fn from_secs_signed(secs: i64) -> Self {
        match secs {
            s if s < 0 => Ttl::Never,
            0 => Ttl::Default,
            s => Ttl::After(Duration::from_secs(s as u64)),
        }
    }

    /// Builds a TTL from signed milliseconds, same rules as [`Ttl::from_secs_signed`].
    pub fn from_millis_signed(millis: i64) -> Self {
        match millis {
            m if m < 0 => Ttl::Never,
            0 => Ttl::Default,
            m => Ttl::After(Duration::from_millis(m as u64)),
        }
    }

    /// Resolves to a concrete lifetime, `None` meaning no expiry.
    pub fn resolve(self, default: Duration) -> Option<Duration> {
        match self {
            Ttl::Default => Some(default),
            Ttl::Never => None,
            Ttl::After(d) => Some(d),
        }
    }
}

impl From<Duration> for Ttl {
    fn from(d: Duration) -> Self {
        Ttl::After(d)
    }
}

/// A value returned by a data source together with its requested expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fetched<V> {
    /// The authoritative value.
    pub value: V,
    /// Expiry to apply when the value is cached.
    pub ttl: Ttl,
}

impl<V> Fetched<V> {
    /// Wraps a value with an explicit TTL.
    pub fn new(value: V, ttl: impl Into<Ttl>) -> Self {
        Self {
            value,
            ttl: ttl.into(),
        }
    }

    /// Wraps a value that should never expire.
    pub fn forever(value: V) -> Self {
        Self::new(value, Ttl::Never)
    }
}
