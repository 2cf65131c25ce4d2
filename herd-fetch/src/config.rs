//! Fetcher configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use herd_core::constants::DEFAULT_FETCHER_NAME;
use herd_core::error::{HerdError, Result};

/// Fetcher configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Name used in logs and statistics
    pub name: String,
    /// Longest a caller waits on another caller's fetch (None = forever)
    pub wait_timeout_ms: Option<u64>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_FETCHER_NAME.to_string(),
            wait_timeout_ms: None,
        }
    }
}

impl FetcherConfig {
    /// Creates a configuration with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the default wait timeout applied by `get`.
    ///
    /// Stored in whole milliseconds, rounded up so a nonzero timeout stays
    /// nonzero.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        let mut millis = timeout.as_millis();
        if timeout.subsec_nanos() % 1_000_000 != 0 {
            millis += 1;
        }
        self.wait_timeout_ms = Some(millis.min(u64::MAX as u128) as u64);
        self
    }

    /// Returns the default wait timeout.
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }

    /// Checks the configuration for values that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(HerdError::Config("fetcher name cannot be empty".into()));
        }
        if self.wait_timeout_ms == Some(0) {
            return Err(HerdError::Config(
                "wait timeout must be positive; omit it to wait forever".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FetcherConfig::default();
        assert_eq!(config.name, DEFAULT_FETCHER_NAME);
        assert!(config.wait_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_wait_timeout_builder() {
        let config = FetcherConfig::new("users").with_wait_timeout(Duration::from_millis(750));
        assert_eq!(config.wait_timeout(), Some(Duration::from_millis(750)));
    }

    #[test]
    fn test_sub_millisecond_timeout_rounds_up() {
        let config = FetcherConfig::new("users").with_wait_timeout(Duration::from_micros(200));
        assert_eq!(config.wait_timeout_ms, Some(1));
        assert!(config.validate().is_ok());

        let config = FetcherConfig::new("users").with_wait_timeout(Duration::from_micros(1500));
        assert_eq!(config.wait_timeout(), Some(Duration::from_millis(2)));

        let config = FetcherConfig::new("users").with_wait_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(matches!(
            FetcherConfig::new("  ").validate(),
            Err(HerdError::Config(_))
        ));

        let zero = FetcherConfig {
            wait_timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(matches!(zero.validate(), Err(HerdError::Config(_))));
    }

    #[test]
    fn test_config_from_json() {
        let config: FetcherConfig =
            serde_json::from_str(r#"{"name": "sessions", "wait_timeout_ms": 200}"#).unwrap();
        assert_eq!(config.name, "sessions");
        assert_eq!(config.wait_timeout(), Some(Duration::from_millis(200)));

        let partial: FetcherConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(partial.name, DEFAULT_FETCHER_NAME);
    }
}
