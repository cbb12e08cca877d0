//! Interceptor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use pagetrack_core::constants::{DEFAULT_CONTENT_PREFIX, DEFAULT_COUNT_PREFIX, DEFAULT_TTL_SECONDS};
use pagetrack_core::env;
use pagetrack_core::error::{Result, TrackerError};
use pagetrack_core::types::KeySpace;

/// Caching interceptor configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Lifetime of a cached page in seconds, applied to every key
    pub ttl_seconds: u64,
    /// Prefix of the access counter keys
    pub count_prefix: String,
    /// Prefix of the cached content keys
    pub content_prefix: String,
    /// Serialize concurrent misses on the same key so only one fetches
    pub coalesce_misses: bool,
    /// Treat cached bytes that are not UTF-8 as a miss
    pub require_utf8: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
            count_prefix: DEFAULT_COUNT_PREFIX.into(),
            content_prefix: DEFAULT_CONTENT_PREFIX.into(),
            coalesce_misses: false,
            require_utf8: false,
        }
    }
}

impl TrackerConfig {
    /// Reads `PAGETRACK_TTL_SECONDS`, `PAGETRACK_COUNT_PREFIX`,
    /// `PAGETRACK_CONTENT_PREFIX`, `PAGETRACK_COALESCE` and
    /// `PAGETRACK_REQUIRE_UTF8`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        env::load_dotenv();
        let defaults = Self::default();

        let config = Self {
            ttl_seconds: env::var("PAGETRACK_TTL_SECONDS")?.unwrap_or(defaults.ttl_seconds),
            count_prefix: env::var("PAGETRACK_COUNT_PREFIX")?.unwrap_or(defaults.count_prefix),
            content_prefix: env::var("PAGETRACK_CONTENT_PREFIX")?
                .unwrap_or(defaults.content_prefix),
            coalesce_misses: env::flag("PAGETRACK_COALESCE")?.unwrap_or(defaults.coalesce_misses),
            require_utf8: env::flag("PAGETRACK_REQUIRE_UTF8")?.unwrap_or(defaults.require_utf8),
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the cache TTL.
    pub fn with_ttl_seconds(mut self, seconds: u64) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    /// Sets both key prefixes.
    pub fn with_prefixes(mut self, count: impl Into<String>, content: impl Into<String>) -> Self {
        self.count_prefix = count.into();
        self.content_prefix = content.into();
        self
    }

    /// Enables per-key miss coalescing.
    pub fn coalesced(mut self) -> Self {
        self.coalesce_misses = true;
        self
    }

    /// Rejects cached entries that are not UTF-8.
    pub fn utf8_only(mut self) -> Self {
        self.require_utf8 = true;
        self
    }

    /// Cache TTL as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Builds the key space for the configured prefixes.
    pub fn key_space(&self) -> Result<KeySpace> {
        KeySpace::new(self.count_prefix.clone(), self.content_prefix.clone())
    }

    /// Checks the TTL and key prefixes.
    pub fn validate(&self) -> Result<()> {
        if self.ttl_seconds == 0 {
            return Err(TrackerError::ConfigError(
                "ttl_seconds must be greater than zero".into(),
            ));
        }
        self.key_space().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.ttl(), Duration::from_secs(10));
        assert_eq!(config.count_prefix, "count:");
        assert_eq!(config.content_prefix, "cached:");
        assert!(!config.coalesce_misses);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = TrackerConfig::default()
            .with_ttl_seconds(60)
            .with_prefixes("hits:", "page:")
            .coalesced()
            .utf8_only();

        assert_eq!(config.ttl_seconds, 60);
        assert!(config.coalesce_misses);
        assert!(config.require_utf8);
        assert_eq!(config.key_space().unwrap().content_prefix(), "page:");
    }

    #[test]
    fn test_zero_ttl_invalid() {
        let config = TrackerConfig::default().with_ttl_seconds(0);
        assert!(matches!(config.validate(), Err(TrackerError::ConfigError(_))));
    }

    #[test]
    fn test_overlapping_prefixes_invalid() {
        let config = TrackerConfig::default().with_prefixes("page", "page:body:");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde() {
        let config = TrackerConfig::default().with_ttl_seconds(5);
        let json = serde_json::to_string(&config).unwrap();
        let back: TrackerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
