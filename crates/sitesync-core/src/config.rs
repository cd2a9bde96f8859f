//! Configuration types for the site synchronizer
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Main synchronizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Root domain of the managed network (e.g., "example.com")
    pub network_domain: String,

    /// Test-domain override for staging environments
    ///
    /// When set, both the CNAME subject and content have the live network
    /// domain suffix substituted with this domain, so staging exercises the
    /// same code path against a throwaway zone.
    #[serde(default)]
    pub test_domain: Option<String>,

    /// Provider API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Configuration store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Status cache time-to-live in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Opt-in bounded retry for idempotent reads (zone/record listing)
    ///
    /// Disabled by default. Never applies to record mutations.
    #[serde(default)]
    pub read_retry: Option<RetryConfig>,

    /// Capacity of the reconciler monitoring-event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SyncConfig {
    /// Create a configuration for the given network domain, with defaults
    pub fn new(network_domain: impl Into<String>) -> Self {
        Self {
            network_domain: network_domain.into(),
            test_domain: None,
            api: ApiConfig::default(),
            store: StoreConfig::default(),
            cache_ttl_secs: default_cache_ttl_secs(),
            read_retry: None,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.network_domain.is_empty() {
            return Err(crate::Error::config("Network domain cannot be empty"));
        }

        if let Some(ref test_domain) = self.test_domain
            && test_domain.is_empty()
        {
            return Err(crate::Error::config("Test domain cannot be empty when set"));
        }

        if self.cache_ttl_secs == 0 {
            return Err(crate::Error::config("Cache TTL must be > 0"));
        }

        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        self.api.validate()?;

        if let Some(ref retry) = self.read_retry {
            retry.validate()?;
        }

        Ok(())
    }

    /// Set the test-domain override
    pub fn with_test_domain(mut self, test_domain: impl Into<String>) -> Self {
        self.test_domain = Some(test_domain.into());
        self
    }
}

/// Provider API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the provider API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    ///
    /// A call that exceeds this fails with a transport error rather than
    /// blocking the invoking lifecycle event.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// TLS certificate verification
    ///
    /// Forced on in production. May be disabled for local test
    /// environments only; the client logs loudly when it is off.
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
}

impl ApiConfig {
    /// Validate the API settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.base_url.is_empty() {
            return Err(crate::Error::config("API base URL cannot be empty"));
        }

        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "API base URL must use HTTP or HTTPS scheme. Got: {}",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(crate::Error::config(format!(
                "API timeout must be between 1 and 300 seconds. Got: {}",
                self.timeout_secs
            )));
        }

        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            verify_tls: default_verify_tls(),
        }
    }
}

/// Configuration store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// File-backed store (token and zone id survive restarts)
    File {
        /// Path to the store file
        path: String,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,
}

/// Bounded retry with exponential backoff, for idempotent reads only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the initial call
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay between attempts (doubled each retry), in seconds
    #[serde(default = "default_retry_delay_secs")]
    pub delay_secs: u64,
}

impl RetryConfig {
    /// Validate the retry settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_retries == 0 || self.max_retries > 10 {
            return Err(crate::Error::config(format!(
                "Read retry count must be between 1 and 10. Got: {}",
                self.max_retries
            )));
        }

        if self.delay_secs == 0 || self.delay_secs > 300 {
            return Err(crate::Error::config(format!(
                "Read retry delay must be between 1 and 300 seconds. Got: {}",
                self.delay_secs
            )));
        }

        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_secs: default_retry_delay_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.cloudflare.com/client/v4/".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_verify_tls() -> bool {
    true
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_delay_secs() -> u64 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SyncConfig::new("example.com");
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_ttl_secs, 300);
        assert_eq!(config.api.timeout_secs, 15);
        assert!(config.api.verify_tls);
        assert!(config.read_retry.is_none());
    }

    #[test]
    fn empty_network_domain_rejected() {
        let config = SyncConfig::new("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_base_url_rejected() {
        let mut config = SyncConfig::new("example.com");
        config.api.base_url = "ftp://api.cloudflare.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn retry_bounds_enforced() {
        let mut config = SyncConfig::new("example.com");
        config.read_retry = Some(RetryConfig {
            max_retries: 11,
            delay_secs: 1,
        });
        assert!(config.validate().is_err());
    }
}
