//! Configuration for the Overpass client.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default timeout for Overpass requests: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Public Overpass interpreter endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Configuration for the Overpass HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct OverpassConfig {
    /// Overpass interpreter URL.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "overpass-endpoint",
            env = "OVERPASS_ENDPOINT",
            default_value = DEFAULT_ENDPOINT
        )
    )]
    pub endpoint: String,

    /// Request timeout in seconds.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "overpass-timeout-secs",
            env = "OVERPASS_TIMEOUT_SECS",
            default_value = "30"
        )
    )]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request.
    #[cfg_attr(
        feature = "config",
        arg(long = "overpass-user-agent", env = "OVERPASS_USER_AGENT")
    )]
    pub user_agent: Option<String>,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            user_agent: None,
        }
    }
}

impl OverpassConfig {
    /// Creates a configuration pointing at the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Returns the effective timeout, using default if zero.
    pub fn timeout(&self) -> Duration {
        if self.timeout_secs == 0 {
            DEFAULT_TIMEOUT
        } else {
            Duration::from_secs(self.timeout_secs)
        }
    }

    /// Returns the effective user agent, using default if empty.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .filter(|ua| !ua.is_empty())
            .unwrap_or_else(|| format!("geoscout/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(Error::Config("endpoint cannot be empty".to_string()));
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(Error::Config(format!(
                "endpoint must be an http(s) URL, got {:?}",
                self.endpoint
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OverpassConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.effective_user_agent().starts_with("geoscout/"));
    }

    #[test]
    fn test_effective_timeout_uses_default_when_zero() {
        let config = OverpassConfig::default().with_timeout(Duration::ZERO);
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_validation() {
        assert!(OverpassConfig::default().validate().is_ok());
        assert!(OverpassConfig::new("").validate().is_err());
        assert!(OverpassConfig::new("ftp://example.com").validate().is_err());
    }
}
