//! Anthropic provider configuration.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default Anthropic model.
pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";

/// Default completion budget per call.
pub const DEFAULT_MAX_TOKENS: u64 = 1000;

/// Default deadline for one model call, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the Anthropic language model.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct AnthropicConfig {
    /// Anthropic API key.
    #[cfg_attr(
        feature = "config",
        arg(long = "anthropic-api-key", env = "ANTHROPIC_API_KEY", hide_env_values = true)
    )]
    pub anthropic_api_key: String,

    /// Model identifier.
    #[cfg_attr(
        feature = "config",
        arg(long = "anthropic-model", env = "ANTHROPIC_MODEL", default_value = DEFAULT_MODEL)
    )]
    pub anthropic_model: String,

    /// Maximum tokens generated per call.
    #[cfg_attr(
        feature = "config",
        arg(long = "anthropic-max-tokens", env = "ANTHROPIC_MAX_TOKENS", default_value = "1000")
    )]
    pub anthropic_max_tokens: u64,

    /// Deadline for one model call, in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "anthropic-timeout-secs", env = "ANTHROPIC_TIMEOUT_SECS", default_value = "60")
    )]
    pub anthropic_timeout_secs: u64,
}

impl AnthropicConfig {
    /// Creates a configuration with default model settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            anthropic_api_key: api_key.into(),
            anthropic_model: DEFAULT_MODEL.to_string(),
            anthropic_max_tokens: DEFAULT_MAX_TOKENS,
            anthropic_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.anthropic_model = model.into();
        self
    }

    /// Sets the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.anthropic_timeout_secs = timeout.as_secs();
        self
    }

    /// Returns the per-call deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.anthropic_timeout_secs)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.anthropic_api_key.trim().is_empty() {
            return Err(Error::config("Anthropic API key cannot be empty"));
        }

        if self.anthropic_model.trim().is_empty() {
            return Err(Error::config("Anthropic model cannot be empty"));
        }

        if self.anthropic_max_tokens == 0 {
            return Err(Error::config("Anthropic max tokens must be at least 1"));
        }

        if self.anthropic_timeout_secs == 0 {
            return Err(Error::config("Anthropic timeout must be at least 1 second"));
        }

        Ok(())
    }
}

impl fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("anthropic_api_key", &"****")
            .field("anthropic_model", &self.anthropic_model)
            .field("anthropic_max_tokens", &self.anthropic_max_tokens)
            .field("anthropic_timeout_secs", &self.anthropic_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AnthropicConfig::new("sk-ant-test");
        assert_eq!(config.anthropic_model, DEFAULT_MODEL);
        assert_eq!(config.anthropic_max_tokens, 1000);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn debug_masks_api_key() {
        let config = AnthropicConfig::new("sk-ant-secret");
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn empty_key_is_invalid() {
        assert!(AnthropicConfig::new(" ").validate().is_err());
        assert!(
            AnthropicConfig::new("k")
                .with_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }
}
