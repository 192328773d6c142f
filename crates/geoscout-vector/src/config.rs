//! Similarity engine configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::error::{VectorError, VectorResult};

/// Default number of points resolved concurrently.
const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Default per-point deadline in seconds.
const DEFAULT_POINT_TIMEOUT_SECS: u64 = 10;

/// Default number of neighbours per point.
const DEFAULT_TOP_K: usize = 5;

const MAX_CONCURRENCY: usize = 64;
const MAX_TOP_K: usize = 100;

/// Tuning knobs for [`SimilarityEngine`](crate::SimilarityEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct EngineConfig {
    /// Maximum number of points resolved concurrently
    #[cfg_attr(
        feature = "config",
        arg(
            long = "similarity-max-concurrency",
            env = "SIMILARITY_MAX_CONCURRENCY",
            default_value = "8"
        )
    )]
    pub max_concurrency: usize,

    /// Per-point deadline in seconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "similarity-point-timeout-secs",
            env = "SIMILARITY_POINT_TIMEOUT_SECS",
            default_value = "10"
        )
    )]
    pub point_timeout_secs: u64,

    /// Neighbours returned per point when the caller does not ask for a count
    #[cfg_attr(
        feature = "config",
        arg(long = "similarity-top-k", env = "SIMILARITY_TOP_K", default_value = "5")
    )]
    pub top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            point_timeout_secs: DEFAULT_POINT_TIMEOUT_SECS,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl EngineConfig {
    /// Sets the concurrency limit.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Sets the per-point timeout.
    pub fn with_point_timeout(mut self, timeout: Duration) -> Self {
        self.point_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the default neighbour count.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Returns the per-point deadline.
    pub fn point_timeout(&self) -> Duration {
        Duration::from_secs(self.point_timeout_secs)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> VectorResult<()> {
        if !(1..=MAX_CONCURRENCY).contains(&self.max_concurrency) {
            return Err(VectorError::invalid_config(format!(
                "max_concurrency must be between 1 and {MAX_CONCURRENCY}"
            )));
        }

        if self.point_timeout_secs == 0 {
            return Err(VectorError::invalid_config(
                "point_timeout_secs must be at least 1",
            ));
        }

        if !(1..=MAX_TOP_K).contains(&self.top_k) {
            return Err(VectorError::invalid_config(format!(
                "top_k must be between 1 and {MAX_TOP_K}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.point_timeout(), Duration::from_secs(10));
        assert_eq!(config.top_k, 5);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(EngineConfig::default().with_max_concurrency(0).validate().is_err());
        assert!(EngineConfig::default().with_top_k(0).validate().is_err());
        assert!(
            EngineConfig::default()
                .with_point_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }
}
