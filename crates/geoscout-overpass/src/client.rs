//! Overpass HTTP client.

use std::sync::Arc;
use std::time::Instant;

use geoscout_core::FeaturePoint;
use reqwest::Client;

use crate::config::OverpassConfig;
use crate::error::{Error, Result};
use crate::response::OverpassResponse;
use crate::{SearchFilter, TRACING_TARGET_CLIENT, query};

/// Maximum number of response body bytes kept in [`Error::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Inner client that holds the HTTP client and configuration.
struct OverpassClientInner {
    http: Client,
    config: OverpassConfig,
}

impl std::fmt::Debug for OverpassClientInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverpassClientInner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Client searching OpenStreetMap features through an Overpass interpreter.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct OverpassClient {
    inner: Arc<OverpassClientInner>,
}

impl OverpassClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: OverpassConfig) -> Result<Self> {
        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            endpoint = %config.endpoint,
            timeout_ms = config.timeout().as_millis(),
            "Creating Overpass client"
        );

        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.effective_user_agent())
            .build()?;

        let inner = OverpassClientInner { http, config };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Creates a new client with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(OverpassConfig::default())
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &OverpassConfig {
        &self.inner.config
    }

    /// Searches for features matching the filter.
    ///
    /// Returns at most `filter.result_limit()` features in server order, each
    /// indexed by its position in the returned list. An empty list is a valid
    /// result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] without any network traffic when the
    /// filter is unusable, and a transport or [`Error::Status`] error when the
    /// Overpass API cannot be reached or rejects the query.
    #[tracing::instrument(skip_all, fields(limit = filter.result_limit()))]
    pub async fn search(&self, filter: &SearchFilter) -> Result<Vec<FeaturePoint>> {
        let query = query::compile_with(filter, Some(self.inner.config.timeout()))?;
        let started = Instant::now();

        let response = self
            .inner
            .http
            .get(&self.inner.config.endpoint)
            .query(&[("data", query.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY));

            tracing::warn!(
                target: TRACING_TARGET_CLIENT,
                status = status.as_u16(),
                elapsed_ms = started.elapsed().as_millis(),
                "Overpass API returned an error status"
            );

            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: OverpassResponse = response.json().await?;
        let total = body.elements.len();

        let features: Vec<FeaturePoint> = body
            .elements
            .into_iter()
            .take(filter.result_limit())
            .enumerate()
            .map(|(index, element)| element.into_feature(index))
            .collect();

        if features.is_empty() {
            tracing::warn!(
                target: TRACING_TARGET_CLIENT,
                bbox = ?filter.bbox(),
                "Overpass search returned no elements"
            );
        }

        let missing = features.iter().filter(|f| f.coordinates_missing).count();
        if missing > 0 {
            tracing::warn!(
                target: TRACING_TARGET_CLIENT,
                missing,
                "Overpass elements without coordinates defaulted to 0,0"
            );
        }

        tracing::info!(
            target: TRACING_TARGET_CLIENT,
            total,
            returned = features.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Overpass search completed"
        );

        Ok(features)
    }
}

/// Largest index not exceeding `max` that falls on a char boundary.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
