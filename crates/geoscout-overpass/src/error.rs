//! Internal error types for geoscout-overpass.

use thiserror::Error;

/// Result type alias for geoscout-overpass operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Internal error type for geoscout-overpass operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The filter cannot be compiled into a query.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    /// HTTP request failed or timed out.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// The API answered with a non-success status.
    #[error("Overpass API responded with HTTP {status}")]
    Status {
        /// Response status code.
        status: u16,
        /// Truncated response body, for diagnostics.
        body: String,
    },
    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates an invalid filter error.
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::InvalidFilter(message.into())
    }

    /// Returns whether the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Reqwest(e) if e.is_timeout())
    }
}

impl From<geoscout_core::Error> for Error {
    fn from(err: geoscout_core::Error) -> Self {
        let kind = err.kind_str().to_string();
        Self::InvalidFilter(err.message.unwrap_or(kind))
    }
}

impl From<Error> for geoscout_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidFilter(message) => geoscout_core::Error::invalid_filter().with_message(message),
            Error::Reqwest(e) => {
                let message = if e.is_timeout() {
                    "Overpass API request timed out".to_string()
                } else if e.is_connect() {
                    "Overpass API connection failed".to_string()
                } else if e.is_decode() {
                    "Overpass API returned an undecodable body".to_string()
                } else {
                    e.to_string()
                };
                geoscout_core::Error::upstream_unavailable()
                    .with_message(message)
                    .with_source(e)
            }
            Error::Status { status, .. } => geoscout_core::Error::upstream_unavailable()
                .with_message(format!("Overpass API responded with HTTP {status}")),
            Error::Config(message) => geoscout_core::Error::configuration().with_message(message),
        }
    }
}
