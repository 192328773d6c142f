//! Error types for geoscout-rig.

use std::fmt;
use std::time::Duration;

/// Result type alias for rig operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while chatting or dispatching tools.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Provider error (API call failed, rate limited, etc.)
    #[error("provider error: {provider}: {message}")]
    Provider { provider: String, message: String },

    /// The provider did not answer in time.
    #[error("provider error: {provider}: no response after {elapsed:?}")]
    Timeout { provider: String, elapsed: Duration },

    /// The model answered with something the orchestrator cannot act on.
    #[error("model protocol error: {0}")]
    Protocol(String),

    /// The model asked for a tool that is not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Tool arguments do not match the tool's input schema.
    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    /// Tool execution error.
    #[error("tool error: {tool}: {source}")]
    Tool {
        tool: String,
        #[source]
        source: geoscout_core::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Creates a provider error.
    pub fn provider(provider: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates a provider timeout error.
    pub fn timeout(provider: impl fmt::Display, elapsed: Duration) -> Self {
        Self::Timeout {
            provider: provider.to_string(),
            elapsed,
        }
    }

    /// Creates a model protocol error.
    pub fn protocol(message: impl fmt::Display) -> Self {
        Self::Protocol(message.to_string())
    }

    /// Creates an invalid arguments error.
    pub fn invalid_arguments(tool: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::InvalidArguments {
            tool: tool.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates a tool error from a failure of the services behind it.
    pub fn tool(tool: impl fmt::Display, source: impl Into<geoscout_core::Error>) -> Self {
        Self::Tool {
            tool: tool.to_string(),
            source: source.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl fmt::Display) -> Self {
        Self::Config(message.to_string())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider { .. } | Self::Timeout { .. } => true,
            Self::Tool { source, .. } => {
                source.kind() == geoscout_core::ErrorKind::UpstreamUnavailable
            }
            _ => false,
        }
    }
}

impl From<Error> for geoscout_core::Error {
    fn from(err: Error) -> Self {
        use geoscout_core::Error as CoreError;

        match err {
            Error::Provider { .. } | Error::Timeout { .. } => {
                CoreError::upstream_unavailable().with_message(err.to_string())
            }
            Error::Protocol(_) | Error::UnknownTool(_) => {
                CoreError::model_protocol().with_message(err.to_string())
            }
            Error::InvalidArguments { .. } => {
                CoreError::invalid_filter().with_message(err.to_string())
            }
            Error::Tool { source, .. } => source,
            Error::Config(message) => CoreError::configuration().with_message(message),
            Error::Serialization(e) => CoreError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use geoscout_core::ErrorKind;

    use super::*;

    #[test]
    fn provider_failures_are_upstream_unavailable() {
        let err = geoscout_core::Error::from(Error::timeout("anthropic", Duration::from_secs(60)));
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);

        let err = geoscout_core::Error::from(Error::provider("anthropic", "529 overloaded"));
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    }

    #[test]
    fn tool_errors_keep_their_kind() {
        let source = geoscout_core::Error::invalid_filter().with_message("no name or tags");
        let err = Error::tool("search_map", source);
        assert!(!err.is_retryable());
        assert_eq!(geoscout_core::Error::from(err).kind(), ErrorKind::InvalidFilter);
    }

    #[test]
    fn unknown_tool_is_a_protocol_error() {
        let err = geoscout_core::Error::from(Error::UnknownTool("fly_drone".into()));
        assert_eq!(err.kind(), ErrorKind::ModelProtocol);
    }
}
