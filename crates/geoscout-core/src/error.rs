//! Common error type definitions.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can cross a crate boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The search filter is not usable (caller-correctable, never retried).
    InvalidFilter,
    /// The map-data API or the language-model API could not be reached,
    /// timed out or answered with a non-success status.
    UpstreamUnavailable,
    /// A query against the embeddings database failed.
    DatabaseQuery,
    /// The language model answered with an unexpected shape.
    ModelProtocol,
    /// Configuration is missing or inconsistent.
    Configuration,
    /// Serialization/deserialization error.
    Serialization,
    /// Internal invariant violated.
    Internal,
}

/// A structured error type shared by all geoscout crates.
#[derive(Debug, Error)]
#[error("{}{}", kind.as_ref(), message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a new invalid filter error.
    pub fn invalid_filter() -> Self {
        Self::new(ErrorKind::InvalidFilter)
    }

    /// Creates a new upstream unavailable error.
    pub fn upstream_unavailable() -> Self {
        Self::new(ErrorKind::UpstreamUnavailable)
    }

    /// Creates a new database query error.
    pub fn database_query() -> Self {
        Self::new(ErrorKind::DatabaseQuery)
    }

    /// Creates a new model protocol error.
    pub fn model_protocol() -> Self {
        Self::new(ErrorKind::ModelProtocol)
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a new serialization error.
    pub fn serialization() -> Self {
        Self::new(ErrorKind::Serialization)
    }

    /// Creates a new internal error.
    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }

    /// Returns whether the caller can fix the request and try again.
    pub fn is_caller_correctable(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidFilter)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization()
            .with_message(err.to_string())
            .with_source(err)
    }
}
