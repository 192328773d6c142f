//! Similarity search error types.

use geoscout_postgres::PgError;
use thiserror::Error;

/// Result type for similarity search operations.
pub type VectorResult<T> = Result<T, VectorError>;

/// Similarity search errors.
#[derive(Debug, Error)]
pub enum VectorError {
    /// Could not obtain a database connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// A store query failed.
    #[error("query error: {0}")]
    Query(String),

    /// Operation timed out.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl VectorError {
    /// Creates a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Creates an invalid config error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<PgError> for VectorError {
    fn from(err: PgError) -> Self {
        match err {
            PgError::Timeout(_) => Self::timeout(err.to_string()),
            PgError::Connection(_) => Self::connection(err.to_string()),
            PgError::Config(msg) => Self::invalid_config(msg),
            other => Self::query(other.to_string()),
        }
    }
}

impl From<VectorError> for geoscout_core::Error {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::InvalidConfig(msg) => Self::configuration().with_message(msg),
            other => Self::database_query().with_message(other.to_string()),
        }
    }
}
