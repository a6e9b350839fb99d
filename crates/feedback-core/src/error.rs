//! Error types for feedback-core

use thiserror::Error;

/// Result type alias using feedback-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while taking in feedback
#[derive(Error, Debug)]
pub enum Error {
    /// Request body could not be decoded into a submission
    #[error("Invalid JSON format")]
    InvalidJson(#[source] serde_json::Error),

    /// One of name, email or message is absent, null or empty
    #[error("Missing one or more fields")]
    MissingFields,

    /// Store connection string is malformed or incomplete
    #[error("Invalid connection string: {0}")]
    ConnectionString(String),

    /// An entity with the same partition and row key is already stored
    #[error("Entity already exists: {partition_key}/{row_key}")]
    EntityExists {
        partition_key: String,
        row_key: String,
    },

    /// Table storage request failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error was caused by the submitted request rather than a dependency.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidJson(_) | Self::MissingFields)
    }
}
