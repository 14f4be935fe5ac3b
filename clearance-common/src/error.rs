//! Common error types for the clearance service

use thiserror::Error;

use crate::ingest::IngestError;

/// Common result type for clearance operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the library and the web service
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Row blob could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Uploaded roster could not be decoded or parsed
    #[error("Malformed input: {0}")]
    Ingest(#[from] IngestError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::Ingest(_))
    }
}
