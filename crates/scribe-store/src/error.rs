//! Error types for the store crate.

use thiserror::Error;

/// Errors that can occur in the store crate.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database connection or operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Could not prepare the database location.
    #[error("Failed to prepare database path '{path}': {source}")]
    Path {
        path: String,
        source: std::io::Error,
    },

    /// Requested session not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Stored data could not be decoded.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<StoreError> for scribe_session::Error {
    fn from(err: StoreError) -> Self {
        scribe_session::Error::Store(err.to_string())
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
