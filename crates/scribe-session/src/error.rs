//! Error types for session cache operations.

/// Error type for session cache operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from the record store backend.
    #[error("Record store error: {0}")]
    Store(String),

    /// Cache configuration is inconsistent.
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for session cache operations.
pub type Result<T> = std::result::Result<T, Error>;
