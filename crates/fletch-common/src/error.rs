//! Error types for Fletch.

use thiserror::Error;

/// Top-level error type for Fletch operations.
#[derive(Debug, Error)]
pub enum FletchError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Structurally valid input with invalid values
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for Fletch operations.
pub type FletchResult<T> = Result<T, FletchError>;
