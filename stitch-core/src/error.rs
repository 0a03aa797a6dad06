//! Error types for stitch-core.

use thiserror::Error;

/// Result type for stitch-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for stitch-core operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An annotation's span does not fit inside its document.
    #[error("annotation '{label}' [{start}, {end}) exceeds document length {len}")]
    SpanOutOfBounds {
        /// Annotation label.
        label: String,
        /// Start offset (chars).
        start: usize,
        /// End offset (chars, exclusive).
        end: usize,
        /// Document length (chars).
        len: usize,
    },
}

impl Error {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
