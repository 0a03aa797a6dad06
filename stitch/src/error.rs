//! Error types for stitch.

use thiserror::Error;

use crate::offset::SpanOutOfRange;

/// Result type for stitch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for stitch operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from the core data model.
    #[error(transparent)]
    Core(#[from] stitch_core::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A manifest line could not be parsed.
    #[error("manifest line {line}: {message}")]
    Manifest {
        /// 1-based line number in the manifest file.
        line: usize,
        /// What went wrong on that line.
        message: String,
    },

    /// A translated span fell outside its document after offset correction.
    #[error("document {uri}: annotation '{label}' [{start}, {end}) exceeds document length {len}")]
    OffsetOutOfRange {
        /// Document URI from the manifest.
        uri: String,
        /// Label of the offending prediction.
        label: String,
        /// Corrected start offset (chars).
        start: usize,
        /// Corrected end offset (chars, exclusive).
        end: usize,
        /// Document length (chars).
        len: usize,
    },

    /// The prediction collaborator stayed unavailable past the retry budget.
    #[error("prediction service unavailable: {0}")]
    Unavailable(String),

    /// The prediction collaborator rejected the request. Fatal for the run.
    #[error("invalid prediction request: {0}")]
    InvalidArgument(String),

    /// Email parsing failed.
    #[error("email error: {0}")]
    Email(String),

    /// Embedding file could not be loaded.
    #[error("embedding error: {0}")]
    Embedding(String),
}

impl Error {
    /// Create a manifest-line error.
    #[must_use]
    pub fn manifest(line: usize, message: impl Into<String>) -> Self {
        Self::Manifest {
            line,
            message: message.into(),
        }
    }

    /// Attach document context to a span-translation failure.
    #[must_use]
    pub fn offset_out_of_range(
        uri: impl Into<String>,
        label: impl Into<String>,
        source: SpanOutOfRange,
    ) -> Self {
        Self::OffsetOutOfRange {
            uri: uri.into(),
            label: label.into(),
            start: source.start,
            end: source.end,
            len: source.len,
        }
    }

    /// Create an email error.
    #[must_use]
    pub fn email(msg: impl Into<String>) -> Self {
        Self::Email(msg.into())
    }

    /// Create an embedding error.
    #[must_use]
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }
}
