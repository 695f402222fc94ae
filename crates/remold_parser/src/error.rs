//! Parse error types.

use thiserror::Error;

/// Errors raised by [`FormatPreservingReader`](crate::FormatPreservingReader)
/// when asked for text it cannot provide.
///
/// Both variants are programming errors of the calling parser and abort the
/// current parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OffsetError {
    /// The offset lies before the retained window; that text was discarded.
    #[error("offset {requested} is before the retained window starting at {retained_from}")]
    StaleOffset {
        requested: usize,
        retained_from: usize,
    },

    /// `end < start`, the range exceeds what has been read, or a bound
    /// falls inside a multi-unit character.
    #[error("malformed range {start}..{end} ({available} units read)")]
    MalformedRange {
        start: usize,
        end: usize,
        available: usize,
    },
}

/// Errors that can occur during parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The source text is invalid.
    #[error("Invalid source: {message}")]
    InvalidSource {
        /// Error message.
        message: String,
        /// Offset (in the parser's event units) where the error occurred.
        offset: Option<usize>,
    },

    /// The parser encountered an unsupported feature.
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// An internal parser error occurred.
    #[error("Internal parser error: {0}")]
    Internal(String),

    /// The reader rejected an offset request.
    #[error(transparent)]
    Offset(#[from] OffsetError),

    /// Reading the input failed (including invalid UTF-8).
    #[error("Failed to read source: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Creates a new invalid source error.
    pub fn invalid_source(message: impl Into<String>) -> Self {
        Self::InvalidSource {
            message: message.into(),
            offset: None,
        }
    }

    /// Creates a new invalid source error with offset.
    pub fn invalid_source_at(message: impl Into<String>, offset: usize) -> Self {
        Self::InvalidSource {
            message: message.into(),
            offset: Some(offset),
        }
    }

    /// Creates a new unsupported feature error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported(feature.into())
    }

    /// Creates a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the source offset attached to this error, if any.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::InvalidSource { offset, .. } => *offset,
            Self::Offset(OffsetError::StaleOffset { requested, .. }) => Some(*requested),
            Self::Offset(OffsetError::MalformedRange { start, .. }) => Some(*start),
            _ => None,
        }
    }
}
