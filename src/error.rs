//! Error taxonomy shared by all three filter variants.

use thiserror::Error;

/// Everything that can go wrong constructing, mutating, or persisting a filter.
#[derive(Debug, Error)]
pub enum BloomError {
    /// A construction-time constraint was violated (bad capacity, error ratio, or bin size).
    #[error("invalid parameters: {reason}")]
    InvalidParameters {
        /// Human-readable description of which constraint failed.
        reason: String,
    },

    /// The backing file could not be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted envelope was corrupt, of the wrong variant, or missing fields.
    #[error("format error: {reason}")]
    Format {
        /// Human-readable description of what was wrong with the payload.
        reason: String,
    },

    /// An inner-filter index was requested outside `[0, blooms)`.
    #[error("index {index} out of range for {len} inner filter(s)")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// The number of inner filters that actually exist.
        len: usize,
    },
}

impl From<serde_json::Error> for BloomError {
    fn from(e: serde_json::Error) -> Self {
        BloomError::Format {
            reason: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BloomError>;
