//! Error types for the analysis and rendering pipeline.

use std::fmt;

/// Top-level error type for the soundsight public API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundsightError {
    /// A caller-supplied parameter was rejected (bad dimension,
    /// inverted frequency range, unknown palette or visualization).
    InvalidArgument(String),
    /// The input does not match any contract the decoders cover.
    Unsupported(String),
    /// A rendering primitive failed a precondition its callers
    /// should have caught earlier (e.g. missing palette).
    Internal(String),
}

impl fmt::Display for SoundsightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoundsightError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            SoundsightError::Unsupported(msg) => write!(f, "unsupported input: {}", msg),
            SoundsightError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for SoundsightError {}

/// Convenience alias so callers can write `Result<T>` instead of
/// `Result<T, SoundsightError>`.
pub type Result<T> = std::result::Result<T, SoundsightError>;
