//! Error types for the wire format.

use thiserror::Error;

/// Errors that can occur while reading or writing entry collections.
#[derive(Debug, Error)]
pub enum WireError {
    /// Underlying reader or writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON, or JSON that does not describe an entry.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The top-level value was not an array.
    #[error("expected a JSON array of entries, found {0}")]
    ExpectedArray(&'static str),

    /// A validator refused an entry.
    #[error("entry {id:?} rejected: {reason}")]
    Rejected { id: Option<String>, reason: String },
}

/// Result type for wire operations.
pub type Result<T> = std::result::Result<T, WireError>;
