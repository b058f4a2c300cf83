//! Error types for the unified API.

use scandigest_core::{ConfigError, ScanError};
use scandigest_request::RequestError;
use scandigest_wire::WireError;
use thiserror::Error;

/// Errors that can occur while digesting a scan end to end.
#[derive(Debug, Error)]
pub enum ScanDigestError {
    /// An entry was rejected by the digest builder.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// Collation, algorithm or aggregation configuration was invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Request parameters could not be turned into aggregations.
    #[error("request error: {0}")]
    Request(#[from] RequestError),

    /// Entries could not be read or written.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),
}

/// Result type for unified API operations.
pub type Result<T> = std::result::Result<T, ScanDigestError>;
