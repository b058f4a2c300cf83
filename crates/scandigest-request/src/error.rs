//! Error types for request parsing.

use scandigest_core::ConfigError;
use thiserror::Error;

/// Errors that can occur while turning request parameters into aggregations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// A granularity or offset list was rejected by the aggregation.
    #[error("invalid aggregation for {attribute}: {source}")]
    Config {
        attribute: String,
        #[source]
        source: ConfigError,
    },

    /// An offset parameter was not a positive integer.
    #[error("invalid offset {value:?} for attribute {attribute}")]
    InvalidOffset { attribute: String, value: String },

    /// An attribute type name was not recognised.
    #[error("unknown attribute type: {0}")]
    UnknownAttributeType(String),
}

/// Result type for request parsing.
pub type Result<T> = std::result::Result<T, RequestError>;
