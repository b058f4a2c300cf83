//! Error types for scandigest core.

use thiserror::Error;

/// Errors raised while feeding entries into a digest builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// An entity id sorted before the previously accepted id.
    #[error("entity id {current:?} is out of order: previous id was {previous:?}")]
    OutOfOrder { previous: String, current: String },

    /// A write was attempted after digests had been read.
    #[error("cannot add entries once digests have been read: buckets are sealed")]
    SealedBucket,

    /// An aggregation could not interpret an attribute value.
    #[error("malformed value {value:?} for attribute {attribute}: {reason}")]
    MalformedValue {
        attribute: String,
        value: String,
        reason: String,
    },

    /// An entry lacks an attribute that an aggregation is configured for.
    #[error("entry has no value for aggregated attribute {attribute}")]
    MissingAttribute { attribute: String },
}

impl ScanError {
    pub(crate) fn malformed(attribute: &str, value: &str, reason: impl Into<String>) -> Self {
        ScanError::MalformedValue {
            attribute: attribute.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while constructing aggregations, collations or builder config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid granularity: {0}")]
    InvalidGranularity(String),

    #[error("string prefix aggregation requires at least one offset")]
    EmptyOffsets,

    #[error("invalid prefix offset {offset}: offsets must be positive and strictly increasing")]
    InvalidOffset { offset: usize },

    #[error("unknown collation: {0}")]
    UnknownCollation(String),

    #[error("unknown digest algorithm: {0}")]
    UnknownDigestAlgorithm(String),

    #[error("collator unavailable: {0}")]
    Collator(String),

    /// Two aggregations govern the same attribute.
    #[error("more than one aggregation for attribute {attribute}")]
    DuplicateAggregation { attribute: String },
}
