//! # scandigest
//!
//! Streaming bucket digests for data reconciliation.
//!
//! Two participants that each hold a copy of some entity collection can find
//! where they disagree without shipping every entity. Each side scans its
//! entities in id order, groups them into buckets by attribute (day, month,
//! integer range, literal value, string prefix), and publishes one digest per
//! bucket. Buckets whose digests match are in sync; the rest are drilled into
//! with a finer aggregation.
//!
//! ## Usage
//!
//! ```rust
//! use scandigest::{AttributeType, DigestConfig, QueryParameters, ScanDigester};
//!
//! let params = QueryParameters::parse("bizDate-granularity=monthly");
//! let digester = ScanDigester::from_request(
//!     &params,
//!     &[("bizDate", AttributeType::Date)],
//!     DigestConfig::default(),
//! )
//! .unwrap();
//!
//! let input = r#"[{"id":"id1","version":"vsn1","attributes":{"bizDate":"2009-06-06"}}]"#;
//! let mut output = Vec::new();
//! assert_eq!(digester.digest_json(input.as_bytes(), &mut output).unwrap(), 1);
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `scandigest::core` - Collations, aggregations, entries and the digest builder
//! - `scandigest::request` - Aggregations from request parameters
//! - `scandigest::wire` - JSON encoding of entry collections

pub mod digester;
pub mod error;

// Re-export component crates
pub use scandigest_core as core;
pub use scandigest_request as request;
pub use scandigest_wire as wire;

// Re-export main types for convenience
pub use digester::ScanDigester;
pub use error::{Result, ScanDigestError};

pub use scandigest_core::{
    Aggregation, Attributes, Collation, CollationKind, DateGranularity, DigestAlgorithm,
    DigestBuilder, DigestConfig, IntegerGranularity, ScanResultEntry, SealedDigests,
};
pub use scandigest_request::{AggregationBuilder, AttributeType, QueryParameters, RequestParameters};
pub use scandigest_wire::{IdValidator, NullValidator, ScanEntityValidator};
