//! # scandigest core
//!
//! Pure primitives for building reconciliation digests: collations,
//! aggregations, scan result entries, and the bucket digest builder.
//!
//! This crate does no I/O. It turns an ordered stream of entries into a small
//! set of per-bucket digests that two participants can compare.
//!
//! ## Key Types
//!
//! - [`DigestBuilder`] - Buckets entries and seals them into digests on first read
//! - [`Aggregation`] - Maps an attribute value to a bucket label
//! - [`Collation`] - The id ordering a scan must follow
//! - [`ScanResultEntry`] - A raw entity or an aggregate digest
//!
//! ## Example
//!
//! ```rust
//! use scandigest_core::{Aggregation, Attributes, DateGranularity, DigestBuilder};
//!
//! let mut builder = DigestBuilder::new(vec![
//!     Aggregation::date("bizDate", DateGranularity::Daily, None),
//! ]).unwrap();
//!
//! let mut attrs = Attributes::new();
//! attrs.insert("bizDate".into(), "2009-06-06T12:45:12.000Z".into());
//! builder.add_entity("id1", attrs, "vsn1").unwrap();
//!
//! let digests = builder.to_digests();
//! assert_eq!(digests.len(), 1);
//! assert_eq!(digests[0].attribute("bizDate"), Some("2009-06-06"));
//! ```

pub mod aggregation;
pub mod collation;
pub mod config;
pub mod digest;
pub mod entry;
pub mod error;

pub use aggregation::{
    Aggregation, ByNameAggregation, DateAggregation, DateGranularity, IntegerAggregation,
    IntegerGranularity, StringPrefixAggregation, BY_NAME_GRANULARITY,
};
pub use collation::{AsciiCollation, Collation, CollationKind, UnicodeCollation};
pub use config::DigestConfig;
pub use digest::{DigestAlgorithm, DigestBuilder, SealedDigests};
pub use entry::{Attributes, ScanResultEntry};
pub use error::{ConfigError, ScanError};
