//! # scandigest testkit
//!
//! Testing utilities for scandigest.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Fixed version sequences with their expected MD5 and Blake3 digests
//! - **Generators**: Proptest strategies for ordered scans
//! - **Fixtures**: The standard four-entity scan and helpers for building entries
//!
//! ## Golden Vectors
//!
//! ```rust
//! use scandigest_testkit::vectors::{all_vectors, verify_vector};
//!
//! for vector in all_vectors() {
//!     verify_vector(&vector).unwrap();
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use scandigest_testkit::generators::ordered_scan;
//!
//! proptest! {
//!     #[test]
//!     fn scan_is_accepted(entries in ordered_scan(32)) {
//!         // feed entries to a DigestBuilder
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use scandigest_testkit::fixtures::ScanFixture;
//!
//! let fixture = ScanFixture::standard();
//! let digests = fixture.digest(ScanFixture::daily_and_by_name()).unwrap();
//! assert_eq!(digests.len(), 3);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{attrs, entity, ScanFixture};
pub use generators::{ordered_scan, ScanParams};
pub use vectors::{all_vectors, verify_all_vectors, verify_vector, DigestVector};
