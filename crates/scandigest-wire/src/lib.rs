//! # scandigest wire
//!
//! Reads and writes collections of [`ScanResultEntry`] as JSON, the form in
//! which participants exchange query results and digests.
//!
//! ```rust
//! use scandigest_wire::{read_query_result, IdValidator};
//!
//! let input = r#"[{"id":"id1","version":"vsn1","attributes":{"bizDate":"2009-06-06"}}]"#;
//! let entries = read_query_result(input.as_bytes(), &IdValidator).unwrap();
//! assert_eq!(entries[0].attribute("bizDate"), Some("2009-06-06"));
//! ```
//!
//! [`ScanResultEntry`]: scandigest_core::ScanResultEntry

pub mod error;
pub mod json;
pub mod validator;

pub use error::{Result, WireError};
pub use json::{format_query_result, read_entries, read_query_result, write_query_result};
pub use validator::{IdValidator, NullValidator, ScanEntityValidator};
