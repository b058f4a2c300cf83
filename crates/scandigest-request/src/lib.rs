//! # scandigest request
//!
//! Translates request parameters into the aggregations a digest builder
//! should apply. Parameters are namespaced per attribute:
//!
//! - `<attr>-granularity`: `by-name` for literal grouping, otherwise a date
//!   (`yearly`, `monthly`, `daily`, `individual`) or integer (`10s`, `100s`, ...)
//!   granularity, depending on the attribute's declared type
//! - `<attr>-offset`: one or more prefix lengths, selecting string-prefix grouping
//! - `<attr>-parent`: descriptive scope attached to the aggregation
//!
//! ```rust
//! use scandigest_request::{AggregationBuilder, AttributeType, QueryParameters};
//!
//! let params = QueryParameters::parse("bizDate-granularity=daily&name-offset=1&name-offset=3");
//! let mut builder = AggregationBuilder::new(&params);
//! builder.maybe_add("bizDate", AttributeType::DateTime).unwrap();
//! builder.maybe_add("name", AttributeType::String).unwrap();
//! builder.maybe_add("count", AttributeType::Integer).unwrap();
//!
//! assert_eq!(builder.to_list().len(), 2);
//! ```

pub mod builder;
pub mod error;
pub mod params;

pub use builder::{AggregationBuilder, AttributeType};
pub use error::{RequestError, Result};
pub use params::{QueryParameters, RequestParameters};
