//! One-call orchestration: aggregations plus an entry stream in, digests out.

use std::io::{Read, Write};

use scandigest_core::{Aggregation, DigestBuilder, DigestConfig, ScanResultEntry};
use scandigest_request::{AggregationBuilder, AttributeType, RequestParameters};
use scandigest_wire::{read_entries, write_query_result, IdValidator};

use crate::error::Result;

/// Digests whole scans with a fixed set of aggregations.
///
/// Each call runs a fresh [`DigestBuilder`], so one digester can serve any
/// number of scans.
#[derive(Debug, Clone)]
pub struct ScanDigester {
    config: DigestConfig,
    aggregations: Vec<Aggregation>,
}

impl ScanDigester {
    pub fn new(config: DigestConfig, aggregations: Vec<Aggregation>) -> Self {
        Self {
            config,
            aggregations,
        }
    }

    /// Build the aggregations from request parameters.
    ///
    /// `attributes` declares every attribute the endpoint exposes and its type.
    /// Attributes with no matching parameters are passed through unaggregated.
    pub fn from_request<P>(
        params: &P,
        attributes: &[(&str, AttributeType)],
        config: DigestConfig,
    ) -> Result<Self>
    where
        P: RequestParameters + ?Sized,
    {
        let mut builder = AggregationBuilder::new(params);
        for (name, attr_type) in attributes {
            builder.maybe_add(name, *attr_type)?;
        }
        Ok(Self::new(config, builder.into_list()))
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    pub fn aggregations(&self) -> &[Aggregation] {
        &self.aggregations
    }

    /// A fresh, open builder for this digester's configuration.
    pub fn builder(&self) -> Result<DigestBuilder> {
        Ok(DigestBuilder::from_config(
            self.aggregations.clone(),
            &self.config,
        )?)
    }

    /// Digest an ordered stream of entries, stopping at the first rejected entry.
    pub fn digest<I>(&self, entries: I) -> Result<Vec<ScanResultEntry>>
    where
        I: IntoIterator<Item = ScanResultEntry>,
    {
        let mut builder = self.builder()?;
        tracing::debug!(
            "Digesting scan with {} aggregations ({} collation, {})",
            self.aggregations.len(),
            self.config.collation,
            self.config.algorithm
        );
        for entry in entries {
            builder.add(&entry)?;
        }
        Ok(builder.to_digests())
    }

    /// Read JSON entries, digest them, and write the digests as a JSON array.
    ///
    /// The input may be an array or a single bare entry object. Returns the
    /// number of digests written.
    pub fn digest_json<R: Read, W: Write>(&self, reader: R, writer: W) -> Result<usize> {
        let entries = read_entries(reader, &IdValidator)?;
        let digests = self.digest(entries)?;
        write_query_result(writer, &digests)?;
        Ok(digests.len())
    }
}
