//! Test fixtures and helpers.
//!
//! Common setup code for unit and integration tests.

use scandigest_core::{
    Aggregation, Attributes, Collation, DateGranularity, DigestBuilder, ScanError,
    ScanResultEntry,
};

/// Build an attribute map from pairs.
pub fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Build a raw entity entry with no last-updated time.
pub fn entity(id: &str, version: &str, pairs: &[(&str, &str)]) -> ScanResultEntry {
    ScanResultEntry::for_entity(id, version, None, attrs(pairs))
}

/// An ordered scan ready to be digested.
#[derive(Debug, Clone)]
pub struct ScanFixture {
    pub entries: Vec<ScanResultEntry>,
}

impl ScanFixture {
    /// Four entities over two days with a secondary `someString` attribute.
    ///
    /// | id  | version | bizDate                  | someString |
    /// |-----|---------|--------------------------|------------|
    /// | id1 | vsn1    | 2009-06-06T12:45:12.000Z | a          |
    /// | id2 | vsn2    | 2009-06-07T10:15:00.000Z | b          |
    /// | id3 | vsn3    | 2009-06-06T13:45:12.000Z | c          |
    /// | id4 | vsn4    | 2009-06-06T14:45:12.000Z | a          |
    pub fn standard() -> Self {
        Self {
            entries: vec![
                entity("id1", "vsn1", &[("bizDate", "2009-06-06T12:45:12.000Z"), ("someString", "a")]),
                entity("id2", "vsn2", &[("bizDate", "2009-06-07T10:15:00.000Z"), ("someString", "b")]),
                entity("id3", "vsn3", &[("bizDate", "2009-06-06T13:45:12.000Z"), ("someString", "c")]),
                entity("id4", "vsn4", &[("bizDate", "2009-06-06T14:45:12.000Z"), ("someString", "a")]),
            ],
        }
    }

    /// An ordered scan built from `(id, version)` pairs with no attributes.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            entries: pairs.iter().map(|(id, v)| entity(id, v, &[])).collect(),
        }
    }

    /// Daily on `bizDate`, by name on `someString`.
    pub fn daily_and_by_name() -> Vec<Aggregation> {
        vec![
            Aggregation::date("bizDate", DateGranularity::Daily, None),
            Aggregation::by_name("someString", None),
        ]
    }

    /// Daily on `bizDate` only; `someString` passes through.
    pub fn daily_only() -> Vec<Aggregation> {
        vec![Aggregation::date("bizDate", DateGranularity::Daily, None)]
    }

    /// Feed every entry to `builder`, stopping at the first error.
    pub fn feed(&self, builder: &mut DigestBuilder) -> Result<(), ScanError> {
        self.entries.iter().try_for_each(|e| builder.add(e))
    }

    /// Digest the scan with the default collation and algorithm.
    ///
    /// Panics if two aggregations govern the same attribute.
    pub fn digest(&self, aggregations: Vec<Aggregation>) -> Result<Vec<ScanResultEntry>, ScanError> {
        let mut builder =
            DigestBuilder::new(aggregations).expect("fixture aggregations are disjoint");
        self.feed(&mut builder)?;
        Ok(builder.to_digests())
    }

    /// Digest the scan, validating ids against `collation`.
    pub fn digest_with(
        &self,
        aggregations: Vec<Aggregation>,
        collation: Box<dyn Collation>,
    ) -> Result<Vec<ScanResultEntry>, ScanError> {
        let mut builder = DigestBuilder::with_collation(aggregations, collation)
            .expect("fixture aggregations are disjoint");
        self.feed(&mut builder)?;
        Ok(builder.to_digests())
    }
}
