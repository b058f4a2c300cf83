//! The digest builder: buckets an ordered entry stream and digests each bucket.
//!
//! The builder starts `Open` and accepts entries in collation order. The first
//! read seals it: every bucket is finalised into an aggregate entry and all
//! later writes fail with [`ScanError::SealedBucket`]. A digest that has left
//! the builder can therefore never be invalidated by a late write.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::aggregation::Aggregation;
use crate::collation::{AsciiCollation, Collation};
use crate::config::DigestConfig;
use crate::entry::{Attributes, ScanResultEntry};
use crate::error::{ConfigError, ScanError};

/// Hash applied to the concatenated version tokens of a bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// MD5, hex encoded. What existing participants publish.
    #[default]
    Md5,
    /// Blake3, hex encoded.
    Blake3,
}

impl DigestAlgorithm {
    /// One-shot hex digest of `data`.
    pub fn hex_digest(self, data: &[u8]) -> String {
        let mut hasher = BucketHasher::new(self);
        hasher.update(data);
        hasher.finalize_hex()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "md5" => Ok(DigestAlgorithm::Md5),
            "blake3" => Ok(DigestAlgorithm::Blake3),
            other => Err(ConfigError::UnknownDigestAlgorithm(other.to_string())),
        }
    }
}

/// Running hash over a bucket's version tokens, fed in arrival order.
enum BucketHasher {
    Md5(Md5),
    Blake3(Box<blake3::Hasher>),
}

impl BucketHasher {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Md5 => BucketHasher::Md5(Md5::new()),
            DigestAlgorithm::Blake3 => BucketHasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            BucketHasher::Md5(h) => h.update(data),
            BucketHasher::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            BucketHasher::Md5(h) => hex::encode(h.finalize()),
            BucketHasher::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

enum BuilderState {
    Open(BTreeMap<Attributes, BucketHasher>),
    Sealed(Vec<ScanResultEntry>),
}

/// Builds per-bucket digests from an ordered stream of entries.
///
/// Single use: writes are accepted until the first call to
/// [`to_digests`](Self::to_digests), after which the builder only answers reads.
pub struct DigestBuilder {
    aggregations: Vec<Aggregation>,
    collation: Box<dyn Collation>,
    algorithm: DigestAlgorithm,
    last_id: Option<String>,
    entry_count: usize,
    state: BuilderState,
}

impl DigestBuilder {
    /// Create a builder with ASCII id ordering and MD5 digests.
    pub fn new(aggregations: Vec<Aggregation>) -> Result<Self, ConfigError> {
        Self::with_collation(aggregations, Box::new(AsciiCollation))
    }

    /// Create a builder that validates ids against `collation`.
    ///
    /// Each attribute may be governed by at most one aggregation.
    pub fn with_collation(
        aggregations: Vec<Aggregation>,
        collation: Box<dyn Collation>,
    ) -> Result<Self, ConfigError> {
        if let Some(attribute) = duplicate_attribute(&aggregations) {
            return Err(ConfigError::DuplicateAggregation { attribute });
        }
        Ok(Self {
            aggregations,
            collation,
            algorithm: DigestAlgorithm::default(),
            last_id: None,
            entry_count: 0,
            state: BuilderState::Open(BTreeMap::new()),
        })
    }

    /// Create a builder from configuration.
    pub fn from_config(
        aggregations: Vec<Aggregation>,
        config: &DigestConfig,
    ) -> Result<Self, ConfigError> {
        let collation = config.collation.build()?;
        Ok(Self::with_collation(aggregations, collation)?.algorithm(config.algorithm))
    }

    /// Select the digest algorithm.
    pub fn algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// The configured aggregations.
    pub fn aggregations(&self) -> &[Aggregation] {
        &self.aggregations
    }

    /// Whether digests have been read.
    pub fn is_sealed(&self) -> bool {
        matches!(self.state, BuilderState::Sealed(_))
    }

    /// Number of non-empty buckets.
    pub fn bucket_count(&self) -> usize {
        match &self.state {
            BuilderState::Open(buckets) => buckets.len(),
            BuilderState::Sealed(digests) => digests.len(),
        }
    }

    /// Number of entries accepted so far.
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Add a raw entity by its parts.
    pub fn add_entity(
        &mut self,
        id: impl Into<String>,
        attributes: Attributes,
        version: impl Into<String>,
    ) -> Result<(), ScanError> {
        self.add(&ScanResultEntry::for_entity(id, version, None, attributes))
    }

    /// Add one entry to its bucket.
    ///
    /// On error the entry is not incorporated and the builder is unchanged.
    pub fn add(&mut self, entry: &ScanResultEntry) -> Result<(), ScanError> {
        if self.is_sealed() {
            return Err(ScanError::SealedBucket);
        }

        if let (Some(previous), Some(current)) = (&self.last_id, &entry.id) {
            if !self.collation.in_order(previous, current) {
                tracing::warn!(
                    "Rejecting out-of-order id {:?} after {:?} ({} collation)",
                    current,
                    previous,
                    self.collation.name()
                );
                return Err(ScanError::OutOfOrder {
                    previous: previous.clone(),
                    current: current.clone(),
                });
            }
        }

        let key = bucket_key(&self.aggregations, &entry.attributes)?;

        let buckets = match &mut self.state {
            BuilderState::Open(buckets) => buckets,
            BuilderState::Sealed(_) => return Err(ScanError::SealedBucket),
        };
        let algorithm = self.algorithm;
        buckets
            .entry(key)
            .or_insert_with(|| BucketHasher::new(algorithm))
            .update(entry.version.as_bytes());

        if let Some(id) = &entry.id {
            self.last_id = Some(id.clone());
        }
        self.entry_count += 1;
        Ok(())
    }

    /// Seal the builder (first call only) and return one aggregate entry per bucket.
    ///
    /// Entries are ordered by bucket attributes. Repeated calls return equal results.
    pub fn to_digests(&mut self) -> Vec<ScanResultEntry> {
        if let BuilderState::Open(buckets) = &mut self.state {
            let buckets = std::mem::take(buckets);
            tracing::debug!(
                "Sealing digest builder: {} buckets from {} entries",
                buckets.len(),
                self.entry_count
            );
            let digests = buckets
                .into_iter()
                .map(|(key, hasher)| ScanResultEntry::for_aggregate(hasher.finalize_hex(), key))
                .collect();
            self.state = BuilderState::Sealed(digests);
        }

        match &self.state {
            BuilderState::Sealed(digests) => digests.clone(),
            BuilderState::Open(_) => Vec::new(),
        }
    }

    /// Consume the builder, sealing it.
    pub fn seal(mut self) -> SealedDigests {
        let entries = self.to_digests();
        SealedDigests {
            algorithm: self.algorithm,
            entries,
        }
    }
}

impl fmt::Debug for DigestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestBuilder")
            .field("aggregations", &self.aggregations)
            .field("collation", &self.collation.name())
            .field("algorithm", &self.algorithm)
            .field("sealed", &self.is_sealed())
            .field("buckets", &self.bucket_count())
            .field("entries", &self.entry_count)
            .finish()
    }
}

fn duplicate_attribute(aggregations: &[Aggregation]) -> Option<String> {
    let mut seen = HashSet::new();
    aggregations
        .iter()
        .map(Aggregation::attribute_name)
        .find(|name| !seen.insert(*name))
        .map(str::to_string)
}

/// Derive the composite bucket key for an attribute map.
///
/// Aggregated attributes are replaced by their labels; every other attribute
/// is carried into the key unchanged.
fn bucket_key(aggregations: &[Aggregation], attributes: &Attributes) -> Result<Attributes, ScanError> {
    let mut key = attributes.clone();
    for aggregation in aggregations {
        let name = aggregation.attribute_name();
        let raw = attributes.get(name).ok_or_else(|| ScanError::MissingAttribute {
            attribute: name.to_string(),
        })?;
        let label = aggregation.derive_label(raw, aggregation.parent())?;
        key.insert(name.to_string(), label);
    }
    Ok(key)
}

/// The immutable result of sealing a builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedDigests {
    algorithm: DigestAlgorithm,
    entries: Vec<ScanResultEntry>,
}

impl SealedDigests {
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn digests(&self) -> &[ScanResultEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the digest of the bucket with exactly these attributes.
    pub fn digest_for(&self, attributes: &Attributes) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| &e.attributes == attributes)
            .map(|e| e.version.as_str())
    }

    pub fn into_entries(self) -> Vec<ScanResultEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::DateGranularity;
    use crate::collation::CollationKind;

    const JUN_6_2009_1: &str = "2009-06-06T12:45:12.000Z";
    const JUN_6_2009_2: &str = "2009-06-06T15:32:16.000Z";
    const JUN_7_2009_1: &str = "2009-06-07T13:51:31.000Z";

    fn biz_date() -> Aggregation {
        Aggregation::date("bizDate", DateGranularity::Daily, Some("2009-06".into()))
    }

    fn some_string() -> Aggregation {
        Aggregation::by_name("someString", None)
    }

    fn aggregations() -> Vec<Aggregation> {
        vec![biz_date(), some_string()]
    }

    fn attrs(biz_date: &str, some_string: &str) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("bizDate".into(), biz_date.into());
        attrs.insert("someString".into(), some_string.into());
        attrs
    }

    fn md5_hex(s: &str) -> String {
        hex::encode(Md5::digest(s.as_bytes()))
    }

    fn expected_buckets() -> HashSet<ScanResultEntry> {
        HashSet::from([
            ScanResultEntry::for_aggregate(md5_hex("vsn1vsn4"), attrs("2009-06-06", "a")),
            ScanResultEntry::for_aggregate(md5_hex("vsn2"), attrs("2009-06-07", "b")),
            ScanResultEntry::for_aggregate(md5_hex("vsn3"), attrs("2009-06-06", "c")),
        ])
    }

    fn feed_standard(builder: &mut DigestBuilder) {
        builder.add_entity("id1", attrs(JUN_6_2009_1, "a"), "vsn1").unwrap();
        builder.add_entity("id2", attrs(JUN_7_2009_1, "b"), "vsn2").unwrap();
        builder.add_entity("id3", attrs(JUN_6_2009_2, "c"), "vsn3").unwrap();
        builder.add_entity("id4", attrs(JUN_6_2009_2, "a"), "vsn4").unwrap();
    }

    #[test]
    fn test_empty_input_yields_no_digests() {
        let mut builder = DigestBuilder::new(aggregations()).unwrap();
        assert!(builder.to_digests().is_empty());
        assert!(builder.is_sealed());
    }

    #[test]
    fn test_observes_all_aggregation_factors() {
        let mut builder = DigestBuilder::new(aggregations()).unwrap();
        feed_standard(&mut builder);

        let digests: HashSet<_> = builder.to_digests().into_iter().collect();
        assert_eq!(digests, expected_buckets());
    }

    #[test]
    fn test_observes_attributes_that_are_not_aggregation_factors() {
        let mut builder = DigestBuilder::new(vec![biz_date()]).unwrap();
        feed_standard(&mut builder);

        let digests: HashSet<_> = builder.to_digests().into_iter().collect();
        assert_eq!(digests, expected_buckets());
    }

    #[test]
    fn test_add_via_scan_result_entries() {
        let mut builder = DigestBuilder::new(aggregations()).unwrap();
        for (id, vsn, date, s) in [
            ("id1", "vsn1", JUN_6_2009_1, "a"),
            ("id2", "vsn2", JUN_7_2009_1, "b"),
            ("id3", "vsn3", JUN_6_2009_2, "c"),
            ("id4", "vsn4", JUN_6_2009_2, "a"),
        ] {
            builder
                .add(&ScanResultEntry::for_entity(id, vsn, None, attrs(date, s)))
                .unwrap();
        }

        let digests: HashSet<_> = builder.to_digests().into_iter().collect();
        assert_eq!(digests, expected_buckets());
    }

    #[test]
    fn test_buckets_sealed_after_query() {
        let mut builder = DigestBuilder::new(aggregations()).unwrap();
        builder.add_entity("id0", attrs(JUN_6_2009_1, "a"), "vsn0").unwrap();

        builder.to_digests();

        let result = builder.add_entity("id1", attrs(JUN_6_2009_1, "a"), "vsn1");
        assert_eq!(result, Err(ScanError::SealedBucket));
    }

    #[test]
    fn test_sealing_covers_buckets_that_did_not_exist() {
        let mut builder = DigestBuilder::new(aggregations()).unwrap();
        builder.add_entity("id0", attrs(JUN_6_2009_1, "a"), "vsn0").unwrap();
        builder.to_digests();

        let result = builder.add_entity("id1", attrs(JUN_7_2009_1, "zzz"), "vsn1");
        assert_eq!(result, Err(ScanError::SealedBucket));
        assert_eq!(builder.bucket_count(), 1);
        assert_eq!(builder.entry_count(), 1);
    }

    #[test]
    fn test_sealing_an_empty_builder() {
        let mut builder = DigestBuilder::new(aggregations()).unwrap();
        builder.to_digests();
        assert_eq!(
            builder.add_entity("id1", attrs(JUN_6_2009_1, "a"), "vsn1"),
            Err(ScanError::SealedBucket)
        );
    }

    #[test]
    fn test_to_digests_is_idempotent() {
        let mut builder = DigestBuilder::new(aggregations()).unwrap();
        feed_standard(&mut builder);

        let first = builder.to_digests();
        let second = builder.to_digests();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_rejects_out_of_order_ids() {
        let mut builder = DigestBuilder::new(aggregations()).unwrap();
        builder.add_entity("id2", attrs(JUN_7_2009_1, "b"), "vsn2").unwrap();

        let result = builder.add_entity("id1", attrs(JUN_6_2009_1, "a"), "vsn1");
        assert_eq!(
            result,
            Err(ScanError::OutOfOrder {
                previous: "id2".into(),
                current: "id1".into(),
            })
        );

        // the rejected entry left no trace
        assert_eq!(builder.entry_count(), 1);
        builder.add_entity("id3", attrs(JUN_6_2009_1, "a"), "vsn3").unwrap();
        let digests = builder.to_digests();
        assert_eq!(digests.len(), 2);
    }

    #[test]
    fn test_equal_ids_are_in_order() {
        let mut builder = DigestBuilder::new(aggregations()).unwrap();
        builder.add_entity("id1", attrs(JUN_6_2009_1, "a"), "v1").unwrap();
        builder.add_entity("id1", attrs(JUN_6_2009_1, "a"), "v2").unwrap();
        assert_eq!(builder.entry_count(), 2);
    }

    #[test]
    fn test_collation_scenarios() {
        let scenarios = [
            (CollationKind::Unicode, ["bar", "Foo"], ["Far", "boo"]),
            (CollationKind::Ascii, ["Bar", "Foo"], ["far", "boo"]),
        ];

        for (kind, okay, failing) in scenarios {
            let mut builder = DigestBuilder::with_collation(aggregations(), kind.build().unwrap()).unwrap();
            for id in okay {
                builder
                    .add_entity(id, attrs(JUN_7_2009_1, "b"), format!("vsn{id}"))
                    .unwrap_or_else(|e| panic!("{kind} should accept {okay:?}: {e}"));
            }

            let mut builder = DigestBuilder::with_collation(aggregations(), kind.build().unwrap()).unwrap();
            let outcome = failing
                .iter()
                .try_for_each(|id| builder.add_entity(*id, attrs(JUN_7_2009_1, "b"), format!("vsn{id}")));
            assert!(
                matches!(outcome, Err(ScanError::OutOfOrder { .. })),
                "{kind} should reject {failing:?}"
            );
        }
    }

    #[test]
    fn test_aggregate_entries_skip_ordering_and_rebucket() {
        let monthly = Aggregation::date("bizDate", DateGranularity::Monthly, None);
        let mut builder = DigestBuilder::new(vec![monthly]).unwrap();

        let mut a = Attributes::new();
        a.insert("bizDate".into(), "2009-06-07".into());
        let mut b = Attributes::new();
        b.insert("bizDate".into(), "2009-06-06".into());

        builder.add(&ScanResultEntry::for_aggregate("d1", a)).unwrap();
        builder.add(&ScanResultEntry::for_aggregate("d2", b)).unwrap();

        let digests = builder.to_digests();
        let mut key = Attributes::new();
        key.insert("bizDate".into(), "2009-06".into());
        assert_eq!(digests, vec![ScanResultEntry::for_aggregate(md5_hex("d1d2"), key)]);
    }

    #[test]
    fn test_arrival_order_matters() {
        let mut forward = DigestBuilder::new(vec![biz_date()]).unwrap();
        forward.add_entity("a", attrs(JUN_6_2009_1, "x"), "v1").unwrap();
        forward.add_entity("b", attrs(JUN_6_2009_1, "x"), "v2").unwrap();

        let mut reverse = DigestBuilder::new(vec![biz_date()]).unwrap();
        reverse.add_entity("a", attrs(JUN_6_2009_1, "x"), "v2").unwrap();
        reverse.add_entity("b", attrs(JUN_6_2009_1, "x"), "v1").unwrap();

        assert_ne!(forward.to_digests(), reverse.to_digests());
    }

    #[test]
    fn test_malformed_value_does_not_corrupt_state() {
        let count = Aggregation::integer("count", "10s".parse().unwrap(), None);
        let mut builder = DigestBuilder::new(vec![count]).unwrap();

        let entry = |id: &str, n: &str, v: &str| {
            let mut a = Attributes::new();
            a.insert("count".into(), n.into());
            ScanResultEntry::for_entity(id, v, None, a)
        };

        builder.add(&entry("id1", "12", "v1")).unwrap();
        let err = builder.add(&entry("id5", "twelve", "v2")).unwrap_err();
        assert!(matches!(err, ScanError::MalformedValue { .. }));

        // the failed entry did not advance the id watermark
        builder.add(&entry("id2", "15", "v3")).unwrap();

        let digests = builder.to_digests();
        assert_eq!(digests.len(), 1);
        assert_eq!(digests[0].version, md5_hex("v1v3"));
        assert_eq!(digests[0].attribute("count"), Some("10"));
    }

    #[test]
    fn test_missing_aggregated_attribute() {
        let mut builder = DigestBuilder::new(aggregations()).unwrap();
        let mut a = Attributes::new();
        a.insert("bizDate".into(), JUN_6_2009_1.into());
        let err = builder.add_entity("id1", a, "v1").unwrap_err();
        assert_eq!(
            err,
            ScanError::MissingAttribute {
                attribute: "someString".into()
            }
        );
    }

    #[test]
    fn test_blake3_algorithm() {
        let mut builder = DigestBuilder::new(vec![biz_date()]).unwrap().algorithm(DigestAlgorithm::Blake3);
        builder.add_entity("id1", attrs(JUN_6_2009_1, "a"), "vsn1").unwrap();
        builder.add_entity("id2", attrs(JUN_6_2009_2, "a"), "vsn4").unwrap();

        let sealed = builder.seal();
        assert_eq!(sealed.algorithm(), DigestAlgorithm::Blake3);
        assert_eq!(
            sealed.digest_for(&attrs("2009-06-06", "a")),
            Some(blake3::hash(b"vsn1vsn4").to_hex().as_str())
        );
    }

    #[test]
    fn test_seal_consumes_builder() {
        let mut builder = DigestBuilder::new(aggregations()).unwrap();
        feed_standard(&mut builder);
        let sealed = builder.seal();
        assert_eq!(sealed.len(), 3);
        assert!(!sealed.is_empty());
        assert_eq!(
            sealed.digest_for(&attrs("2009-06-07", "b")),
            Some(md5_hex("vsn2").as_str())
        );
        assert_eq!(sealed.into_entries().len(), 3);
    }

    #[test]
    fn test_from_config() {
        let config = DigestConfig {
            collation: CollationKind::Unicode,
            algorithm: DigestAlgorithm::Blake3,
        };
        let mut builder = DigestBuilder::from_config(aggregations(), &config).unwrap();
        builder.add_entity("bar", attrs(JUN_6_2009_1, "a"), "v1").unwrap();
        builder.add_entity("Foo", attrs(JUN_6_2009_1, "a"), "v2").unwrap();
        assert!(format!("{builder:?}").contains("unicode"));
    }

    #[test]
    fn test_rejects_two_aggregations_on_one_attribute() {
        let err = DigestBuilder::new(vec![
            biz_date(),
            some_string(),
            Aggregation::date("bizDate", DateGranularity::Monthly, None),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateAggregation {
                attribute: "bizDate".into()
            }
        );

        let config = DigestConfig::default();
        assert!(DigestBuilder::from_config(vec![some_string(), some_string()], &config).is_err());
    }

    #[test]
    fn test_digest_algorithm_parse() {
        assert_eq!("md5".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Md5);
        assert_eq!("blake3".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Blake3);
        assert!("sha1".parse::<DigestAlgorithm>().is_err());
        assert_eq!(
            DigestAlgorithm::Md5.hex_digest(b""),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }
}
