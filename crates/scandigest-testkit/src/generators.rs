//! Proptest generators for property-based testing.

use proptest::prelude::*;

use scandigest_core::{Attributes, ScanResultEntry};

/// Generate an opaque version token.
pub fn version() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}".prop_map(String::from)
}

/// Generate a calendar date in `YYYY-MM-DD` form.
pub fn date_value() -> impl Strategy<Value = String> {
    (1990i32..2030, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| format!("{y:04}-{m:02}-{d:02}"))
}

/// Generate a timestamp in RFC 3339 UTC form with milliseconds.
pub fn timestamp_value() -> impl Strategy<Value = String> {
    (date_value(), 0u32..24, 0u32..60, 0u32..60, 0u32..1000)
        .prop_map(|(date, h, m, s, ms)| format!("{date}T{h:02}:{m:02}:{s:02}.{ms:03}Z"))
}

/// Generate a short category value from a small alphabet, so buckets collide.
pub fn category() -> impl Strategy<Value = String> {
    "[a-c]".prop_map(String::from)
}

/// Generate distinct ids sorted in byte order.
pub fn sorted_ids(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[A-Za-z0-9]{1,10}", 0..=max_len)
        .prop_map(|ids| ids.into_iter().collect())
}

/// Generate a scan whose ids are strictly ascending under ASCII collation.
///
/// Every entry carries a `bizDate` timestamp and a `someString` category.
pub fn ordered_scan(max_len: usize) -> impl Strategy<Value = Vec<ScanResultEntry>> {
    sorted_ids(max_len)
        .prop_flat_map(|ids| {
            let rows = prop::collection::vec((version(), timestamp_value(), category()), ids.len());
            (Just(ids), rows)
        })
        .prop_map(|(ids, rows)| {
            ids.into_iter()
                .zip(rows)
                .map(|(id, (version, date, category))| {
                    let mut attributes = Attributes::new();
                    attributes.insert("bizDate".into(), date);
                    attributes.insert("someString".into(), category);
                    ScanResultEntry::for_entity(id, version, None, attributes)
                })
                .collect()
        })
}

/// An ordered scan plus a chunk size for splitting it into batches.
#[derive(Debug, Clone)]
pub struct ScanParams {
    pub entries: Vec<ScanResultEntry>,
    pub chunk_size: usize,
}

impl Arbitrary for ScanParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (ordered_scan(48), 1usize..=8)
            .prop_map(|(entries, chunk_size)| ScanParams {
                entries,
                chunk_size,
            })
            .boxed()
    }
}
