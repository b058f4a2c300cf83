//! JSON encoding of entry collections.
//!
//! A query result is a JSON array of entries. Entities carry `id`, `version`,
//! optional `lastUpdated` and `attributes`; aggregates omit `id` and
//! `lastUpdated` and carry the bucket digest in `version`.

use std::cell::Cell;
use std::fmt;
use std::io::{Read, Write};

use scandigest_core::ScanResultEntry;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::error::{Result, WireError};
use crate::validator::ScanEntityValidator;

/// Write entries as a compact JSON array.
pub fn write_query_result<W: Write>(writer: W, entries: &[ScanResultEntry]) -> Result<()> {
    serde_json::to_writer(writer, entries)?;
    Ok(())
}

/// Render entries as a pretty-printed JSON array.
pub fn format_query_result(entries: &[ScanResultEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Read a JSON array of entries, passing each through `validator`.
///
/// Entries are validated as they are parsed, so a rejection stops the read
/// before the rest of the document is consumed.
pub fn read_query_result<R, V>(reader: R, validator: &V) -> Result<Vec<ScanResultEntry>>
where
    R: Read,
    V: ScanEntityValidator + ?Sized,
{
    let entries = read_collection(reader, validator, false)?;
    tracing::info!("Read query result with {} entries", entries.len());
    Ok(entries)
}

/// Read either an array of entries or a single bare entry object.
pub fn read_entries<R, V>(reader: R, validator: &V) -> Result<Vec<ScanResultEntry>>
where
    R: Read,
    V: ScanEntityValidator + ?Sized,
{
    let entries = read_collection(reader, validator, true)?;
    tracing::debug!("Read {} entries", entries.len());
    Ok(entries)
}

fn read_collection<R, V>(reader: R, validator: &V, allow_object: bool) -> Result<Vec<ScanResultEntry>>
where
    R: Read,
    V: ScanEntityValidator + ?Sized,
{
    let failure = Cell::new(None);
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    let result = deserializer.deserialize_any(EntryCollection {
        validator,
        allow_object,
        failure: &failure,
    });
    // a validator or shape failure is reported as itself, not as the JSON
    // error used to unwind the parser
    if let Some(err) = failure.take() {
        return Err(err);
    }
    let entries = result?;
    deserializer.end()?;
    Ok(entries)
}

/// Visits a top-level JSON value, deserialising and validating one entry at a time.
struct EntryCollection<'a, V: ?Sized> {
    validator: &'a V,
    allow_object: bool,
    failure: &'a Cell<Option<WireError>>,
}

impl<V: ScanEntityValidator + ?Sized> EntryCollection<'_, V> {
    fn fail<E: de::Error>(&self, err: WireError) -> E {
        let message = err.to_string();
        self.failure.set(Some(err));
        E::custom(message)
    }

    fn check<E: de::Error>(&self, entry: &ScanResultEntry) -> std::result::Result<(), E> {
        self.validator.process(entry).map_err(|err| self.fail(err))
    }
}

impl<'de, V: ScanEntityValidator + ?Sized> Visitor<'de> for EntryCollection<'_, V> {
    type Value = Vec<ScanResultEntry>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON array of scan result entries")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(entry) = seq.next_element::<ScanResultEntry>()? {
            self.check(&entry)?;
            entries.push(entry);
        }
        Ok(entries)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> std::result::Result<Self::Value, A::Error> {
        if !self.allow_object {
            return Err(self.fail(WireError::ExpectedArray("object")));
        }
        let entry = ScanResultEntry::deserialize(de::value::MapAccessDeserializer::new(map))?;
        self.check(&entry)?;
        Ok(vec![entry])
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Err(self.fail(WireError::ExpectedArray("null")))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> std::result::Result<Self::Value, E> {
        Err(self.fail(WireError::ExpectedArray("boolean")))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> std::result::Result<Self::Value, E> {
        Err(self.fail(WireError::ExpectedArray("number")))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> std::result::Result<Self::Value, E> {
        Err(self.fail(WireError::ExpectedArray("number")))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> std::result::Result<Self::Value, E> {
        Err(self.fail(WireError::ExpectedArray("number")))
    }

    fn visit_str<E: de::Error>(self, _: &str) -> std::result::Result<Self::Value, E> {
        Err(self.fail(WireError::ExpectedArray("string")))
    }
}
