//! Scan result entries: the unit of input and output of the digest builder.
//!
//! An entry is either a raw entity (id, version, optional last-updated time
//! and attributes) or an aggregate (a digest over a bucket plus the bucket's
//! attribute labels). Both share one representation; an aggregate simply has
//! no id and carries the digest in `version`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute name to value mapping. Ordered so equal maps hash and compare equal.
pub type Attributes = BTreeMap<String, String>;

/// A single scan result, raw or aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResultEntry {
    /// Entity id. Absent for aggregates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Entity version token, or the bucket digest for aggregates.
    pub version: String,

    /// When the entity last changed, if the participant reports it.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rfc3339_millis"
    )]
    pub last_updated: Option<DateTime<Utc>>,

    /// Entity attributes, or bucket labels for aggregates.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

impl ScanResultEntry {
    /// A raw entity entry.
    pub fn for_entity(
        id: impl Into<String>,
        version: impl Into<String>,
        last_updated: Option<DateTime<Utc>>,
        attributes: Attributes,
    ) -> Self {
        Self {
            id: Some(id.into()),
            version: version.into(),
            last_updated,
            attributes,
        }
    }

    /// An aggregate entry: a bucket digest and its attribute labels.
    pub fn for_aggregate(digest: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: None,
            version: digest.into(),
            last_updated: None,
            attributes,
        }
    }

    /// Whether this entry is in aggregate form.
    pub fn is_aggregate(&self) -> bool {
        self.id.is_none()
    }

    /// The digest carried by an aggregate entry.
    pub fn digest(&self) -> Option<&str> {
        self.is_aggregate().then_some(self.version.as_str())
    }

    /// Look up one attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Serde adapter rendering timestamps as RFC 3339 UTC with millisecond precision.
mod rfc3339_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(t) => serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(D::Error::custom)
        })
        .transpose()
    }
}
