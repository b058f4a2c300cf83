//! Aggregations: per-attribute functions from a raw value to a bucket label.
//!
//! Each aggregation governs one attribute name. A builder configured with
//! several aggregations over distinct attributes derives one label per
//! aggregation and combines them into a composite bucket key.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, ScanError};

/// The token that selects by-name grouping in request parameters.
pub const BY_NAME_GRANULARITY: &str = "by-name";

/// A bucketing rule for one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Aggregation {
    Date(DateAggregation),
    Integer(IntegerAggregation),
    ByName(ByNameAggregation),
    StringPrefix(StringPrefixAggregation),
}

impl Aggregation {
    /// Date aggregation at the given granularity.
    pub fn date(
        attribute: impl Into<String>,
        granularity: DateGranularity,
        parent: Option<String>,
    ) -> Self {
        Aggregation::Date(DateAggregation::new(attribute, granularity, parent))
    }

    /// Integer range aggregation at the given granularity.
    pub fn integer(
        attribute: impl Into<String>,
        granularity: IntegerGranularity,
        parent: Option<String>,
    ) -> Self {
        Aggregation::Integer(IntegerAggregation::new(attribute, granularity, parent))
    }

    /// Literal grouping on the attribute value.
    pub fn by_name(attribute: impl Into<String>, parent: Option<String>) -> Self {
        Aggregation::ByName(ByNameAggregation::new(attribute, parent))
    }

    /// Prefix aggregation over one or more tiers of offsets.
    pub fn string_prefix(
        attribute: impl Into<String>,
        parent: Option<String>,
        offsets: Vec<usize>,
    ) -> Result<Self, ConfigError> {
        Ok(Aggregation::StringPrefix(StringPrefixAggregation::new(
            attribute, parent, offsets,
        )?))
    }

    /// The attribute this aggregation governs.
    pub fn attribute_name(&self) -> &str {
        match self {
            Aggregation::Date(a) => &a.attribute,
            Aggregation::Integer(a) => &a.attribute,
            Aggregation::ByName(a) => &a.attribute,
            Aggregation::StringPrefix(a) => &a.attribute,
        }
    }

    /// The descriptive parent scope, if any.
    pub fn parent(&self) -> Option<&str> {
        match self {
            Aggregation::Date(a) => a.parent.as_deref(),
            Aggregation::Integer(a) => a.parent.as_deref(),
            Aggregation::ByName(a) => a.parent.as_deref(),
            Aggregation::StringPrefix(a) => a.parent.as_deref(),
        }
    }

    /// Map a raw attribute value to its bucket label.
    ///
    /// `parent_context` is carried for callers that want to log or display the
    /// scope a label belongs to. It never changes the label.
    pub fn derive_label(&self, raw: &str, _parent_context: Option<&str>) -> Result<String, ScanError> {
        match self {
            Aggregation::Date(a) => a.label(raw),
            Aggregation::Integer(a) => a.label(raw),
            Aggregation::ByName(_) => Ok(raw.to_string()),
            Aggregation::StringPrefix(a) => Ok(a.label(raw)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Date
// ─────────────────────────────────────────────────────────────────────────────

/// Quantization levels for date aggregation, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateGranularity {
    Yearly,
    Monthly,
    Daily,
    Individual,
}

impl DateGranularity {
    pub fn as_str(self) -> &'static str {
        match self {
            DateGranularity::Yearly => "yearly",
            DateGranularity::Monthly => "monthly",
            DateGranularity::Daily => "daily",
            DateGranularity::Individual => "individual",
        }
    }
}

impl fmt::Display for DateGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateGranularity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yearly" => Ok(DateGranularity::Yearly),
            "monthly" => Ok(DateGranularity::Monthly),
            "daily" => Ok(DateGranularity::Daily),
            "individual" => Ok(DateGranularity::Individual),
            other => Err(ConfigError::InvalidGranularity(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateAggregation {
    attribute: String,
    granularity: DateGranularity,
    parent: Option<String>,
}

impl DateAggregation {
    pub fn new(
        attribute: impl Into<String>,
        granularity: DateGranularity,
        parent: Option<String>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            granularity,
            parent,
        }
    }

    pub fn granularity(&self) -> DateGranularity {
        self.granularity
    }

    fn label(&self, raw: &str) -> Result<String, ScanError> {
        let parsed = ParsedDate::parse(raw)
            .ok_or_else(|| ScanError::malformed(&self.attribute, raw, "not a date or timestamp"))?;

        if parsed.precision() < self.granularity {
            return Err(ScanError::malformed(
                &self.attribute,
                raw,
                format!("value is coarser than {} granularity", self.granularity),
            ));
        }

        Ok(match (self.granularity, parsed) {
            (DateGranularity::Yearly, p) => format!("{:04}", p.year()),
            (DateGranularity::Monthly, p) => format!("{:04}-{:02}", p.year(), p.month()),
            (DateGranularity::Daily, ParsedDate::Day(d)) => d.format("%Y-%m-%d").to_string(),
            (DateGranularity::Daily, ParsedDate::Instant(t)) => t.format("%Y-%m-%d").to_string(),
            (DateGranularity::Individual, ParsedDate::Instant(t)) => {
                t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
            }
            // precision check above rules out the remaining pairs
            _ => {
                return Err(ScanError::malformed(
                    &self.attribute,
                    raw,
                    "value precision does not support granularity",
                ))
            }
        })
    }
}

/// A date-like value at whatever precision it was written with.
#[derive(Debug, Clone, Copy)]
enum ParsedDate {
    Year(i32),
    Month(i32, u32),
    Day(NaiveDate),
    Instant(DateTime<Utc>),
}

impl ParsedDate {
    fn parse(raw: &str) -> Option<Self> {
        if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
            return Some(ParsedDate::Instant(t.with_timezone(&Utc)));
        }
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(ParsedDate::Instant(t.and_utc()));
        }
        if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(ParsedDate::Day(d));
        }

        let mut parts = raw.split('-');
        let year = parse_fixed_digits(parts.next()?, 4)?;
        match (parts.next(), parts.next()) {
            (None, _) => Some(ParsedDate::Year(year as i32)),
            (Some(m), None) => {
                let month = parse_fixed_digits(m, 2)?;
                (1..=12)
                    .contains(&month)
                    .then_some(ParsedDate::Month(year as i32, month))
            }
            _ => None,
        }
    }

    fn precision(&self) -> DateGranularity {
        match self {
            ParsedDate::Year(_) => DateGranularity::Yearly,
            ParsedDate::Month(..) => DateGranularity::Monthly,
            ParsedDate::Day(_) => DateGranularity::Daily,
            ParsedDate::Instant(_) => DateGranularity::Individual,
        }
    }

    fn year(&self) -> i32 {
        match self {
            ParsedDate::Year(y) | ParsedDate::Month(y, _) => *y,
            ParsedDate::Day(d) => d.year(),
            ParsedDate::Instant(t) => t.year(),
        }
    }

    fn month(&self) -> u32 {
        match self {
            ParsedDate::Year(_) => 1,
            ParsedDate::Month(_, m) => *m,
            ParsedDate::Day(d) => d.month(),
            ParsedDate::Instant(t) => t.month(),
        }
    }
}

fn parse_fixed_digits(s: &str, width: usize) -> Option<u32> {
    if s.len() != width || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Integer
// ─────────────────────────────────────────────────────────────────────────────

/// Bucket width for integer aggregation, written `10s`, `100s`, `1000s`...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerGranularity(i64);

impl IntegerGranularity {
    /// Create a granularity of the given width, which must be a positive power of ten.
    pub fn new(width: i64) -> Result<Self, ConfigError> {
        let mut w = width;
        while w >= 10 && w % 10 == 0 {
            w /= 10;
        }
        if width < 10 || w != 1 {
            return Err(ConfigError::InvalidGranularity(format!("{width}s")));
        }
        Ok(Self(width))
    }

    pub fn width(self) -> i64 {
        self.0
    }
}

impl fmt::Display for IntegerGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl FromStr for IntegerGranularity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let width = s
            .strip_suffix('s')
            .and_then(|w| w.parse::<i64>().ok())
            .ok_or_else(|| ConfigError::InvalidGranularity(s.to_string()))?;
        Self::new(width)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntegerAggregation {
    attribute: String,
    granularity: IntegerGranularity,
    parent: Option<String>,
}

impl IntegerAggregation {
    pub fn new(
        attribute: impl Into<String>,
        granularity: IntegerGranularity,
        parent: Option<String>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            granularity,
            parent,
        }
    }

    pub fn granularity(&self) -> IntegerGranularity {
        self.granularity
    }

    /// Lower bound of the bucket containing `value`.
    ///
    /// Uses Euclidean division so negative values floor downward and the
    /// result is monotonic in `value`. `None` only for values within one
    /// bucket of `i64::MIN`.
    pub fn bucket_floor(&self, value: i64) -> Option<i64> {
        let width = self.granularity.width();
        value.div_euclid(width).checked_mul(width)
    }

    fn label(&self, raw: &str) -> Result<String, ScanError> {
        let value: i64 = raw
            .parse()
            .map_err(|_| ScanError::malformed(&self.attribute, raw, "not an integer"))?;
        self.bucket_floor(value)
            .map(|floor| floor.to_string())
            .ok_or_else(|| ScanError::malformed(&self.attribute, raw, "integer out of range"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// By name
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ByNameAggregation {
    attribute: String,
    parent: Option<String>,
}

impl ByNameAggregation {
    pub fn new(attribute: impl Into<String>, parent: Option<String>) -> Self {
        Self {
            attribute: attribute.into(),
            parent,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// String prefix
// ─────────────────────────────────────────────────────────────────────────────

/// Truncates values to a prefix length. Further offsets describe the finer
/// tiers a comparing side can drill into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringPrefixAggregation {
    attribute: String,
    parent: Option<String>,
    offsets: Vec<usize>,
}

impl StringPrefixAggregation {
    /// Offsets must be non-empty, positive and strictly increasing.
    pub fn new(
        attribute: impl Into<String>,
        parent: Option<String>,
        offsets: Vec<usize>,
    ) -> Result<Self, ConfigError> {
        let first = *offsets.first().ok_or(ConfigError::EmptyOffsets)?;
        if first == 0 {
            return Err(ConfigError::InvalidOffset { offset: 0 });
        }
        if let Some(w) = offsets.windows(2).find(|w| w[1] <= w[0]) {
            return Err(ConfigError::InvalidOffset { offset: w[1] });
        }
        Ok(Self {
            attribute: attribute.into(),
            parent,
            offsets,
        })
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// The prefix length labels are cut to.
    pub fn prefix_length(&self) -> usize {
        self.offsets[0]
    }

    /// The aggregation for the next tier down, or `None` at the last tier.
    pub fn refine(&self) -> Option<Self> {
        if self.offsets.len() < 2 {
            return None;
        }
        Some(Self {
            attribute: self.attribute.clone(),
            parent: self.parent.clone(),
            offsets: self.offsets[1..].to_vec(),
        })
    }

    fn label(&self, raw: &str) -> String {
        match raw.char_indices().nth(self.prefix_length()) {
            Some((idx, _)) => raw[..idx].to_string(),
            None => raw.to_string(),
        }
    }
}
