//! Collation: the total order imposed on entity ids.
//!
//! A participant must emit its scan in id order, and both sides of a
//! comparison must agree on what that order is. The digest builder only uses
//! the collation to police that precondition; bucket keys are never collated.

use icu_collator::{Collator, CollatorOptions};
use icu_provider::DataLocale;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// A total ordering policy over identifier strings.
pub trait Collation: Send + Sync {
    /// Compare two ids.
    fn compare(&self, a: &str, b: &str) -> Ordering;

    /// Short name used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Whether `next` may follow `previous` in a scan (`next >= previous`).
    fn in_order(&self, previous: &str, next: &str) -> bool {
        self.compare(previous, next) != Ordering::Greater
    }
}

/// Byte-ordinal collation. Upper case sorts before lower case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AsciiCollation;

impl Collation for AsciiCollation {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.as_bytes().cmp(b.as_bytes())
    }

    fn name(&self) -> &'static str {
        "ascii"
    }
}

/// Unicode Collation Algorithm ordering (root locale, tertiary strength).
///
/// Letters compare by base character first, so `"bar" < "Foo"` here while
/// the ASCII collation puts `"Foo"` first.
pub struct UnicodeCollation {
    collator: Collator,
}

impl UnicodeCollation {
    /// Create a collator over the compiled root collation data.
    pub fn new() -> Result<Self, ConfigError> {
        let collator = Collator::try_new(&DataLocale::default(), CollatorOptions::new())
            .map_err(|e| ConfigError::Collator(e.to_string()))?;
        Ok(Self { collator })
    }
}

impl Collation for UnicodeCollation {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        self.collator.compare(a, b)
    }

    fn name(&self) -> &'static str {
        "unicode"
    }
}

impl fmt::Debug for UnicodeCollation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnicodeCollation(root)")
    }
}

/// Selects a collation by name, for configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollationKind {
    #[default]
    Ascii,
    Unicode,
}

impl CollationKind {
    /// Instantiate the collation.
    pub fn build(self) -> Result<Box<dyn Collation>, ConfigError> {
        match self {
            CollationKind::Ascii => Ok(Box::new(AsciiCollation)),
            CollationKind::Unicode => Ok(Box::new(UnicodeCollation::new()?)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CollationKind::Ascii => "ascii",
            CollationKind::Unicode => "unicode",
        }
    }
}

impl fmt::Display for CollationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollationKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascii" | "binary" => Ok(CollationKind::Ascii),
            "unicode" => Ok(CollationKind::Unicode),
            other => Err(ConfigError::UnknownCollation(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepts(collation: &dyn Collation, ids: &[&str]) -> bool {
        ids.windows(2).all(|w| collation.in_order(w[0], w[1]))
    }

    #[test]
    fn test_ascii_ordering() {
        let c = AsciiCollation;
        assert_eq!(c.compare("Bar", "Foo"), Ordering::Less);
        assert_eq!(c.compare("Foo", "bar"), Ordering::Less);
        assert_eq!(c.compare("far", "boo"), Ordering::Greater);
        assert_eq!(c.compare("id1", "id1"), Ordering::Equal);
    }

    #[test]
    fn test_unicode_ordering() {
        let c = UnicodeCollation::new().unwrap();
        assert_eq!(c.compare("bar", "Foo"), Ordering::Less);
        assert_eq!(c.compare("Far", "boo"), Ordering::Greater);
        assert_eq!(c.compare("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_same_sequence_diverges_between_collations() {
        let ascii = AsciiCollation;
        let unicode = UnicodeCollation::new().unwrap();

        assert!(accepts(&ascii, &["Bar", "Foo"]));
        assert!(!accepts(&ascii, &["far", "boo"]));
        assert!(accepts(&unicode, &["bar", "Foo"]));
        assert!(!accepts(&unicode, &["Far", "boo"]));

        // "Foo" then "bar" is fine byte-wise but not under UCA
        assert!(accepts(&ascii, &["Foo", "bar"]));
        assert!(!accepts(&unicode, &["Foo", "bar"]));
    }

    #[test]
    fn test_unicode_accents_sort_with_base_letter() {
        let c = UnicodeCollation::new().unwrap();
        assert_eq!(c.compare("café", "cafz"), Ordering::Less);
        assert_eq!(AsciiCollation.compare("café", "cafz"), Ordering::Greater);
    }

    #[test]
    fn test_collation_kind_parse() {
        assert_eq!("ascii".parse::<CollationKind>().unwrap(), CollationKind::Ascii);
        assert_eq!("unicode".parse::<CollationKind>().unwrap(), CollationKind::Unicode);
        assert!(matches!(
            "klingon".parse::<CollationKind>(),
            Err(ConfigError::UnknownCollation(_))
        ));
        assert_eq!(CollationKind::Unicode.build().unwrap().name(), "unicode");
    }
}
