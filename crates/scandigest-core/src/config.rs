//! Builder configuration.

use serde::{Deserialize, Serialize};

use crate::collation::CollationKind;
use crate::digest::DigestAlgorithm;

/// Configuration for digest builders.
///
/// Both sides of a comparison must use the same settings for their digests
/// to be comparable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Ordering the scan's ids must follow.
    pub collation: CollationKind,
    /// Hash applied to each bucket.
    pub algorithm: DigestAlgorithm,
}
