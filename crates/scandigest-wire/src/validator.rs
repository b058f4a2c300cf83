//! Hooks that vet each entry as it is read off the wire.

use scandigest_core::ScanResultEntry;

use crate::error::{Result, WireError};

/// Inspects entries during deserialisation. Returning an error aborts the read.
pub trait ScanEntityValidator {
    fn process(&self, entry: &ScanResultEntry) -> Result<()>;
}

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullValidator;

impl ScanEntityValidator for NullValidator {
    fn process(&self, _entry: &ScanResultEntry) -> Result<()> {
        Ok(())
    }
}

/// Rejects entity ids that are empty or contain control characters.
///
/// Aggregate entries carry no id and always pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdValidator;

impl ScanEntityValidator for IdValidator {
    fn process(&self, entry: &ScanResultEntry) -> Result<()> {
        let Some(id) = &entry.id else {
            return Ok(());
        };
        let reason = if id.is_empty() {
            "empty id"
        } else if id.chars().any(char::is_control) {
            "id contains control characters"
        } else {
            return Ok(());
        };
        Err(WireError::Rejected {
            id: Some(id.clone()),
            reason: reason.to_string(),
        })
    }
}

impl<F> ScanEntityValidator for F
where
    F: Fn(&ScanResultEntry) -> Result<()>,
{
    fn process(&self, entry: &ScanResultEntry) -> Result<()> {
        self(entry)
    }
}
