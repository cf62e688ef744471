//! Outcome of applying a record's modifiers.

use serde::{Deserialize, Serialize};

use crate::block::ModifierBlock;

/// A modifier that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unapplied {
    pub block: ModifierBlock,
    /// Target field, or `*` for a whole malformed block.
    pub field: String,
    pub reason: String,
}

/// What [`crate::apply`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Number of modifier entries written into the record.
    pub applied: usize,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unapplied: Vec<Unapplied>,
}

impl ApplyReport {
    pub(crate) fn skip(&mut self, block: ModifierBlock, field: &str, reason: impl Into<String>) {
        self.unapplied.push(Unapplied {
            block,
            field: field.to_string(),
            reason: reason.into(),
        });
    }

    /// True when every modifier entry was applied.
    pub fn is_clean(&self) -> bool {
        self.unapplied.is_empty()
    }
}
