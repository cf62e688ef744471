//! Diagnostics for non-fatal data problems.
//!
//! Nothing in here aborts resolution: a record hit by one of these still
//! resolves, just in a degraded form.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::record::RecordKey;

/// Diagnostic codes.
///
/// These codes are stable and used for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    /// `copy-from` target not found, even after following migrations.
    MissingParent,
    /// Self-reference with no lower layer defining the same identity.
    SelfCopyWithoutUnderlay,
    /// Ancestry chain revisits a record.
    CyclicAncestry,
    /// `copy-from` present but not a string.
    MalformedCopyFrom,
    /// A modifier whose value shape does not fit the target field.
    UnappliedModifier,
    /// A layer entry that is not a usable record.
    MalformedRecord,
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingParent => write!(f, "MISSING_PARENT"),
            Self::SelfCopyWithoutUnderlay => write!(f, "SELF_COPY_WITHOUT_UNDERLAY"),
            Self::CyclicAncestry => write!(f, "CYCLIC_ANCESTRY"),
            Self::MalformedCopyFrom => write!(f, "MALFORMED_COPY_FROM"),
            Self::UnappliedModifier => write!(f, "UNAPPLIED_MODIFIER"),
            Self::MalformedRecord => write!(f, "MALFORMED_RECORD"),
        }
    }
}

/// One non-fatal problem found while loading or resolving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    /// Single-line human-readable description.
    pub message: String,
    /// Record the problem was found on, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
    /// Machine-readable details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            record: None,
            data: None,
        }
    }

    pub fn with_data(
        code: DiagnosticCode,
        record: &RecordKey,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            record: Some(record.to_string()),
            data: Some(data),
        }
    }

    /// Create a MISSING_PARENT diagnostic.
    pub fn missing_parent(record: &RecordKey, target: &str) -> Self {
        Self::with_data(
            DiagnosticCode::MissingParent,
            record,
            format!("{} copies from '{}', which does not exist", record, target),
            serde_json::json!({ "copy_from": target }),
        )
    }

    /// Create a SELF_COPY_WITHOUT_UNDERLAY diagnostic.
    pub fn self_copy_without_underlay(record: &RecordKey, layer: usize) -> Self {
        Self::with_data(
            DiagnosticCode::SelfCopyWithoutUnderlay,
            record,
            format!(
                "{} copies from itself but no layer below {} defines it",
                record, layer
            ),
            serde_json::json!({ "layer": layer }),
        )
    }

    /// Create a CYCLIC_ANCESTRY diagnostic.
    pub fn cyclic_ancestry(record: &RecordKey, chain: &[String]) -> Self {
        Self::with_data(
            DiagnosticCode::CyclicAncestry,
            record,
            format!("{} is its own ancestor; treating it as a root", record),
            serde_json::json!({ "chain": chain }),
        )
    }

    /// Create a MALFORMED_COPY_FROM diagnostic.
    pub fn malformed_copy_from(record: &RecordKey, value: &serde_json::Value) -> Self {
        Self::with_data(
            DiagnosticCode::MalformedCopyFrom,
            record,
            format!("{} has a non-string copy-from", record),
            serde_json::json!({ "copy_from": value }),
        )
    }

    /// Create an UNAPPLIED_MODIFIER diagnostic.
    pub fn unapplied_modifier(record: &RecordKey, block: &str, field: &str, reason: &str) -> Self {
        Self::with_data(
            DiagnosticCode::UnappliedModifier,
            record,
            format!("{} {}.{} not applied: {}", record, block, field, reason),
            serde_json::json!({ "block": block, "field": field }),
        )
    }

    /// Create a MALFORMED_RECORD diagnostic.
    pub fn malformed_record(source: &str, index: usize, reason: &str) -> Self {
        let mut diagnostic = Self::new(
            DiagnosticCode::MalformedRecord,
            format!("{} entry {} skipped: {}", source, index, reason),
        );
        diagnostic.data = Some(serde_json::json!({ "source": source, "index": index }));
        diagnostic
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
