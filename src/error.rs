//! Errors surfaced by the query API.

/// Errors returned by [`crate::Dataset`] lookups.
///
/// Data problems (missing parents, cycles, bad modifiers) never show up
/// here; they degrade the affected record and are reported as diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("no {record_type} with id '{id}'")]
    UnknownIdentifier { record_type: String, id: String },

    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),
}
