//! Tunable merge rules.

use serde::{Deserialize, Serialize};

/// Field names that `extend` treats as sets.
const DEFAULT_SET_FIELDS: &[&str] = &["flags"];

/// Merge rules that vary with the data being loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRules {
    /// Fields whose `extend` skips values already present.
    ///
    /// Every field ending in `_flags` is a set field as well.
    #[serde(default = "default_set_fields")]
    pub set_fields: Vec<String>,
}

fn default_set_fields() -> Vec<String> {
    DEFAULT_SET_FIELDS.iter().map(|s| s.to_string()).collect()
}

impl Default for MergeRules {
    fn default() -> Self {
        Self {
            set_fields: default_set_fields(),
        }
    }
}

impl MergeRules {
    /// Add set fields on top of the defaults.
    pub fn with_set_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for field in fields {
            let field = field.into();
            if !self.set_fields.contains(&field) {
                self.set_fields.push(field);
            }
        }
        self
    }

    pub fn is_set_field(&self, field: &str) -> bool {
        field.ends_with("_flags") || self.set_fields.iter().any(|f| f == field)
    }
}
