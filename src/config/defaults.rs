//! Built-in defaults (lowest precedence source)

use serde::{Deserialize, Serialize};

use crate::store::DEFAULT_ITEM_TYPES;

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Fields `extend` treats as sets (default: ["flags"])
    pub set_fields: Vec<String>,

    /// Types sharing the `item` id namespace
    pub item_types: Vec<String>,

    /// Globs a layer directory walk includes (default: ["**/*.json"])
    pub include: Vec<String>,

    /// Globs a layer directory walk skips (default: none)
    pub exclude: Vec<String>,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            set_fields: vec!["flags".to_string()],
            item_types: DEFAULT_ITEM_TYPES.iter().map(|t| t.to_string()).collect(),
            include: vec!["**/*.json".to_string()],
            exclude: Vec::new(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "rules": {
                "set_fields": self.set_fields
            },
            "families": {
                "item": self.item_types
            },
            "load": {
                "include": self.include,
                "exclude": self.exclude
            }
        })
    }
}
