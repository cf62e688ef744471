//! Type families: concrete record types sharing one id namespace.

use std::collections::{BTreeMap, HashMap};

/// Item types that share the `item` namespace by default.
pub const DEFAULT_ITEM_TYPES: &[&str] = &[
    "AMMO",
    "ARMOR",
    "BATTERY",
    "BIONIC_ITEM",
    "BOOK",
    "COMESTIBLE",
    "CONTAINER",
    "ENGINE",
    "GENERIC",
    "GUN",
    "GUNMOD",
    "MAGAZINE",
    "PET_ARMOR",
    "TOOL",
    "TOOLMOD",
    "TOOL_ARMOR",
    "WHEEL",
];

/// Maps concrete record types to the namespace their ids live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeFamilies {
    namespace_of: HashMap<String, String>,
}

impl Default for TypeFamilies {
    fn default() -> Self {
        let mut families = BTreeMap::new();
        families.insert(
            "item".to_string(),
            DEFAULT_ITEM_TYPES.iter().map(|t| t.to_string()).collect(),
        );
        Self::from_map(&families)
    }
}

impl TypeFamilies {
    /// No families: every type is its own namespace.
    pub fn none() -> Self {
        Self {
            namespace_of: HashMap::new(),
        }
    }

    pub fn from_map(families: &BTreeMap<String, Vec<String>>) -> Self {
        let mut namespace_of = HashMap::new();
        for (family, members) in families {
            for member in members {
                namespace_of.insert(member.clone(), family.clone());
            }
        }
        Self { namespace_of }
    }

    /// Namespace holding ids of `record_type`. Family names map to
    /// themselves, as do types outside every family.
    pub fn namespace<'a>(&'a self, record_type: &'a str) -> &'a str {
        self.namespace_of
            .get(record_type)
            .map(String::as_str)
            .unwrap_or(record_type)
    }

    /// Whether `name` is a concrete member type of some family.
    pub fn is_member(&self, name: &str) -> bool {
        self.namespace_of.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_item_family() {
        let families = TypeFamilies::default();
        assert_eq!(families.namespace("GUN"), "item");
        assert_eq!(families.namespace("item"), "item");
        assert_eq!(families.namespace("MONSTER"), "MONSTER");
        assert!(families.is_member("TOOL"));
        assert!(!families.is_member("item"));
    }

    #[test]
    fn test_none() {
        assert_eq!(TypeFamilies::none().namespace("GUN"), "GUN");
    }
}
