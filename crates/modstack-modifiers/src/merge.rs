//! Laying a child's own fields over its resolved parent.

use serde_json::{Map, Value};

use crate::{CONCAT_FIELDS, UNION_BY_KEY_FIELDS};

/// Identity keys that never pass from parent to child.
const NON_INHERITED: &[&str] = &["id", "abstract"];

/// Merge `child` over `parent`: child wins per key, with two exceptions.
///
/// - keyed-union fields (`vitamins`) keep the parent's entries, replacing
///   those whose key the child also lists;
/// - concatenated fields (`parts` on vehicles) list the parent's entries
///   first, then the child's.
///
/// `child` must already be stripped of `copy-from` and modifier blocks.
pub fn merge_inherited(
    parent: &Map<String, Value>,
    child: &Map<String, Value>,
    record_type: &str,
) -> Map<String, Value> {
    let mut merged: Map<String, Value> = parent
        .iter()
        .filter(|(k, _)| !NON_INHERITED.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    for (key, value) in child {
        let combined = match (merged.get(key), value) {
            (Some(Value::Array(inherited)), Value::Array(own))
                if UNION_BY_KEY_FIELDS.contains(&key.as_str()) =>
            {
                Value::Array(union_by_key(inherited, own))
            }
            (Some(Value::Array(inherited)), Value::Array(own))
                if CONCAT_FIELDS
                    .iter()
                    .any(|(t, f)| *t == record_type && *f == key.as_str()) =>
            {
                Value::Array(inherited.iter().chain(own).cloned().collect())
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), combined);
    }

    merged
}

fn entry_key(entry: &Value) -> Option<&Value> {
    entry.as_array().and_then(|pair| pair.first())
}

fn union_by_key(inherited: &[Value], own: &[Value]) -> Vec<Value> {
    let mut result = inherited.to_vec();
    for entry in own {
        let slot = entry_key(entry).and_then(|key| {
            result
                .iter()
                .position(|existing| entry_key(existing) == Some(key))
        });
        match slot {
            Some(index) => result[index] = entry.clone(),
            None => result.push(entry.clone()),
        }
    }
    result
}
