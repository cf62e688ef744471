//! `extend` and `delete` on list fields.

use serde_json::Value;

/// A single value stands for a one-element list.
fn as_items(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// Append `additions` to the base list (absent counts as empty). For set
/// fields, values already present are skipped.
pub(crate) fn extend(base: Option<&Value>, additions: &Value, set_semantics: bool) -> Result<Value, String> {
    let mut items = match base {
        None => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => return Err(format!("cannot extend non-list value {}", other)),
    };

    for item in as_items(additions) {
        if set_semantics && items.contains(&item) {
            continue;
        }
        items.push(item);
    }

    Ok(Value::Array(items))
}

/// Remove every base element deep-equal to one of `removals`.
///
/// Returns `Ok(None)` when the field is absent; there is nothing to delete.
pub(crate) fn delete(base: Option<&Value>, removals: &Value) -> Result<Option<Value>, String> {
    let items = match base {
        None => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(other) => return Err(format!("cannot delete from non-list value {}", other)),
    };

    let removals = as_items(removals);
    let remaining = items
        .iter()
        .filter(|item| !removals.contains(item))
        .cloned()
        .collect();

    Ok(Some(Value::Array(remaining)))
}
