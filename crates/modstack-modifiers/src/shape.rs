//! Field shapes and how `relative`/`proportional` pick one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::quantity::Quantity;

/// The closed set of field shapes a numeric modifier can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldShape {
    /// Plain number.
    ScalarNumber,
    /// Magnitude plus unit string such as `"250 ml"`.
    ScalarUnitString,
    /// Allow-listed damage instances, matched by damage type.
    DamageList,
    /// List of `[key, number]` pairs such as tool qualities.
    PairList,
    /// Any other list; only `extend`/`delete` touch these.
    GenericList,
    /// Nothing a numeric modifier can combine with.
    Unsupported,
}

impl FieldShape {
    /// Decide the shape of `field` for a `relative`/`proportional` modifier.
    ///
    /// The damage allow-list wins over everything else; otherwise the shape
    /// follows the base value, falling back to the modifier's shape when the
    /// field is absent.
    pub fn classify(record_type: &str, field: &str, base: Option<&Value>, modifier: &Value) -> Self {
        if crate::is_damage_field(record_type, field) {
            return Self::DamageList;
        }

        if is_pair_list(modifier) && matches!(base, None | Some(Value::Array(_))) {
            return Self::PairList;
        }

        match (base, modifier) {
            (Some(Value::String(s)), _) if Quantity::parse(s).is_some() => Self::ScalarUnitString,
            (None | Some(Value::Number(_)), Value::String(s)) if Quantity::parse(s).is_some() => {
                Self::ScalarUnitString
            }
            (None | Some(Value::Number(_)), Value::Number(_)) => Self::ScalarNumber,
            (Some(Value::Array(_)), _) => Self::GenericList,
            _ => Self::Unsupported,
        }
    }
}

/// `[["KEY", 1], ["OTHER", 2]]`
fn is_pair_list(value: &Value) -> bool {
    match value {
        Value::Array(items) if !items.is_empty() => items.iter().all(|item| {
            matches!(item.as_array().map(Vec::as_slice),
                Some([Value::String(_), Value::Number(_)]))
        }),
        _ => false,
    }
}
