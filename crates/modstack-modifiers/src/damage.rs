//! Damage instance lists on ammo, guns and gunmods.
//!
//! A damage value comes in three spellings, all of which are accepted on
//! both the base and the modifier side:
//!
//! ```json
//! {"damage_type": "bullet", "amount": 20}
//! [{"damage_type": "bullet", "amount": 20}, {"damage_type": "heat", "amount": 4}]
//! {"values": [{"damage_type": "bullet", "amount": 20}]}
//! ```
//!
//! The base keeps its spelling after modification.

use serde_json::{Map, Value};

use crate::numeric::NumericOp;
use crate::{DAMAGE_KEYS, DAMAGE_TYPE_KEY};

/// Integral sub-keys; scaling them truncates.
const TRUNCATED_KEYS: &[&str] = &["amount", "armor_penetration"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Spelling {
    Instance,
    List,
    Values,
}

fn split(value: &Value) -> Option<(Spelling, Vec<Map<String, Value>>)> {
    fn instances(items: &[Value]) -> Option<Vec<Map<String, Value>>> {
        items.iter().map(|i| i.as_object().cloned()).collect()
    }

    match value {
        Value::Array(items) => Some((Spelling::List, instances(items)?)),
        Value::Object(map) => match map.get("values") {
            Some(Value::Array(items)) => Some((Spelling::Values, instances(items)?)),
            _ => Some((Spelling::Instance, vec![map.clone()])),
        },
        _ => None,
    }
}

fn join(spelling: Spelling, mut instances: Vec<Map<String, Value>>) -> Value {
    match spelling {
        Spelling::Instance if instances.len() == 1 => Value::Object(instances.remove(0)),
        Spelling::Instance | Spelling::List => {
            Value::Array(instances.into_iter().map(Value::Object).collect())
        }
        Spelling::Values => {
            let mut wrapper = Map::new();
            wrapper.insert(
                "values".to_string(),
                Value::Array(instances.into_iter().map(Value::Object).collect()),
            );
            Value::Object(wrapper)
        }
    }
}

/// Result of combining a damage field.
pub(crate) struct Combined {
    /// New field value; `None` leaves the field untouched.
    pub value: Option<Value>,
    /// Modifier damage types with no matching base instance.
    pub unmatched: Vec<String>,
}

pub(crate) fn combine(base: Option<&Value>, modifier: &Value, op: NumericOp) -> Result<Combined, String> {
    let (_, deltas) = split(modifier).ok_or("damage modifier is not a damage instance or list")?;

    let Some(base) = base else {
        let unmatched = deltas.iter().map(damage_type).collect();
        return Ok(Combined {
            value: None,
            unmatched,
        });
    };
    let (spelling, mut instances) =
        split(base).ok_or("base damage is not a damage instance or list")?;

    let mut unmatched = Vec::new();
    for delta in &deltas {
        let wanted = delta.get(DAMAGE_TYPE_KEY);
        let mut matched = false;

        for instance in instances.iter_mut().filter(|i| i.get(DAMAGE_TYPE_KEY) == wanted) {
            matched = true;
            for key in DAMAGE_KEYS {
                let Some(amount) = delta.get(*key) else {
                    continue;
                };
                let current = instance.get(*key).cloned().unwrap_or(Value::from(0));
                let truncate = TRUNCATED_KEYS.contains(key);
                instance.insert(key.to_string(), op.combine(&current, amount, truncate)?);
            }
        }

        if !matched {
            unmatched.push(damage_type(delta));
        }
    }

    Ok(Combined {
        value: Some(join(spelling, instances)),
        unmatched,
    })
}

fn damage_type(instance: &Map<String, Value>) -> String {
    instance
        .get(DAMAGE_TYPE_KEY)
        .and_then(Value::as_str)
        .unwrap_or("<untyped>")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_relative_matches_by_type() {
        let base = json!([
            {"damage_type": "bullet", "amount": 20, "armor_penetration": 4},
            {"damage_type": "heat", "amount": 5}
        ]);
        let delta = json!({"damage_type": "bullet", "amount": 3, "armor_penetration": 2});

        let combined = combine(Some(&base), &delta, NumericOp::Add).unwrap();
        assert!(combined.unmatched.is_empty());
        assert_eq!(
            combined.value.unwrap(),
            json!([
                {"damage_type": "bullet", "amount": 23, "armor_penetration": 6},
                {"damage_type": "heat", "amount": 5}
            ])
        );
    }

    #[test]
    fn test_proportional_truncates_amount_only() {
        let base = json!({"damage_type": "bullet", "amount": 15, "armor_multiplier": 1.5});
        let delta = json!({"damage_type": "bullet", "amount": 0.5, "armor_multiplier": 0.5});

        let value = combine(Some(&base), &delta, NumericOp::Scale).unwrap().value.unwrap();
        assert_eq!(value["amount"], 7);
        assert_eq!(value["armor_multiplier"], 0.75);
    }

    #[test]
    fn test_values_spelling_preserved() {
        let base = json!({"values": [{"damage_type": "stab", "amount": 10}]});
        let delta = json!([{"damage_type": "stab", "amount": -4}]);

        let value = combine(Some(&base), &delta, NumericOp::Add).unwrap().value.unwrap();
        assert_eq!(value, json!({"values": [{"damage_type": "stab", "amount": 6}]}));
    }

    #[test]
    fn test_unlisted_keys_untouched() {
        let base = json!({"damage_type": "bullet", "amount": 10, "barrels": 2});
        let delta = json!({"damage_type": "bullet", "barrels": 5});

        let value = combine(Some(&base), &delta, NumericOp::Add).unwrap().value.unwrap();
        assert_eq!(value["barrels"], 2);
    }

    #[test]
    fn test_unmatched_type_reported() {
        let base = json!({"damage_type": "bullet", "amount": 10});
        let delta = json!({"damage_type": "cold", "amount": 5});

        let combined = combine(Some(&base), &delta, NumericOp::Add).unwrap();
        assert_eq!(combined.unmatched, vec!["cold".to_string()]);
        assert_eq!(combined.value.unwrap(), base);
    }

    #[test]
    fn test_absent_base_left_alone() {
        let delta = json!({"damage_type": "bullet", "amount": 5});
        let combined = combine(None, &delta, NumericOp::Add).unwrap();
        assert!(combined.value.is_none());
        assert_eq!(combined.unmatched, vec!["bullet".to_string()]);
    }
}
