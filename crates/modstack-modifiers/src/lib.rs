//! Field modifiers for layered game-data records.
//!
//! A record that inherits through `copy-from` may adjust inherited values
//! with four modifier blocks, applied in a fixed order:
//!
//! 1. `relative` adds
//! 2. `proportional` multiplies
//! 3. `extend` appends to lists
//! 4. `delete` removes list elements
//!
//! How a modifier combines with its field depends on the field's shape
//! ([`FieldShape`]). Modifiers that do not fit their field are skipped and
//! reported in the [`ApplyReport`]; applying never fails.

mod block;
mod damage;
mod list;
mod merge;
mod numeric;
mod quantity;
mod report;
mod rules;
mod shape;

pub use block::{ModifierBlock, Modifiers};
pub use merge::merge_inherited;
pub use numeric::NumericOp;
pub use quantity::{Dimension, Quantity};
pub use report::{ApplyReport, Unapplied};
pub use rules::MergeRules;
pub use shape::FieldShape;

use serde_json::{Map, Value};

/// Damage-list fields, keyed by the record's own type.
///
/// Other damage-shaped fields (monster melee damage, generic attack damage)
/// are deliberately absent: modifiers on them fall through to the generic
/// rules.
pub const DAMAGE_FIELDS: &[(&str, &str)] = &[
    ("AMMO", "damage"),
    ("GUN", "ranged_damage"),
    ("GUNMOD", "damage_modifier"),
];

/// Sub-entry keys of a damage instance that modifiers may touch.
pub const DAMAGE_KEYS: &[&str] = &[
    "amount",
    "armor_penetration",
    "armor_multiplier",
    "damage_multiplier",
    "constant_armor_multiplier",
    "constant_damage_multiplier",
];

/// Damage instance discriminator.
pub const DAMAGE_TYPE_KEY: &str = "damage_type";

/// Fields merged as a keyed union of parent and child, child winning.
pub const UNION_BY_KEY_FIELDS: &[&str] = &["vitamins"];

/// `(record type, field)` pairs concatenated parent-then-child on inheritance.
pub const CONCAT_FIELDS: &[(&str, &str)] = &[("vehicle", "parts")];

/// Whether `field` on a record of `record_type` is an allow-listed damage list.
pub fn is_damage_field(record_type: &str, field: &str) -> bool {
    DAMAGE_FIELDS
        .iter()
        .any(|(t, f)| *t == record_type && *f == field)
}

/// Apply `modifiers` to an already merged record.
///
/// `record_type` is the record's own `type`, used for the damage allow-list.
pub fn apply(
    record: &mut Map<String, Value>,
    record_type: &str,
    modifiers: &Modifiers,
    rules: &MergeRules,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    for block in modifiers.malformed_blocks() {
        report.skip(*block, "*", "modifier block is not an object");
    }

    for (field, value) in &modifiers.relative {
        apply_numeric(record, record_type, field, value, NumericOp::Add, &mut report);
    }

    for (field, value) in &modifiers.proportional {
        apply_numeric(record, record_type, field, value, NumericOp::Scale, &mut report);
    }

    for (field, value) in &modifiers.extend {
        match list::extend(record.get(field), value, rules.is_set_field(field)) {
            Ok(merged) => {
                record.insert(field.clone(), merged);
                report.applied += 1;
            }
            Err(reason) => report.skip(ModifierBlock::Extend, field, reason),
        }
    }

    for (field, value) in &modifiers.delete {
        match list::delete(record.get(field), value) {
            Ok(Some(remaining)) => {
                record.insert(field.clone(), remaining);
                report.applied += 1;
            }
            Ok(None) => report.applied += 1,
            Err(reason) => report.skip(ModifierBlock::Delete, field, reason),
        }
    }

    report
}

fn apply_numeric(
    record: &mut Map<String, Value>,
    record_type: &str,
    field: &str,
    modifier: &Value,
    op: NumericOp,
    report: &mut ApplyReport,
) {
    let block = op.block();
    let base = record.get(field);

    let outcome = match FieldShape::classify(record_type, field, base, modifier) {
        FieldShape::ScalarNumber => numeric::combine_scalar(base, modifier, op).map(Some),
        FieldShape::ScalarUnitString => quantity::combine(base, modifier, op).map(Some),
        FieldShape::PairList => numeric::combine_pairs(base, modifier, op).map(Some),
        FieldShape::DamageList => match damage::combine(base, modifier, op) {
            Ok(combined) => {
                for damage_type in &combined.unmatched {
                    report.skip(
                        block,
                        field,
                        format!("no base damage instance of type '{}'", damage_type),
                    );
                }
                Ok(combined.value)
            }
            Err(reason) => Err(reason),
        },
        FieldShape::GenericList => Err(format!("{} does not apply to lists", block)),
        FieldShape::Unsupported => Err("unsupported value shape".to_string()),
    };

    match outcome {
        Ok(Some(value)) => {
            record.insert(field.to_string(), value);
            report.applied += 1;
        }
        Ok(None) => {}
        Err(reason) => report.skip(block, field, reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn run(record: Value, record_type: &str, mods: Value) -> (Map<String, Value>, ApplyReport) {
        let mut record = object(record);
        let modifiers = Modifiers::from_fields(&object(mods));
        let report = apply(&mut record, record_type, &modifiers, &MergeRules::default());
        (record, report)
    }

    #[test]
    fn test_proportional_halves() {
        let (r, report) = run(json!({"x": 10}), "X", json!({"proportional": {"x": 0.5}}));
        assert_eq!(r["x"], 5);
        assert!(report.is_clean());
    }

    #[test]
    fn test_relative_adds() {
        let (r, _) = run(json!({"x": 10}), "X", json!({"relative": {"x": 3}}));
        assert_eq!(r["x"], 13);
    }

    #[test]
    fn test_relative_before_proportional() {
        let (r, _) = run(
            json!({"x": 10}),
            "X",
            json!({"relative": {"x": 2}, "proportional": {"x": 0.5}}),
        );
        // (10 + 2) * 0.5, not 10 * 0.5 + 2
        assert_eq!(r["x"], 6);
    }

    #[test]
    fn test_extend_before_delete() {
        let (r, _) = run(
            json!({"flags": ["A"]}),
            "X",
            json!({"extend": {"flags": ["B"]}, "delete": {"flags": ["B"]}}),
        );
        assert_eq!(r["flags"], json!(["A"]));
    }

    #[test]
    fn test_absent_field_treated_as_zero() {
        let (r, report) = run(json!({}), "X", json!({"relative": {"x": 4}}));
        assert_eq!(r["x"], 4);
        assert!(report.is_clean());
    }

    #[test]
    fn test_unit_string_relative_and_proportional() {
        let (r, _) = run(
            json!({"volume": "250 ml", "weight": "2 kg"}),
            "GENERIC",
            json!({"relative": {"volume": "1 L"}, "proportional": {"weight": 1.5}}),
        );
        assert_eq!(r["volume"], "1250 ml");
        assert_eq!(r["weight"], "3 kg");
    }

    #[test]
    fn test_damage_only_on_allow_listed_field() {
        let base = json!({
            "damage": {"damage_type": "bullet", "amount": 20},
            "melee_damage": {"damage_type": "bash", "amount": 5}
        });
        let mods = json!({"relative": {
            "damage": {"damage_type": "bullet", "amount": 4},
            "melee_damage": {"damage_type": "bash", "amount": 4}
        }});

        let (ammo, report) = run(base.clone(), "AMMO", mods.clone());
        assert_eq!(ammo["damage"]["amount"], 24);
        assert_eq!(ammo["melee_damage"]["amount"], 5);
        assert_eq!(report.unapplied.len(), 1);
        assert_eq!(report.unapplied[0].field, "melee_damage");

        let (generic, _) = run(base, "GENERIC", mods);
        assert_eq!(generic["damage"]["amount"], 20);
    }

    #[test]
    fn test_qualities_relative() {
        let (r, _) = run(
            json!({"qualities": [["HAMMER", 1], ["CUT", 2]]}),
            "TOOL",
            json!({"relative": {"qualities": [["CUT", 1]]}}),
        );
        assert_eq!(r["qualities"], json!([["HAMMER", 1], ["CUT", 3]]));
    }

    #[test]
    fn test_mismatched_shape_reported() {
        let (r, report) = run(
            json!({"name": "pipe"}),
            "GENERIC",
            json!({"relative": {"name": 1}}),
        );
        assert_eq!(r["name"], "pipe");
        assert_eq!(report.unapplied.len(), 1);
        assert_eq!(report.unapplied[0].block, ModifierBlock::Relative);
    }

    #[test]
    fn test_malformed_block_reported() {
        let (_, report) = run(json!({"x": 1}), "X", json!({"relative": [1, 2]}));
        assert_eq!(report.unapplied.len(), 1);
        assert_eq!(report.unapplied[0].field, "*");
    }
}
