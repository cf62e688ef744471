//! Number arithmetic for `relative` and `proportional`.

use serde_json::{Number, Value};

use crate::block::ModifierBlock;

/// The two numeric modifier operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericOp {
    /// `relative`: base + modifier
    Add,
    /// `proportional`: base * modifier
    Scale,
}

impl NumericOp {
    pub fn block(self) -> ModifierBlock {
        match self {
            Self::Add => ModifierBlock::Relative,
            Self::Scale => ModifierBlock::Proportional,
        }
    }

    /// Combine two numbers. Addition stays integral when both sides are
    /// integers; scaling truncates toward zero when `truncate` is set.
    pub(crate) fn combine(self, base: &Value, modifier: &Value, truncate: bool) -> Result<Value, String> {
        let m = modifier
            .as_f64()
            .ok_or_else(|| format!("{} modifier must be a number", self.block()))?;
        let b = base.as_f64().ok_or("base value is not a number")?;

        match self {
            Self::Add => {
                if let (Some(x), Some(y)) = (base.as_i64(), modifier.as_i64()) {
                    if let Some(sum) = x.checked_add(y) {
                        return Ok(Value::from(sum));
                    }
                }
                Ok(float_value(b + m))
            }
            Self::Scale if truncate => Ok(Value::from((b * m).trunc() as i64)),
            Self::Scale => Ok(float_value(b * m)),
        }
    }
}

pub(crate) fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        return Value::from(f as i64);
    }
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Plain number field. An absent field counts as zero.
pub(crate) fn combine_scalar(base: Option<&Value>, modifier: &Value, op: NumericOp) -> Result<Value, String> {
    let zero = Value::from(0);
    let base = match base {
        None => &zero,
        Some(v) if v.is_number() => v,
        Some(other) => return Err(format!("base value {} is not a number", other)),
    };
    op.combine(base, modifier, true)
}

/// `[key, number]` pair list: each modifier pair adjusts the first base pair
/// with the same key, or is appended when no pair matches.
pub(crate) fn combine_pairs(base: Option<&Value>, modifier: &Value, op: NumericOp) -> Result<Value, String> {
    if op == NumericOp::Scale {
        return Err("proportional does not apply to pair lists".to_string());
    }

    let mut pairs = match base {
        None => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => return Err(format!("base value {} is not a list", other)),
    };
    let deltas = modifier.as_array().ok_or("modifier is not a pair list")?;

    for delta in deltas {
        let Some([Value::String(key), amount]) = delta.as_array().map(Vec::as_slice) else {
            continue;
        };

        let existing = pairs.iter_mut().find_map(|pair| match pair.as_array_mut() {
            Some(items) if items.len() >= 2 && items[0].as_str() == Some(key.as_str()) => {
                Some(items)
            }
            _ => None,
        });

        match existing {
            Some(items) => {
                items[1] = op.combine(&items[1], amount, true)?;
            }
            None => pairs.push(delta.clone()),
        }
    }

    Ok(Value::Array(pairs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_integers_stays_integral() {
        let v = combine_scalar(Some(&json!(10)), &json!(3), NumericOp::Add).unwrap();
        assert_eq!(v, json!(13));
        assert!(v.is_i64());
    }

    #[test]
    fn test_add_float() {
        let v = combine_scalar(Some(&json!(1.5)), &json!(1), NumericOp::Add).unwrap();
        assert_eq!(v, json!(2.5));
    }

    #[test]
    fn test_scale_truncates_toward_zero() {
        assert_eq!(
            combine_scalar(Some(&json!(7)), &json!(0.5), NumericOp::Scale).unwrap(),
            json!(3)
        );
        assert_eq!(
            combine_scalar(Some(&json!(-7)), &json!(0.5), NumericOp::Scale).unwrap(),
            json!(-3)
        );
    }

    #[test]
    fn test_absent_base_is_zero() {
        assert_eq!(
            combine_scalar(None, &json!(-2), NumericOp::Add).unwrap(),
            json!(-2)
        );
        assert_eq!(
            combine_scalar(None, &json!(2), NumericOp::Scale).unwrap(),
            json!(0)
        );
    }

    #[test]
    fn test_pairs_first_match_only() {
        let base = json!([["CUT", 1], ["CUT", 5]]);
        let v = combine_pairs(Some(&base), &json!([["CUT", 2]]), NumericOp::Add).unwrap();
        assert_eq!(v, json!([["CUT", 3], ["CUT", 5]]));
    }

    #[test]
    fn test_pairs_unmatched_appended() {
        let base = json!([["HAMMER", 1]]);
        let v = combine_pairs(Some(&base), &json!([["SAW", 2]]), NumericOp::Add).unwrap();
        assert_eq!(v, json!([["HAMMER", 1], ["SAW", 2]]));
    }

    #[test]
    fn test_pairs_reject_scale() {
        assert!(combine_pairs(None, &json!([["SAW", 2]]), NumericOp::Scale).is_err());
    }
}
