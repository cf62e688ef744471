//! Magnitude-plus-unit literals (`"250 ml"`, `"1.5 kg"`, `"5 kJ"`).

use regex_lite::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

use crate::numeric::NumericOp;

/// Physical dimension of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Volume,
    Mass,
    Energy,
    Length,
}

impl Dimension {
    /// Unit that relative arithmetic writes results in.
    pub fn native_unit(self) -> &'static str {
        match self {
            Self::Volume => "ml",
            Self::Mass => "g",
            Self::Energy => "J",
            Self::Length => "mm",
        }
    }
}

/// Known units: suffix, dimension, size in native units.
const UNITS: &[(&str, Dimension, f64)] = &[
    ("ml", Dimension::Volume, 1.0),
    ("L", Dimension::Volume, 1000.0),
    ("l", Dimension::Volume, 1000.0),
    ("mg", Dimension::Mass, 0.001),
    ("g", Dimension::Mass, 1.0),
    ("kg", Dimension::Mass, 1000.0),
    ("mJ", Dimension::Energy, 0.001),
    ("J", Dimension::Energy, 1.0),
    ("kJ", Dimension::Energy, 1000.0),
    ("mm", Dimension::Length, 1.0),
    ("cm", Dimension::Length, 10.0),
    ("m", Dimension::Length, 1000.0),
    ("km", Dimension::Length, 1_000_000.0),
];

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(-?\d+(?:\.\d+)?)\s*([A-Za-z]+)\s*$").expect("quantity pattern is valid")
    })
}

/// A parsed unit literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub magnitude: f64,
    pub unit: String,
    dimension: Dimension,
    scale: f64,
}

impl Quantity {
    /// Parse `"<number> <unit>"`; `None` for anything else.
    pub fn parse(literal: &str) -> Option<Self> {
        let caps = pattern().captures(literal)?;
        let magnitude: f64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2)?.as_str();
        let (_, dimension, scale) = UNITS.iter().find(|(u, _, _)| *u == unit)?;

        Some(Self {
            magnitude,
            unit: unit.to_string(),
            dimension: *dimension,
            scale: *scale,
        })
    }

    /// A quantity already in the native unit of `dimension`.
    pub fn native(magnitude: f64, dimension: Dimension) -> Self {
        Self {
            magnitude,
            unit: dimension.native_unit().to_string(),
            dimension,
            scale: 1.0,
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Magnitude converted to the native unit.
    pub fn to_native(&self) -> f64 {
        self.magnitude * self.scale
    }

    /// Multiply the magnitude, keeping the unit.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            magnitude: self.magnitude * factor,
            ..self.clone()
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", format_magnitude(self.magnitude), self.unit)
    }
}

/// Integers print without a decimal point; fractions are rounded to six
/// places so float noise does not leak into the data.
fn format_magnitude(magnitude: f64) -> String {
    let rounded = (magnitude * 1e6).round() / 1e6;
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

/// Combine a unit literal with a `relative`/`proportional` modifier.
pub(crate) fn combine(base: Option<&Value>, modifier: &Value, op: NumericOp) -> Result<Value, String> {
    let base_quantity = match base {
        Some(Value::String(s)) => {
            Some(Quantity::parse(s).ok_or_else(|| format!("'{}' is not a unit literal", s))?)
        }
        Some(Value::Number(_)) | None => None,
        Some(other) => return Err(format!("cannot combine a unit literal with {}", other)),
    };

    match op {
        NumericOp::Add => {
            let delta = match modifier {
                Value::String(s) => {
                    Some(Quantity::parse(s).ok_or_else(|| format!("'{}' is not a unit literal", s))?)
                }
                Value::Number(_) => None,
                _ => return Err("relative unit modifier must be a number or unit literal".to_string()),
            };

            let dimension = match (&base_quantity, &delta) {
                (Some(b), Some(d)) if b.dimension() != d.dimension() => {
                    return Err(format!("cannot add {} to {}", d, b));
                }
                (Some(b), _) => b.dimension(),
                (None, Some(d)) => d.dimension(),
                (None, None) => return Err("no unit on either side".to_string()),
            };

            let base_native = match (&base_quantity, base) {
                (Some(b), _) => b.to_native(),
                (None, Some(v)) => v.as_f64().unwrap_or(0.0),
                (None, None) => 0.0,
            };
            let delta_native = match &delta {
                Some(d) => d.to_native(),
                None => modifier.as_f64().unwrap_or(0.0),
            };

            Ok(Value::String(
                Quantity::native(base_native + delta_native, dimension).to_string(),
            ))
        }
        NumericOp::Scale => {
            let factor = modifier
                .as_f64()
                .ok_or("proportional modifier must be a number")?;
            let quantity = base_quantity.ok_or("proportional needs a unit literal base")?;
            Ok(Value::String(quantity.scaled(factor).to_string()))
        }
    }
}
