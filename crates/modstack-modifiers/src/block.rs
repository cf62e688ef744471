//! Modifier blocks carried by a record.

use modstack_records::{DELETE, EXTEND, PROPORTIONAL, RELATIVE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One of the four modifier blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierBlock {
    Relative,
    Proportional,
    Extend,
    Delete,
}

impl ModifierBlock {
    /// Application order.
    pub const ORDER: [ModifierBlock; 4] = [
        ModifierBlock::Relative,
        ModifierBlock::Proportional,
        ModifierBlock::Extend,
        ModifierBlock::Delete,
    ];

    /// The record key holding this block.
    pub fn key(self) -> &'static str {
        match self {
            Self::Relative => RELATIVE,
            Self::Proportional => PROPORTIONAL,
            Self::Extend => EXTEND,
            Self::Delete => DELETE,
        }
    }
}

impl fmt::Display for ModifierBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The modifier blocks of one record, field name to modifier value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Modifiers {
    pub relative: Map<String, Value>,
    pub proportional: Map<String, Value>,
    pub extend: Map<String, Value>,
    pub delete: Map<String, Value>,
    malformed: Vec<ModifierBlock>,
}

impl Modifiers {
    /// Collect the modifier blocks from a record's raw fields.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let mut modifiers = Self::default();
        for block in ModifierBlock::ORDER {
            let entries = match fields.get(block.key()) {
                None => continue,
                Some(Value::Object(entries)) => entries.clone(),
                Some(_) => {
                    modifiers.malformed.push(block);
                    continue;
                }
            };
            *modifiers.block_mut(block) = entries;
        }
        modifiers
    }

    fn block_mut(&mut self, block: ModifierBlock) -> &mut Map<String, Value> {
        match block {
            ModifierBlock::Relative => &mut self.relative,
            ModifierBlock::Proportional => &mut self.proportional,
            ModifierBlock::Extend => &mut self.extend,
            ModifierBlock::Delete => &mut self.delete,
        }
    }

    /// Blocks present on the record but not shaped as objects.
    pub fn malformed_blocks(&self) -> &[ModifierBlock] {
        &self.malformed
    }

    pub fn is_empty(&self) -> bool {
        self.relative.is_empty()
            && self.proportional.is_empty()
            && self.extend.is_empty()
            && self.delete.is_empty()
            && self.malformed.is_empty()
    }
}
