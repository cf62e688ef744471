//! Fully resolved records.

use modstack_records::INERT_KEYS;
use serde::Serialize;
use serde_json::{Map, Value};

/// A record with ancestry merged and modifiers applied.
///
/// Never contains `copy-from` or any modifier block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResolvedRecord {
    fields: Map<String, Value>,
}

impl ResolvedRecord {
    pub(crate) fn new(mut fields: Map<String, Value>) -> Self {
        fields.retain(|key, _| !INERT_KEYS.contains(&key.as_str()));
        Self { fields }
    }

    pub fn record_type(&self) -> Option<&str> {
        self.fields.get("type").and_then(Value::as_str)
    }

    /// The first declared id, if the record has one.
    pub fn id(&self) -> Option<&str> {
        match self.fields.get("id")? {
            Value::String(id) => Some(id),
            Value::Array(ids) => ids.first().and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}
