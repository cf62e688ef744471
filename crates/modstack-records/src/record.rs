//! Raw records as loaded from a layer.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::{COPY_FROM, INERT_KEYS};

/// Errors raised while turning a JSON value into a [`RawRecord`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has no string 'type' field")]
    MissingType,
}

/// The `id` field of a record: one identifier or a list of aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdField {
    Single(String),
    Aliases(Vec<String>),
}

impl IdField {
    fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(id) => Some(Self::Single(id.clone())),
            Value::Array(items) => {
                let aliases: Vec<String> = items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
                if aliases.is_empty() {
                    None
                } else {
                    Some(Self::Aliases(aliases))
                }
            }
            _ => None,
        }
    }

    /// Every identifier this field declares, in declaration order.
    pub fn names(&self) -> &[String] {
        match self {
            Self::Single(id) => std::slice::from_ref(id),
            Self::Aliases(ids) => ids,
        }
    }

    /// The first declared identifier.
    pub fn primary(&self) -> &str {
        &self.names()[0]
    }

    pub fn contains(&self, id: &str) -> bool {
        self.names().iter().any(|n| n == id)
    }
}

/// Identity of a record inside one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub record_type: String,
    pub name: String,
}

impl RecordKey {
    pub fn new(record_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.record_type, self.name)
    }
}

/// A record exactly as one layer defined it.
///
/// The metadata needed for indexing (type, ids, abstract name, ancestry
/// pointer) is parsed once at construction; the field map is never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    fields: Map<String, Value>,
    record_type: String,
    id: Option<IdField>,
    abstract_name: Option<String>,
}

impl RawRecord {
    /// Parse a record from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(fields) => Self::from_map(fields),
            _ => Err(RecordError::NotAnObject),
        }
    }

    pub fn from_map(fields: Map<String, Value>) -> Result<Self, RecordError> {
        let record_type = fields
            .get("type")
            .and_then(Value::as_str)
            .ok_or(RecordError::MissingType)?
            .to_string();
        let id = fields.get("id").and_then(IdField::parse);
        let abstract_name = fields
            .get("abstract")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            fields,
            record_type,
            id,
            abstract_name,
        })
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn id(&self) -> Option<&IdField> {
        self.id.as_ref()
    }

    pub fn abstract_name(&self) -> Option<&str> {
        self.abstract_name.as_deref()
    }

    /// A short human-readable label: first id, else abstract name.
    pub fn label(&self) -> &str {
        match (&self.id, &self.abstract_name) {
            (Some(id), _) => id.primary(),
            (None, Some(name)) => name,
            (None, None) => "<anonymous>",
        }
    }

    /// Whether `name` is one of this record's own identities.
    pub fn is_named(&self, name: &str) -> bool {
        self.id.as_ref().is_some_and(|id| id.contains(name))
            || self.abstract_name.as_deref() == Some(name)
    }

    /// The ancestry pointer, when it is a string.
    pub fn copy_from(&self) -> Option<&str> {
        self.fields.get(COPY_FROM).and_then(Value::as_str)
    }

    /// True when `copy-from` is present but not a string.
    pub fn has_malformed_copy_from(&self) -> bool {
        self.fields.get(COPY_FROM).is_some_and(|v| !v.is_string())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The record's fields with inheritance and modifier keys removed.
    pub fn strip_inert(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(k, _)| !INERT_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Serialize for RawRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl TryFrom<Value> for RawRecord {
    type Error = RecordError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}
