//! Layers: the ordered contributors to a dataset.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::record::RawRecord;

/// Stable name of a layer (the base corpus or one overlay).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One ordered contributor and the records it owns.
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: LayerId,
    pub records: Vec<RawRecord>,
}

impl Layer {
    pub fn new(id: impl Into<LayerId>, records: Vec<RawRecord>) -> Self {
        Self {
            id: id.into(),
            records,
        }
    }

    /// Build a layer from JSON values, failing on the first value that is
    /// not a record.
    pub fn from_values(
        id: impl Into<LayerId>,
        values: impl IntoIterator<Item = serde_json::Value>,
    ) -> Result<Self, crate::RecordError> {
        let records = values
            .into_iter()
            .map(RawRecord::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(id, records))
    }
}

impl From<String> for LayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
