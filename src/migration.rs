//! Identifier migrations (retired id -> current id).

use std::collections::HashMap;

use modstack_records::MIGRATION_TYPE;
use serde_json::Value;

use crate::store::LayerStore;

/// Rename table built from `MIGRATION` records.
///
/// Lookups follow a single hop only: if `a -> b` and `b -> c` are both
/// present, `a` resolves to `b`.
#[derive(Debug, Clone, Default)]
pub struct MigrationTable {
    renames: HashMap<String, String>,
}

impl MigrationTable {
    /// Scan every `MIGRATION` record in the store, lowest layer first, so a
    /// later layer's rename of the same id wins.
    pub fn build(store: &LayerStore) -> Self {
        let mut renames = HashMap::new();

        for (_, stored) in store.records() {
            let record = &stored.record;
            if record.record_type() != MIGRATION_TYPE {
                continue;
            }
            let (Some(ids), Some(replacement)) =
                (record.id(), record.get("replace").and_then(Value::as_str))
            else {
                tracing::debug!(record = record.label(), "migration without id or replace");
                continue;
            };
            for old in ids.names() {
                renames.insert(old.clone(), replacement.to_string());
            }
        }

        tracing::debug!(renames = renames.len(), "migration table built");
        Self { renames }
    }

    /// The current id for `id`; unchanged when it was never renamed.
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.renames.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TypeFamilies;
    use modstack_records::Layer;
    use serde_json::json;

    fn table(layers: Vec<Vec<serde_json::Value>>) -> MigrationTable {
        let layers = layers
            .into_iter()
            .enumerate()
            .map(|(i, values)| Layer::from_values(format!("layer{}", i), values).unwrap())
            .collect();
        MigrationTable::build(&LayerStore::build(layers, TypeFamilies::none()))
    }

    #[test]
    fn test_single_and_list_ids() {
        let t = table(vec![vec![
            json!({"type": "MIGRATION", "id": "old_x", "replace": "new_x"}),
            json!({"type": "MIGRATION", "id": ["old_y", "older_y"], "replace": "new_y"}),
        ]]);
        assert_eq!(t.resolve("old_x"), "new_x");
        assert_eq!(t.resolve("older_y"), "new_y");
        assert_eq!(t.resolve("unrelated"), "unrelated");
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_single_hop_only() {
        let t = table(vec![vec![
            json!({"type": "MIGRATION", "id": "a", "replace": "b"}),
            json!({"type": "MIGRATION", "id": "b", "replace": "c"}),
        ]]);
        assert_eq!(t.resolve("a"), "b");
    }

    #[test]
    fn test_later_layer_wins() {
        let t = table(vec![
            vec![json!({"type": "MIGRATION", "id": "a", "replace": "b"})],
            vec![json!({"type": "MIGRATION", "id": "a", "replace": "z"})],
        ]);
        assert_eq!(t.resolve("a"), "z");
    }

    #[test]
    fn test_incomplete_record_ignored() {
        let t = table(vec![vec![json!({"type": "MIGRATION", "id": "a"})]]);
        assert!(t.is_empty());
    }
}
