//! Raw layer store.
//!
//! Records from every layer live in one arena, in load order. Each identity
//! keeps the full list of its definitions across layers (its history); the
//! winning definition is simply the last entry. Keeping the history, not just
//! the winner, is what makes "inherit from the layer below me" and
//! provenance answerable.

mod families;

pub use families::{TypeFamilies, DEFAULT_ITEM_TYPES};

use std::collections::HashMap;

use modstack_records::{Layer, LayerId, RawRecord, RecordKey};

/// Index of a record in the store's arena.
pub type RecordIdx = usize;

/// Whether an identity names a concrete record or an abstract template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentityKind {
    Concrete,
    Abstract,
}

/// A name inside a namespace, concrete ids and abstract names kept apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    pub kind: IdentityKind,
    pub key: RecordKey,
}

impl Identity {
    pub fn concrete(namespace: &str, id: &str) -> Self {
        Self {
            kind: IdentityKind::Concrete,
            key: RecordKey::new(namespace, id),
        }
    }

    pub fn template(namespace: &str, name: &str) -> Self {
        Self {
            kind: IdentityKind::Abstract,
            key: RecordKey::new(namespace, name),
        }
    }
}

/// One arena entry.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    /// Index into the store's layer list; 0 is the base layer.
    pub layer: usize,
    /// Namespace the record's ids live in.
    pub namespace: String,
    pub record: RawRecord,
}

impl StoredRecord {
    /// Key used in diagnostics.
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.namespace.as_str(), self.record.label())
    }
}

/// All raw records of one layer stack, indexed by identity.
#[derive(Debug)]
pub struct LayerStore {
    layers: Vec<LayerId>,
    arena: Vec<StoredRecord>,
    histories: HashMap<Identity, Vec<RecordIdx>>,
    id_order: HashMap<String, Vec<String>>,
    families: TypeFamilies,
}

impl LayerStore {
    /// Index `layers`, lowest priority first.
    pub fn build(layers: Vec<Layer>, families: TypeFamilies) -> Self {
        let mut store = Self {
            layers: Vec::with_capacity(layers.len()),
            arena: Vec::new(),
            histories: HashMap::new(),
            id_order: HashMap::new(),
            families,
        };

        for (layer_index, layer) in layers.into_iter().enumerate() {
            store.layers.push(layer.id);
            for record in layer.records {
                store.insert(layer_index, record);
            }
        }

        tracing::debug!(
            layers = store.layers.len(),
            records = store.arena.len(),
            identities = store.histories.len(),
            "layer store built"
        );
        store
    }

    fn insert(&mut self, layer: usize, record: RawRecord) {
        let idx = self.arena.len();
        let namespace = self.families.namespace(record.record_type()).to_string();

        if let Some(id) = record.id() {
            for name in id.names() {
                let identity = Identity::concrete(&namespace, name);
                let history = self.histories.entry(identity).or_default();
                if history.is_empty() {
                    self.id_order
                        .entry(namespace.clone())
                        .or_default()
                        .push(name.clone());
                }
                history.push(idx);
            }
        }

        if let Some(name) = record.abstract_name() {
            self.histories
                .entry(Identity::template(&namespace, name))
                .or_default()
                .push(idx);
        }

        if record.id().is_none() && record.abstract_name().is_none() {
            tracing::debug!(
                record_type = record.record_type(),
                layer,
                "record without id or abstract name is not addressable"
            );
        }

        self.arena.push(StoredRecord {
            layer,
            namespace,
            record,
        });
    }

    pub fn layers(&self) -> &[LayerId] {
        &self.layers
    }

    pub fn layer_id(&self, layer: usize) -> &LayerId {
        &self.layers[layer]
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn get(&self, idx: RecordIdx) -> &StoredRecord {
        &self.arena[idx]
    }

    /// Every stored record, in load order.
    pub fn records(&self) -> impl Iterator<Item = (RecordIdx, &StoredRecord)> {
        self.arena.iter().enumerate()
    }

    /// Number of records a layer contributed.
    pub fn layer_record_count(&self, layer: usize) -> usize {
        self.arena.iter().filter(|r| r.layer == layer).count()
    }

    pub fn families(&self) -> &TypeFamilies {
        &self.families
    }

    pub fn namespace<'a>(&'a self, record_type: &'a str) -> &'a str {
        self.families.namespace(record_type)
    }

    /// All definitions of `identity`, lowest layer first.
    pub fn history(&self, identity: &Identity) -> &[RecordIdx] {
        self.histories
            .get(identity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The winning (highest-priority) definition of `identity`.
    pub fn winner(&self, identity: &Identity) -> Option<RecordIdx> {
        self.history(identity).last().copied()
    }

    /// Look `name` up as a concrete id, then as an abstract template.
    pub fn find(&self, namespace: &str, name: &str) -> Option<(Identity, RecordIdx)> {
        [
            Identity::concrete(namespace, name),
            Identity::template(namespace, name),
        ]
        .into_iter()
        .find_map(|identity| self.winner(&identity).map(|idx| (identity, idx)))
    }

    /// Winning concrete records of a namespace, in first-registration order.
    /// A record reachable through several aliases appears once.
    pub fn winners_in(&self, namespace: &str) -> Vec<RecordIdx> {
        let Some(ids) = self.id_order.get(namespace) else {
            return Vec::new();
        };

        let mut winners: Vec<RecordIdx> = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(idx) = self.winner(&Identity::concrete(namespace, id)) {
                if !winners.contains(&idx) {
                    winners.push(idx);
                }
            }
        }
        winners
    }
}
