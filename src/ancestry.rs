//! Ancestry resolution: finding the raw record a `copy-from` points at.
//!
//! A `copy-from` naming a different identity is an *external* reference and
//! resolves to that identity's winning definition (concrete id first, then
//! abstract template). A `copy-from` naming the record's own identity is a
//! *self-copy* and resolves to the most recent definition of that identity
//! in a strictly lower layer.

use crate::migration::MigrationTable;
use crate::store::{Identity, LayerStore, RecordIdx, StoredRecord};

/// Outcome of looking up a record's parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parent {
    /// No `copy-from`.
    Root,
    /// A different identity's winning definition.
    External { idx: RecordIdx, identity: Identity },
    /// The same identity, defined in a lower layer.
    Underlay { idx: RecordIdx },
    /// Target not found, even after following migrations.
    Missing { target: String },
    /// Self-copy with nothing underneath.
    SelfWithoutUnderlay,
    /// `copy-from` present but not a string.
    Malformed,
}

/// Looks up parents against one store and its migrations.
#[derive(Debug, Clone, Copy)]
pub struct AncestryResolver<'a> {
    store: &'a LayerStore,
    migrations: &'a MigrationTable,
}

impl<'a> AncestryResolver<'a> {
    pub fn new(store: &'a LayerStore, migrations: &'a MigrationTable) -> Self {
        Self { store, migrations }
    }

    /// Parent of the record at `idx`, interpreted at that record's layer.
    pub fn resolve_parent(&self, idx: RecordIdx) -> Parent {
        let stored = self.store.get(idx);
        let record = &stored.record;

        if record.has_malformed_copy_from() {
            return Parent::Malformed;
        }
        let Some(target) = record.copy_from() else {
            return Parent::Root;
        };

        let migrated = self.migrations.resolve(target);
        let candidates = std::iter::once(migrated).chain((migrated != target).then_some(target));

        for candidate in candidates {
            if record.is_named(candidate) {
                return self.underlay(stored, candidate);
            }
            if let Some((identity, idx)) = self.store.find(&stored.namespace, candidate) {
                return Parent::External { idx, identity };
            }
        }

        Parent::Missing {
            target: migrated.to_string(),
        }
    }

    fn underlay(&self, stored: &StoredRecord, name: &str) -> Parent {
        let identity = if stored.record.id().is_some_and(|id| id.contains(name)) {
            Identity::concrete(&stored.namespace, name)
        } else {
            Identity::template(&stored.namespace, name)
        };

        self.store
            .history(&identity)
            .iter()
            .rev()
            .copied()
            .find(|candidate| self.store.get(*candidate).layer < stored.layer)
            .map(|idx| Parent::Underlay { idx })
            .unwrap_or(Parent::SelfWithoutUnderlay)
    }
}

/// Per-resolution visited set. Entering an item already on the chain
/// signals a cycle.
#[derive(Debug, Clone)]
pub struct AncestryGuard<T = RecordIdx> {
    chain: Vec<T>,
}

impl<T> Default for AncestryGuard<T> {
    fn default() -> Self {
        Self { chain: Vec::new() }
    }
}

impl<T: PartialEq> AncestryGuard<T> {
    /// Push `item`; `false` (and no push) if it is already on the chain.
    pub fn enter(&mut self, item: T) -> bool {
        if self.chain.contains(&item) {
            return false;
        }
        self.chain.push(item);
        true
    }

    pub fn leave(&mut self) {
        self.chain.pop();
    }

    pub fn chain(&self) -> &[T] {
        &self.chain
    }
}
