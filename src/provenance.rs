//! Provenance: which overlays shaped a record.
//!
//! Provenance works on raw definitions only and never resolves fields. It
//! has its own memo tables, independent of the flatten cache.
//!
//! *Direct contributors* are the layers of the winning definition plus every
//! definition it reaches through consecutive self-copies, stopping at the
//! first definition that is not a self-copy. *The contributing chain* adds,
//! after that, the contributing chain of the external parent (if any), so it
//! covers the whole resolved lineage. The base layer is never reported.

use std::cell::RefCell;
use std::collections::HashMap;

use modstack_records::LayerId;

use crate::ancestry::{AncestryGuard, AncestryResolver, Parent};
use crate::store::{Identity, LayerStore, RecordIdx};

const BASE_LAYER: usize = 0;

/// Memo tables for provenance queries.
#[derive(Debug, Default)]
pub struct ProvenanceCache {
    direct: RefCell<HashMap<Identity, Vec<LayerId>>>,
    chain: RefCell<HashMap<Identity, Vec<LayerId>>>,
}

impl ProvenanceCache {
    pub fn len(&self) -> usize {
        self.direct.borrow().len() + self.chain.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The self-copy run below a winning definition.
struct Run {
    /// Layer indices, winner first.
    layers: Vec<usize>,
    /// Lowest definition in the run.
    bottom: RecordIdx,
}

pub struct ProvenanceTracer<'a> {
    store: &'a LayerStore,
    ancestry: AncestryResolver<'a>,
    cache: &'a ProvenanceCache,
}

impl<'a> ProvenanceTracer<'a> {
    pub fn new(
        store: &'a LayerStore,
        ancestry: AncestryResolver<'a>,
        cache: &'a ProvenanceCache,
    ) -> Self {
        Self {
            store,
            ancestry,
            cache,
        }
    }

    /// Overlays that produced the winning definition of `identity`, highest
    /// priority first. Empty for unknown identities.
    pub fn direct_contributors(&self, identity: &Identity) -> Vec<LayerId> {
        if let Some(hit) = self.cache.direct.borrow().get(identity) {
            return hit.clone();
        }

        let layers = match self.run(identity) {
            Some(run) => self.overlay_ids(&run.layers),
            None => Vec::new(),
        };

        self.cache
            .direct
            .borrow_mut()
            .insert(identity.clone(), layers.clone());
        layers
    }

    /// Overlays across the full lineage of `identity`, the record's own run
    /// first, then each ancestor's.
    pub fn contributing_chain(&self, identity: &Identity) -> Vec<LayerId> {
        let mut guard = AncestryGuard::default();
        self.chain_guarded(identity, &mut guard).0
    }

    /// Returns the chain and whether a cycle cut it short.
    fn chain_guarded(
        &self,
        identity: &Identity,
        guard: &mut AncestryGuard<Identity>,
    ) -> (Vec<LayerId>, bool) {
        if let Some(hit) = self.cache.chain.borrow().get(identity) {
            return (hit.clone(), false);
        }
        if !guard.enter(identity.clone()) {
            return (Vec::new(), true);
        }

        let mut cyclic = false;
        let mut layers = Vec::new();

        if let Some(run) = self.run(identity) {
            layers = self.overlay_ids(&run.layers);

            if let Parent::External {
                identity: parent, ..
            } = self.ancestry.resolve_parent(run.bottom)
            {
                let (inherited, parent_cyclic) = self.chain_guarded(&parent, guard);
                cyclic = parent_cyclic;
                for layer in inherited {
                    if !layers.contains(&layer) {
                        layers.push(layer);
                    }
                }
            }
        }

        guard.leave();

        if !cyclic {
            self.cache
                .chain
                .borrow_mut()
                .insert(identity.clone(), layers.clone());
        }
        (layers, cyclic)
    }

    /// Walk down from the winner while each definition self-copies.
    fn run(&self, identity: &Identity) -> Option<Run> {
        let mut idx = self.store.winner(identity)?;
        let mut layers = Vec::new();

        loop {
            layers.push(self.store.get(idx).layer);
            match self.ancestry.resolve_parent(idx) {
                Parent::Underlay { idx: below } => idx = below,
                _ => break,
            }
        }

        Some(Run {
            layers,
            bottom: idx,
        })
    }

    fn overlay_ids(&self, layers: &[usize]) -> Vec<LayerId> {
        let mut ids: Vec<LayerId> = Vec::with_capacity(layers.len());
        for layer in layers.iter().filter(|l| **l != BASE_LAYER) {
            let id = self.store.layer_id(*layer);
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::MigrationTable;
    use crate::store::TypeFamilies;
    use modstack_records::Layer;
    use serde_json::{json, Value};

    fn store(layers: Vec<(&str, Vec<Value>)>) -> LayerStore {
        let layers = layers
            .into_iter()
            .map(|(id, values)| Layer::from_values(id, values).unwrap())
            .collect();
        LayerStore::build(layers, TypeFamilies::none())
    }

    fn ids(layers: &[LayerId]) -> Vec<&str> {
        layers.iter().map(LayerId::as_str).collect()
    }

    #[test]
    fn test_base_only_is_empty() {
        let s = store(vec![("base", vec![json!({"type": "X", "id": "a"})])]);
        let m = MigrationTable::default();
        let cache = ProvenanceCache::default();
        let tracer = ProvenanceTracer::new(&s, AncestryResolver::new(&s, &m), &cache);
        let a = Identity::concrete("X", "a");
        assert!(tracer.direct_contributors(&a).is_empty());
        assert!(tracer.contributing_chain(&a).is_empty());
    }

    #[test]
    fn test_self_copy_run_collapses() {
        let s = store(vec![
            ("base", vec![json!({"type": "X", "id": "a", "v": 1})]),
            ("m1", vec![json!({"type": "X", "id": "a", "copy-from": "a"})]),
            ("m2", vec![json!({"type": "X", "id": "a", "copy-from": "a"})]),
        ]);
        let m = MigrationTable::default();
        let cache = ProvenanceCache::default();
        let tracer = ProvenanceTracer::new(&s, AncestryResolver::new(&s, &m), &cache);
        let a = Identity::concrete("X", "a");
        assert_eq!(ids(&tracer.direct_contributors(&a)), ["m2", "m1"]);
    }

    #[test]
    fn test_full_override_stops_run() {
        let s = store(vec![
            ("base", vec![json!({"type": "X", "id": "a", "v": 1})]),
            ("m1", vec![json!({"type": "X", "id": "a", "copy-from": "a"})]),
            ("m2", vec![json!({"type": "X", "id": "a", "v": 9})]),
        ]);
        let m = MigrationTable::default();
        let cache = ProvenanceCache::default();
        let tracer = ProvenanceTracer::new(&s, AncestryResolver::new(&s, &m), &cache);
        assert_eq!(
            ids(&tracer.direct_contributors(&Identity::concrete("X", "a"))),
            ["m2"]
        );
    }

    #[test]
    fn test_chain_includes_external_parent() {
        let s = store(vec![
            ("base", vec![json!({"type": "X", "id": "p", "v": 1})]),
            ("m1", vec![json!({"type": "X", "id": "p", "copy-from": "p", "relative": {"v": 1}})]),
            ("m2", vec![json!({"type": "X", "id": "c", "copy-from": "p"})]),
        ]);
        let m = MigrationTable::default();
        let cache = ProvenanceCache::default();
        let tracer = ProvenanceTracer::new(&s, AncestryResolver::new(&s, &m), &cache);
        let c = Identity::concrete("X", "c");
        assert_eq!(ids(&tracer.direct_contributors(&c)), ["m2"]);
        assert_eq!(ids(&tracer.contributing_chain(&c)), ["m2", "m1"]);
    }

    #[test]
    fn test_chain_survives_cycle() {
        let s = store(vec![
            ("base", vec![]),
            (
                "m1",
                vec![
                    json!({"type": "X", "id": "a", "copy-from": "b"}),
                    json!({"type": "X", "id": "b", "copy-from": "a"}),
                ],
            ),
        ]);
        let m = MigrationTable::default();
        let cache = ProvenanceCache::default();
        let tracer = ProvenanceTracer::new(&s, AncestryResolver::new(&s, &m), &cache);
        assert_eq!(
            ids(&tracer.contributing_chain(&Identity::concrete("X", "a"))),
            ["m1"]
        );
    }
}
