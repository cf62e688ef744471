//! The query surface over one loaded layer stack.

use std::sync::Arc;

use modstack_modifiers::MergeRules;
use modstack_records::{Diagnostic, Layer, LayerId};

use crate::ancestry::AncestryResolver;
use crate::diagnostics::DiagnosticLog;
use crate::error::QueryError;
use crate::flatten::{FlattenCache, FlattenEngine};
use crate::migration::MigrationTable;
use crate::provenance::{ProvenanceCache, ProvenanceTracer};
use crate::resolved::ResolvedRecord;
use crate::store::{Identity, LayerStore, RecordIdx, TypeFamilies};

/// Knobs for building a [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct DatasetOptions {
    pub rules: MergeRules,
    pub families: TypeFamilies,
}

/// One layer stack: base first, then active overlays in priority order.
///
/// The stack is fixed for the dataset's lifetime; selecting different
/// overlays means building a new dataset. All caches belong to the dataset
/// instance, so independent datasets never share state.
///
/// Queries take `&self` and fill the caches lazily; a dataset is meant to
/// be used from one thread.
#[derive(Debug)]
pub struct Dataset {
    store: LayerStore,
    migrations: MigrationTable,
    rules: MergeRules,
    flatten_cache: FlattenCache,
    provenance_cache: ProvenanceCache,
    diagnostics: DiagnosticLog,
}

impl Dataset {
    /// Build with default merge rules and type families.
    pub fn build(layers: Vec<Layer>) -> Self {
        Self::with_options(layers, DatasetOptions::default())
    }

    pub fn with_options(layers: Vec<Layer>, options: DatasetOptions) -> Self {
        let store = LayerStore::build(layers, options.families);
        let migrations = MigrationTable::build(&store);
        let flatten_cache = FlattenCache::new(store.len());

        tracing::info!(
            layers = store.layers().len(),
            records = store.len(),
            migrations = migrations.len(),
            "dataset built"
        );

        Self {
            store,
            migrations,
            rules: options.rules,
            flatten_cache,
            provenance_cache: ProvenanceCache::default(),
            diagnostics: DiagnosticLog::default(),
        }
    }

    fn ancestry(&self) -> AncestryResolver<'_> {
        AncestryResolver::new(&self.store, &self.migrations)
    }

    fn flatten(&self) -> FlattenEngine<'_> {
        FlattenEngine::new(
            &self.store,
            self.ancestry(),
            &self.flatten_cache,
            &self.rules,
            &self.diagnostics,
        )
    }

    fn provenance(&self) -> ProvenanceTracer<'_> {
        ProvenanceTracer::new(&self.store, self.ancestry(), &self.provenance_cache)
    }

    /// Find the concrete identity `id` names, following a migration first
    /// and falling back to the literal id if the migrated one is undefined.
    fn locate(&self, record_type: &str, id: &str) -> Option<(Identity, RecordIdx)> {
        let namespace = self.store.namespace(record_type);
        let migrated = self.migrations.resolve(id);

        std::iter::once(migrated)
            .chain((migrated != id).then_some(id))
            .map(|candidate| Identity::concrete(namespace, candidate))
            .find_map(|identity| self.store.winner(&identity).map(|idx| (identity, idx)))
    }

    /// Resolved record for `(record_type, id)`.
    ///
    /// `record_type` may be a concrete type or a family name.
    pub fn by_id(&self, record_type: &str, id: &str) -> Result<Arc<ResolvedRecord>, QueryError> {
        if id.is_empty() {
            return Err(QueryError::InvalidIdentifier(id.to_string()));
        }
        self.by_id_maybe(record_type, id)
            .ok_or_else(|| QueryError::UnknownIdentifier {
                record_type: record_type.to_string(),
                id: id.to_string(),
            })
    }

    pub fn by_id_maybe(&self, record_type: &str, id: &str) -> Option<Arc<ResolvedRecord>> {
        let (_, idx) = self.locate(record_type, id)?;
        Some(self.flatten().resolve(idx))
    }

    /// Every winning record of a type. A family name yields the whole
    /// namespace; a concrete member type only records of that type.
    pub fn by_type(&self, record_type: &str) -> Vec<Arc<ResolvedRecord>> {
        let namespace = self.store.namespace(record_type);
        let narrow = self.store.families().is_member(record_type);
        let engine = self.flatten();

        self.store
            .winners_in(namespace)
            .into_iter()
            .filter(|idx| !narrow || self.store.get(*idx).record.record_type() == record_type)
            .map(|idx| engine.resolve(idx))
            .collect()
    }

    /// Resolved abstract template `(record_type, name)`.
    pub fn abstract_by_id(&self, record_type: &str, name: &str) -> Option<Arc<ResolvedRecord>> {
        let identity = Identity::template(self.store.namespace(record_type), name);
        let idx = self.store.winner(&identity)?;
        Some(self.flatten().resolve(idx))
    }

    /// Overlays that produced the winning definition, highest priority
    /// first. Empty for base-only or unknown records.
    pub fn direct_contributors(&self, record_type: &str, id: &str) -> Vec<LayerId> {
        match self.locate(record_type, id) {
            Some((identity, _)) => self.provenance().direct_contributors(&identity),
            None => Vec::new(),
        }
    }

    /// Overlays across the record's full resolved lineage.
    pub fn contributing_chain(&self, record_type: &str, id: &str) -> Vec<LayerId> {
        match self.locate(record_type, id) {
            Some((identity, _)) => self.provenance().contributing_chain(&identity),
            None => Vec::new(),
        }
    }

    /// Resolve every addressable record, returning how many were resolved.
    pub fn resolve_all(&self) -> usize {
        let engine = self.flatten();
        let mut count = 0;
        for (idx, stored) in self.store.records() {
            if stored.record.id().is_some() || stored.record.abstract_name().is_some() {
                engine.resolve(idx);
                count += 1;
            }
        }
        count
    }

    /// Add diagnostics found outside resolution (e.g. while loading).
    pub fn record_diagnostics(&self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.diagnostics.emit(diagnostic);
        }
    }

    /// Every diagnostic emitted so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.snapshot()
    }

    pub fn layers(&self) -> &[LayerId] {
        self.store.layers()
    }

    /// Records contributed by each layer, in layer order.
    pub fn layer_record_counts(&self) -> Vec<(LayerId, usize)> {
        self.store
            .layers()
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), self.store.layer_record_count(i)))
            .collect()
    }

    pub fn store(&self) -> &LayerStore {
        &self.store
    }

    pub fn migrations(&self) -> &MigrationTable {
        &self.migrations
    }

    /// Number of records resolved and cached so far.
    pub fn resolved_count(&self) -> usize {
        self.flatten_cache.resolved_count()
    }

    /// Number of memoized provenance answers.
    pub fn provenance_cached(&self) -> usize {
        self.provenance_cache.len()
    }
}
