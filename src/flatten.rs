//! Flatten engine: raw record -> resolved record.
//!
//! Resolution is lazy and memoized per arena entry, so a record is
//! resolved at most once per dataset however often it is queried or
//! inherited from. The one exception is a record whose ancestry runs into
//! a cycle: its degraded result depends on where the cycle was entered, so
//! it is recomputed on every query rather than cached.

use std::cell::OnceCell;
use std::sync::Arc;

use modstack_modifiers::{apply, merge_inherited, MergeRules, Modifiers};
use modstack_records::Diagnostic;

use crate::ancestry::{AncestryGuard, AncestryResolver, Parent};
use crate::diagnostics::DiagnosticLog;
use crate::resolved::ResolvedRecord;
use crate::store::{LayerStore, RecordIdx, StoredRecord};

/// Memo table, one slot per arena entry.
#[derive(Debug)]
pub struct FlattenCache {
    cells: Vec<OnceCell<Arc<ResolvedRecord>>>,
}

impl FlattenCache {
    pub fn new(len: usize) -> Self {
        Self {
            cells: (0..len).map(|_| OnceCell::new()).collect(),
        }
    }

    pub fn get(&self, idx: RecordIdx) -> Option<Arc<ResolvedRecord>> {
        self.cells[idx].get().cloned()
    }

    /// Number of records resolved so far.
    pub fn resolved_count(&self) -> usize {
        self.cells.iter().filter(|c| c.get().is_some()).count()
    }
}

struct Resolution {
    record: Arc<ResolvedRecord>,
    /// The ancestry walk hit a cycle somewhere below this record.
    cyclic: bool,
}

/// Resolves records against one store, filling a [`FlattenCache`].
pub struct FlattenEngine<'a> {
    store: &'a LayerStore,
    ancestry: AncestryResolver<'a>,
    cache: &'a FlattenCache,
    rules: &'a MergeRules,
    diagnostics: &'a DiagnosticLog,
}

impl<'a> FlattenEngine<'a> {
    pub fn new(
        store: &'a LayerStore,
        ancestry: AncestryResolver<'a>,
        cache: &'a FlattenCache,
        rules: &'a MergeRules,
        diagnostics: &'a DiagnosticLog,
    ) -> Self {
        Self {
            store,
            ancestry,
            cache,
            rules,
            diagnostics,
        }
    }

    /// Resolve the record at `idx`.
    pub fn resolve(&self, idx: RecordIdx) -> Arc<ResolvedRecord> {
        let mut guard = AncestryGuard::default();
        self.resolve_guarded(idx, &mut guard).record
    }

    fn resolve_guarded(&self, idx: RecordIdx, guard: &mut AncestryGuard) -> Resolution {
        if let Some(record) = self.cache.get(idx) {
            return Resolution {
                record,
                cyclic: false,
            };
        }

        let stored = self.store.get(idx);

        if !guard.enter(idx) {
            let chain: Vec<String> = guard
                .chain()
                .iter()
                .chain(std::iter::once(&idx))
                .map(|i| self.store.get(*i).key().to_string())
                .collect();
            self.diagnostics
                .emit(Diagnostic::cyclic_ancestry(&stored.key(), &chain));
            return Resolution {
                record: root(stored),
                cyclic: true,
            };
        }

        let resolution = match self.ancestry.resolve_parent(idx) {
            Parent::Root => Resolution {
                record: root(stored),
                cyclic: false,
            },
            Parent::External { idx: parent, .. } | Parent::Underlay { idx: parent } => {
                let parent = self.resolve_guarded(parent, guard);
                Resolution {
                    record: self.inherit(stored, &parent.record),
                    cyclic: parent.cyclic,
                }
            }
            Parent::Missing { target } => {
                self.diagnostics
                    .emit(Diagnostic::missing_parent(&stored.key(), &target));
                Resolution {
                    record: root(stored),
                    cyclic: false,
                }
            }
            Parent::SelfWithoutUnderlay => {
                self.diagnostics.emit(Diagnostic::self_copy_without_underlay(
                    &stored.key(),
                    stored.layer,
                ));
                Resolution {
                    record: root(stored),
                    cyclic: false,
                }
            }
            Parent::Malformed => {
                let value = stored
                    .record
                    .get(modstack_records::COPY_FROM)
                    .cloned()
                    .unwrap_or_default();
                self.diagnostics
                    .emit(Diagnostic::malformed_copy_from(&stored.key(), &value));
                Resolution {
                    record: root(stored),
                    cyclic: false,
                }
            }
        };

        guard.leave();

        if resolution.cyclic {
            tracing::debug!(record = %stored.key(), "cyclic ancestry, result not cached");
            return resolution;
        }

        let record = self.cache.cells[idx]
            .get_or_init(|| resolution.record)
            .clone();
        Resolution {
            record,
            cyclic: false,
        }
    }

    /// Child's own fields over the resolved parent, then the child's modifiers.
    fn inherit(&self, stored: &StoredRecord, parent: &ResolvedRecord) -> Arc<ResolvedRecord> {
        let record = &stored.record;
        let mut merged = merge_inherited(parent.fields(), &record.strip_inert(), record.record_type());

        let modifiers = Modifiers::from_fields(record.fields());
        if !modifiers.is_empty() {
            let report = apply(&mut merged, record.record_type(), &modifiers, self.rules);
            for skipped in &report.unapplied {
                self.diagnostics.emit(Diagnostic::unapplied_modifier(
                    &stored.key(),
                    skipped.block.key(),
                    &skipped.field,
                    &skipped.reason,
                ));
            }
        }

        Arc::new(ResolvedRecord::new(merged))
    }
}

/// A record resolved without ancestry: own fields, modifiers dropped.
fn root(stored: &StoredRecord) -> Arc<ResolvedRecord> {
    Arc::new(ResolvedRecord::new(stored.record.strip_inert()))
}
