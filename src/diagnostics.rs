//! Collected diagnostics for one dataset.

use std::cell::RefCell;
use std::collections::HashSet;

use modstack_records::{Diagnostic, DiagnosticCode};

/// Append-only diagnostic log, de-duplicated per `(code, record, message)`.
///
/// Every new diagnostic is also logged at `warn` level.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: RefCell<Vec<Diagnostic>>,
    seen: RefCell<HashSet<(DiagnosticCode, Option<String>, String)>>,
}

impl DiagnosticLog {
    pub fn emit(&self, diagnostic: Diagnostic) {
        let key = (
            diagnostic.code,
            diagnostic.record.clone(),
            diagnostic.message.clone(),
        );
        if !self.seen.borrow_mut().insert(key) {
            return;
        }

        tracing::warn!(code = %diagnostic.code, "{}", diagnostic.message);
        self.entries.borrow_mut().push(diagnostic);
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
