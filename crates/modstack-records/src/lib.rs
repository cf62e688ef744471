//! modstack record types
//!
//! Defines the raw record model shared by the layer store and the modifier
//! applicator, plus the diagnostic vocabulary for non-fatal data problems.

pub mod diagnostic;
pub mod layer;
pub mod record;

pub use diagnostic::{Diagnostic, DiagnosticCode};
pub use layer::{Layer, LayerId};
pub use record::{IdField, RawRecord, RecordError, RecordKey};

/// Inheritance reference key.
pub const COPY_FROM: &str = "copy-from";

/// Additive modifier block.
pub const RELATIVE: &str = "relative";

/// Multiplicative modifier block.
pub const PROPORTIONAL: &str = "proportional";

/// List-append modifier block.
pub const EXTEND: &str = "extend";

/// List-removal modifier block.
pub const DELETE: &str = "delete";

/// Keys that never survive into a resolved record.
pub const INERT_KEYS: &[&str] = &[COPY_FROM, RELATIVE, PROPORTIONAL, EXTEND, DELETE];

/// Record type carrying identifier renames.
pub const MIGRATION_TYPE: &str = "MIGRATION";
