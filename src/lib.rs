//! modstack - layered game-data resolution
//!
//! Resolves records from a base data layer plus ordered overlays ("mods")
//! into flat records: `copy-from` inheritance, self-copies onto the layer
//! below, identifier migrations and the relative / proportional / extend /
//! delete modifier blocks. Also answers which overlays shaped a record.
//!
//! ```no_run
//! use modstack::{Dataset, Layer};
//! use serde_json::json;
//!
//! let base = Layer::from_values("base", vec![json!({"type": "X", "id": "a", "v": 10})])?;
//! let overlay = Layer::from_values(
//!     "mod",
//!     vec![json!({"type": "X", "id": "a", "copy-from": "a", "proportional": {"v": 0.5}})],
//! )?;
//!
//! let dataset = Dataset::build(vec![base, overlay]);
//! assert_eq!(dataset.by_id("X", "a")?.get_i64("v"), Some(5));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod ancestry;
pub mod config;
pub mod dataset;
pub mod diagnostics;
pub mod error;
pub mod flatten;
pub mod loader;
pub mod migration;
pub mod provenance;
pub mod resolved;
pub mod store;

pub use config::{ConfigError, StackConfig};
pub use dataset::{Dataset, DatasetOptions};
pub use error::QueryError;
pub use loader::{LayerLoader, LoadError};
pub use resolved::ResolvedRecord;
pub use store::TypeFamilies;

pub use modstack_modifiers::MergeRules;
pub use modstack_records::{Diagnostic, DiagnosticCode, Layer, LayerId, RawRecord};
