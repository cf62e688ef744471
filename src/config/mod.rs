//! Stack manifest configuration.
//!
//! The effective configuration is a deep merge of three sources, lowest
//! precedence first:
//! 1. Built-in defaults
//! 2. The stack manifest (`modstack.toml`)
//! 3. CLI overrides

mod defaults;
mod manifest;
mod merge;

pub use defaults::BuiltinDefaults;
pub use manifest::{ConfigError, ConfigOrigin, ConfigSource, LayerSpec, LoadRules, StackConfig};
pub use merge::{deep_merge, merge_layers};
