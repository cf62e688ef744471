//! Shared fixtures for integration tests
//!
//! - In-memory layer stacks built from `json!` values
//! - The on-disk stack under `tests/fixtures/stack` (base `dda`, overlays
//!   `aftershock` and `magiclysm`)

#![allow(dead_code)]

use modstack::{Dataset, Layer, LayerId, LayerLoader, StackConfig};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Path to the fixture stack manifest
pub fn stack_manifest_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/stack/modstack.toml")
}

/// Build a layer, panicking on values that are not records
pub fn layer(id: &str, values: Vec<Value>) -> Layer {
    Layer::from_values(id, values).expect("fixture values are records")
}

/// Dataset over `(layer id, records)` pairs, base first
pub fn dataset(layers: Vec<(&str, Vec<Value>)>) -> Dataset {
    Dataset::build(
        layers
            .into_iter()
            .map(|(id, values)| layer(id, values))
            .collect(),
    )
}

/// Dataset over the fixture stack with the given overlays active
/// (all overlays when empty)
pub fn fixture_stack(overlays: &[&str]) -> Dataset {
    let config = StackConfig::load(&stack_manifest_path()).expect("fixture manifest loads");
    let ids: Vec<String> = overlays.iter().map(|s| s.to_string()).collect();
    let selected = config.select_overlays(&ids).expect("fixture overlays exist");

    let loader = LayerLoader::new(&config.load).expect("fixture globs are valid");
    let (layers, diagnostics) = loader
        .load_stack(&config, &selected)
        .expect("fixture layers load");

    let dataset = Dataset::with_options(layers, config.options());
    dataset.record_diagnostics(diagnostics);
    dataset
}

/// Layer ids as plain strings
pub fn ids(layers: &[LayerId]) -> Vec<&str> {
    layers.iter().map(LayerId::as_str).collect()
}
