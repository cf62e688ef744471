//! Reading layers from disk.
//!
//! A layer path is either one JSON file or a directory walked recursively
//! in file-name order. Each file holds an array of records or a single
//! record object.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use modstack_records::{Diagnostic, Layer, RawRecord};

use crate::config::{LayerSpec, LoadRules, StackConfig};

/// Errors for layer loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("layer path not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("glob pattern error: {0}")]
    Glob(#[from] globset::Error),
}

/// A loaded layer plus the entries that had to be skipped.
#[derive(Debug)]
pub struct LoadedLayer {
    pub layer: Layer,
    pub diagnostics: Vec<Diagnostic>,
}

/// Loads layers, filtering directory walks through include/exclude globs.
#[derive(Debug)]
pub struct LayerLoader {
    include: GlobSet,
    exclude: GlobSet,
}

impl LayerLoader {
    pub fn new(rules: &LoadRules) -> Result<Self, LoadError> {
        Ok(Self {
            include: build_set(&rules.include)?,
            exclude: build_set(&rules.exclude)?,
        })
    }

    /// Whether a path relative to the layer root is loaded.
    pub fn accepts(&self, rel_path: &Path) -> bool {
        let path_str = rel_path.to_string_lossy();
        (self.include.is_empty() || self.include.is_match(path_str.as_ref()))
            && !self.exclude.is_match(path_str.as_ref())
    }

    /// Load one layer.
    pub fn load(&self, layer_spec: &LayerSpec) -> Result<LoadedLayer, LoadError> {
        let root = &layer_spec.path;
        if !root.exists() {
            return Err(LoadError::NotFound(root.clone()));
        }

        let mut records = Vec::new();
        let mut diagnostics = Vec::new();

        for path in self.files(root)? {
            read_file(&path, &mut records, &mut diagnostics)?;
        }

        tracing::debug!(
            layer = %layer_spec.id,
            records = records.len(),
            skipped = diagnostics.len(),
            "layer loaded"
        );

        Ok(LoadedLayer {
            layer: Layer::new(layer_spec.id.as_str(), records),
            diagnostics,
        })
    }

    /// Load the base and the given overlays, in priority order.
    pub fn load_stack(
        &self,
        config: &StackConfig,
        overlays: &[&LayerSpec],
    ) -> Result<(Vec<Layer>, Vec<Diagnostic>), LoadError> {
        let mut layers = Vec::with_capacity(overlays.len() + 1);
        let mut diagnostics = Vec::new();

        for layer_spec in std::iter::once(&config.base).chain(overlays.iter().copied()) {
            let loaded = self.load(layer_spec)?;
            layers.push(loaded.layer);
            diagnostics.extend(loaded.diagnostics);
        }

        Ok((layers, diagnostics))
    }

    /// Files under `root` in walk order. A file root is returned as is.
    fn files(&self, root: &Path) -> Result<Vec<PathBuf>, LoadError> {
        if root.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel_path = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if self.accepts(rel_path) {
                files.push(entry.path().to_path_buf());
            }
        }
        Ok(files)
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet, LoadError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns.iter().filter(|p| !p.is_empty()) {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

fn read_file(
    path: &Path,
    records: &mut Vec<RawRecord>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), LoadError> {
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&contents).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let entries = match value {
        Value::Array(entries) => entries,
        single => vec![single],
    };

    let source = path.display().to_string();
    for (index, entry) in entries.into_iter().enumerate() {
        match RawRecord::from_value(entry) {
            Ok(record) => records.push(record),
            Err(e) => diagnostics.push(Diagnostic::malformed_record(&source, index, &e.to_string())),
        }
    }
    Ok(())
}
