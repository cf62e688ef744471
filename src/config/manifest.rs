//! Stack manifest: which layers make up a dataset and how they merge.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use modstack_modifiers::MergeRules;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use crate::dataset::DatasetOptions;
use crate::store::TypeFamilies;

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Manifest,
    Cli,
}

/// A contributing config source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// One layer of the stack: a stable id and where its records live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    pub path: PathBuf,
}

/// Globs applied when walking a layer directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadRules {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// The effective stack configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    pub base: LayerSpec,

    /// Overlays in manifest order, lowest priority first.
    #[serde(default, rename = "overlay")]
    pub overlays: Vec<LayerSpec>,

    #[serde(default)]
    pub rules: MergeRules,

    /// Family name -> member types.
    #[serde(default)]
    pub families: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub load: LoadRules,

    /// Contributing sources in precedence order
    #[serde(skip)]
    pub sources: Vec<ConfigSource>,
}

impl StackConfig {
    /// Build the effective config from an optional manifest file and CLI
    /// overrides. Relative layer paths resolve against the manifest's
    /// directory.
    pub fn build(manifest: Option<&Path>, cli_overrides: Option<Value>) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
        }];

        if let Some(path) = manifest {
            layers.push(Self::load_toml_file(path)?);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Manifest,
                path: Some(path.to_string_lossy().to_string()),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
            });
        }

        let merged = merge_layers(layers);
        let mut config: StackConfig = serde_json::from_value(merged)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        config.sources = sources;
        let configured = std::mem::take(&mut config.rules.set_fields);
        config.rules = MergeRules::default().with_set_fields(configured);
        config.validate()?;

        if let Some(dir) = manifest.and_then(Path::parent) {
            config.resolve_paths(dir);
        }

        tracing::debug!(
            base = %config.base.id,
            overlays = config.overlays.len(),
            "stack config loaded"
        );
        Ok(config)
    }

    /// Build from a manifest file alone.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::build(Some(path), None)
    }

    fn load_toml_file(path: &Path) -> Result<Value, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Ok(toml_to_json(toml_value))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for layer_spec in std::iter::once(&self.base).chain(&self.overlays) {
            if layer_spec.id.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "layer id must not be empty".to_string(),
                ));
            }
            if layer_spec.path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "layer '{}' has an empty path",
                    layer_spec.id
                )));
            }
            if !seen.insert(layer_spec.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate layer id '{}'",
                    layer_spec.id
                )));
            }
        }
        Ok(())
    }

    fn resolve_paths(&mut self, dir: &Path) {
        for layer_spec in std::iter::once(&mut self.base).chain(self.overlays.iter_mut()) {
            if layer_spec.path.is_relative() {
                layer_spec.path = dir.join(&layer_spec.path);
            }
        }
    }

    /// Active overlays in priority order. An empty selection activates
    /// every overlay in manifest order.
    pub fn select_overlays(&self, ids: &[String]) -> Result<Vec<&LayerSpec>, ConfigError> {
        if ids.is_empty() {
            return Ok(self.overlays.iter().collect());
        }
        ids.iter()
            .map(|id| {
                self.overlays
                    .iter()
                    .find(|layer_spec| &layer_spec.id == id)
                    .ok_or_else(|| ConfigError::ValidationError(format!("unknown overlay '{}'", id)))
            })
            .collect()
    }

    /// Dataset options carried by this config.
    pub fn options(&self) -> DatasetOptions {
        DatasetOptions {
            rules: self.rules.clone(),
            families: TypeFamilies::from_map(&self.families),
        }
    }
}

/// Convert TOML Value to JSON Value
fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn manifest(contents: &str) -> NamedTempFile {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "{}", contents).unwrap();
        temp
    }

    const MINIMAL: &str = r#"
[base]
id = "dda"
path = "data/json"
"#;

    #[test]
    fn test_minimal_manifest_gets_defaults() {
        let temp = manifest(MINIMAL);
        let config = StackConfig::load(temp.path()).unwrap();

        assert_eq!(config.base.id, "dda");
        assert!(config.overlays.is_empty());
        assert_eq!(config.rules.set_fields, ["flags"]);
        assert_eq!(config.load.include, ["**/*.json"]);
        assert!(config.families["item"].iter().any(|t| t == "GUN"));
    }

    #[test]
    fn test_relative_paths_resolve_against_manifest_dir() {
        let temp = manifest(MINIMAL);
        let config = StackConfig::load(temp.path()).unwrap();
        let dir = temp.path().parent().unwrap();
        assert_eq!(config.base.path, dir.join("data/json"));
    }

    #[test]
    fn test_overlays_in_manifest_order() {
        let temp = manifest(
            r#"
[base]
id = "dda"
path = "/data"

[[overlay]]
id = "first"
path = "/mods/first"

[[overlay]]
id = "second"
path = "/mods/second"
"#,
        );
        let config = StackConfig::load(temp.path()).unwrap();

        let all: Vec<_> = config
            .select_overlays(&[])
            .unwrap()
            .into_iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(all, ["first", "second"]);

        let picked: Vec<_> = config
            .select_overlays(&["second".to_string(), "first".to_string()])
            .unwrap()
            .into_iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(picked, ["second", "first"]);

        assert!(config.select_overlays(&["third".to_string()]).is_err());
    }

    #[test]
    fn test_cli_set_fields_add_to_manifest() {
        let temp = manifest(
            r#"
[base]
id = "dda"
path = "/data"

[rules]
set_fields = ["categories"]
"#,
        );
        let cli = serde_json::json!({"rules": {"set_fields": ["qualities"]}});
        let config = StackConfig::build(Some(temp.path()), Some(cli)).unwrap();

        assert_eq!(config.rules.set_fields, ["flags", "categories", "qualities"]);
        assert_eq!(config.sources.len(), 3);
        assert_eq!(config.sources[1].origin, ConfigOrigin::Manifest);
        assert_eq!(config.sources[2].origin, ConfigOrigin::Cli);
    }

    #[test]
    fn test_configured_set_fields_keep_flags_a_set() {
        use crate::dataset::Dataset;
        use modstack_records::Layer;
        use serde_json::json;

        let temp = manifest(
            r#"
[base]
id = "dda"
path = "/data"

[rules]
set_fields = ["categories"]
"#,
        );
        let config = StackConfig::load(temp.path()).unwrap();
        assert!(config.rules.is_set_field("flags"));
        assert!(config.rules.is_set_field("categories"));

        let base = Layer::from_values(
            "dda",
            [json!({"type": "X", "id": "a", "flags": ["A", "B"], "categories": ["tools"]})],
        )
        .unwrap();
        let overlay = Layer::from_values(
            "mod",
            [json!({
                "type": "X",
                "id": "a",
                "copy-from": "a",
                "extend": {"flags": ["B", "C"], "categories": ["tools", "weapons"]}
            })],
        )
        .unwrap();
        let ds = Dataset::with_options(vec![base, overlay], config.options());
        let record = ds.by_id("X", "a").unwrap();

        assert_eq!(record.get("flags"), Some(&json!(["A", "B", "C"])));
        assert_eq!(record.get("categories"), Some(&json!(["tools", "weapons"])));
    }

    #[test]
    fn test_families_merge_by_key() {
        let temp = manifest(
            r#"
[base]
id = "dda"
path = "/data"

[families]
monster = ["MONSTER", "SPECIES"]
"#,
        );
        let options = StackConfig::load(temp.path()).unwrap().options();
        assert_eq!(options.families.namespace("GUN"), "item");
        assert_eq!(options.families.namespace("SPECIES"), "monster");
    }

    #[test]
    fn test_missing_base_rejected() {
        let result = StackConfig::build(None, None);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let temp = manifest(
            r#"
[base]
id = "dda"
path = "/data"

[[overlay]]
id = "dda"
path = "/mods/x"
"#,
        );
        let err = StackConfig::load(temp.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate layer id"));
    }

    #[test]
    fn test_empty_path_rejected() {
        let cli = serde_json::json!({"base": {"id": "dda", "path": ""}});
        let err = StackConfig::build(None, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("empty path"));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let temp = manifest("[base\nid = ");
        assert!(matches!(
            StackConfig::load(temp.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_manifest_is_io_error() {
        let result = StackConfig::load(Path::new("/nonexistent/modstack.toml"));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
