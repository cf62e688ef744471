//! Merging config sources (builtin, manifest, CLI).
//!
//! Tables merge by key and later scalars win. Arrays are replaced by the
//! later source, except the set-field lists under `UNION_ARRAYS`, which
//! accumulate so a manifest or `--set-field` only adds names.
//!
//! Record inheritance has its own rules in `modstack-modifiers`.

use serde_json::Value;

/// Dotted config paths whose arrays are unioned across sources.
const UNION_ARRAYS: &[&str] = &["rules.set_fields"];

/// Merge `overlay` onto `base`.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    merge_at("", base, overlay)
}

fn merge_at(path: &str, base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let key_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                let merged = match base_map.remove(&key) {
                    Some(base_value) => merge_at(&key_path, base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        (Value::Array(mut names), Value::Array(extra)) if UNION_ARRAYS.contains(&path) => {
            for name in extra {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            Value::Array(names)
        }

        (_, overlay) => overlay,
    }
}

/// Fold config sources, lowest precedence first.
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let base = json!({"base": {"id": "core"}});
        let overlay = json!({"base": {"id": "dda"}});
        let result = deep_merge(base, overlay);
        assert_eq!(result["base"]["id"], "dda");
    }

    #[test]
    fn test_object_deep_merge() {
        let base = json!({
            "families": {
                "item": ["GUN", "AMMO"],
                "monster": ["MONSTER"]
            }
        });
        let overlay = json!({
            "families": {
                "item": ["TOOL"]
            }
        });
        let result = deep_merge(base, overlay);

        assert_eq!(result["families"]["item"], json!(["TOOL"]));
        assert_eq!(result["families"]["monster"], json!(["MONSTER"]));
    }

    #[test]
    fn test_load_globs_replace() {
        let base = json!({"load": {"include": ["**/*.json"]}});
        let overlay = json!({"load": {"include": ["items/**"]}});
        let result = deep_merge(base, overlay);

        assert_eq!(result["load"]["include"], json!(["items/**"]));
    }

    #[test]
    fn test_set_fields_accumulate() {
        let base = json!({"rules": {"set_fields": ["flags"]}});
        let overlay = json!({"rules": {"set_fields": ["categories", "flags"]}});
        let result = deep_merge(base, overlay);

        assert_eq!(result["rules"]["set_fields"], json!(["flags", "categories"]));
    }

    #[test]
    fn test_union_only_at_exact_path() {
        let base = json!({"families": {"set_fields": ["A"]}});
        let overlay = json!({"families": {"set_fields": ["B"]}});
        let result = deep_merge(base, overlay);

        assert_eq!(result["families"]["set_fields"], json!(["B"]));
    }

    #[test]
    fn test_add_new_key() {
        let result = deep_merge(json!({"a": 1}), json!({"b": 2}));
        assert_eq!(result["a"], 1);
        assert_eq!(result["b"], 2);
    }

    #[test]
    fn test_null_override() {
        let result = deep_merge(json!({"value": 100}), json!({"value": null}));
        assert!(result["value"].is_null());
    }

    #[test]
    fn test_merge_layers() {
        let builtin = json!({
            "load": {"include": ["**/*.json"], "exclude": []},
            "rules": {"set_fields": ["flags"]}
        });
        let manifest = json!({
            "load": {"exclude": ["**/obsolete/**"]}
        });
        let cli = json!({
            "rules": {"set_fields": ["categories"]}
        });

        let result = merge_layers(vec![builtin, manifest, cli]);

        assert_eq!(result["load"]["include"], json!(["**/*.json"]));
        assert_eq!(result["load"]["exclude"], json!(["**/obsolete/**"]));
        assert_eq!(result["rules"]["set_fields"], json!(["flags", "categories"]));
    }
}
