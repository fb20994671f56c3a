//! Preset library
//!
//! Example datasets ship as JSON files under `presets/` and are compiled into the crate. Each file
//! holds `{key, name, description, data}` where `data` is an ordinary dataset document, validated
//! through the same import path as user JSON. More presets can be registered at runtime, either
//! directly or from a directory of preset files.

use include_dir::{include_dir, Dir};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fs, path::Path, sync::Arc, time::Duration};

use crate::{dataset::parse_dataset_value, error::OntologyError, properties::OntologyDataset};

static EMBEDDED_PRESETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/presets");

/// Global preset registry, seeded with the embedded presets in file name order.
pub static PRESETS: Lazy<PresetRegistry> = Lazy::new(PresetRegistry::create);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OntologyPreset {
    pub key: String,
    pub name: String,
    pub description: String,
    pub data: OntologyDataset,
}

impl OntologyPreset {
    /// Parses a preset document. `source` names the document in error messages.
    pub fn from_json(text: &str, source: &str) -> Result<Self, OntologyError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|_| OntologyError::invalid(format!("Preset {source}: Invalid JSON.")))?;
        Self::from_value(&value, source)
    }

    pub fn from_value(value: &Value, source: &str) -> Result<Self, OntologyError> {
        let field = |name: &str| -> Result<String, OntologyError> {
            value
                .get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    OntologyError::invalid(format!("Preset {source} has an invalid {name}."))
                })
        };
        let key = field("key")?;
        let name = field("name")?;
        let description = value
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let data = value
            .get("data")
            .ok_or_else(|| OntologyError::invalid(format!("Preset {source} has no data.")))
            .and_then(|data| {
                parse_dataset_value(data).map_err(|err| match err {
                    OntologyError::InvalidDataset(msg) => {
                        OntologyError::invalid(format!("Preset {source}: {msg}"))
                    }
                    other => other,
                })
            })?;
        Ok(OntologyPreset {
            key,
            name,
            description,
            data,
        })
    }
}

/// Thread-safe, ordered preset catalog.
///
/// Pattern matches the other global registries: a cheap clone shares the same table.
pub struct PresetRegistry(Arc<RwLock<Vec<Arc<OntologyPreset>>>>);

impl Clone for PresetRegistry {
    fn clone(&self) -> Self {
        PresetRegistry(self.0.clone())
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        PresetRegistry(Arc::new(RwLock::new(Vec::new())))
    }
}

impl PresetRegistry {
    /// Create a registry holding the embedded presets.
    pub fn create() -> Self {
        let registry = PresetRegistry::default();

        let mut files: Vec<_> = EMBEDDED_PRESETS
            .files()
            .filter(|file| file.path().extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort_by_key(|file| file.path());

        for file in files {
            let source = file.path().display().to_string();
            let Some(text) = file.contents_utf8() else {
                tracing::error!("[PresetRegistry::create] {source} is not UTF-8");
                continue;
            };
            match OntologyPreset::from_json(text, &source) {
                Ok(preset) => registry.register(preset),
                Err(err) => tracing::error!("[PresetRegistry::create] {err}"),
            }
        }

        registry
    }

    /// Register a preset.
    ///
    /// A preset with the same key is replaced in place and a log message emitted; new keys are
    /// appended.
    pub fn register(&self, preset: OntologyPreset) {
        while self.0.is_locked() {
            tracing::info!("[PresetRegistry::register] Waiting for write access to preset registry");
            std::thread::sleep(Duration::from_millis(100));
        }

        let mut writer = self.0.write();
        let preset = Arc::new(preset);
        match writer.iter_mut().find(|entry| entry.key == preset.key) {
            Some(existing) => {
                tracing::info!(
                    "[PresetRegistry::register] Overwriting existing preset: {}",
                    preset.key
                );
                *existing = preset;
            }
            None => writer.push(preset),
        }
    }

    /// Retrieve a preset by key. Returns a cheap Arc clone.
    pub fn get(&self, key: &str) -> Option<Arc<OntologyPreset>> {
        while self.0.is_locked_exclusive() {
            tracing::info!("[PresetRegistry::get] Waiting for read access to preset registry");
            std::thread::sleep(Duration::from_millis(100));
        }

        self.0.read().iter().find(|entry| entry.key == key).cloned()
    }

    /// Like [PresetRegistry::get], failing with [OntologyError::NotFound] for unknown keys.
    pub fn require(&self, key: &str) -> Result<Arc<OntologyPreset>, OntologyError> {
        self.get(key)
            .ok_or_else(|| OntologyError::NotFound(format!("preset '{key}'")))
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.read().iter().map(|entry| entry.key.clone()).collect()
    }

    pub fn list(&self) -> Vec<Arc<OntologyPreset>> {
        self.0.read().clone()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// The first registered preset.
    pub fn default_preset(&self) -> Option<Arc<OntologyPreset>> {
        self.0.read().first().cloned()
    }

    /// Register every `*.json` preset in `dir`, in file name order. Files that fail to parse are
    /// skipped with a warning. Returns the number of presets registered.
    pub fn load_dir(&self, dir: &Path) -> Result<usize, OntologyError> {
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            let source = path.display().to_string();
            let parsed = fs::read_to_string(&path)
                .map_err(OntologyError::from)
                .and_then(|text| OntologyPreset::from_json(&text, &source));
            match parsed {
                Ok(preset) => {
                    self.register(preset);
                    loaded += 1;
                }
                Err(err) => {
                    tracing::warn!("[PresetRegistry::load_dir] skipping {source}: {err}");
                }
            }
        }
        tracing::info!(
            "[PresetRegistry::load_dir] registered {loaded} preset(s) from {}",
            dir.display()
        );
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_embedded_presets_parse() {
        let registry = PresetRegistry::create();
        assert_eq!(registry.len(), 15);
        let keys = registry.keys();
        assert_eq!(keys[0], "science-stack");
        assert!(keys.contains(&"heidegger-dasein".to_string()));
        assert!(keys.contains(&"cyclic-cosmology".to_string()));
        assert_eq!(registry.default_preset().unwrap().key, "science-stack");
        for preset in registry.list() {
            assert!(!preset.data.nodes.is_empty(), "{} is empty", preset.key);
        }
    }

    #[test]
    fn test_register_replaces_in_place() {
        let registry = PresetRegistry::create();
        let mut replacement = (*registry.get("legal-hierarchy").unwrap()).clone();
        replacement.name = "Renamed".to_string();
        let position = registry.keys().iter().position(|k| k == "legal-hierarchy");
        registry.register(replacement);
        assert_eq!(registry.len(), 15);
        assert_eq!(registry.get("legal-hierarchy").unwrap().name, "Renamed");
        assert_eq!(
            registry.keys().iter().position(|k| k == "legal-hierarchy"),
            position
        );
        assert!(matches!(
            registry.require("nope"),
            Err(OntologyError::NotFound(_))
        ));
    }

    #[test]
    fn test_preset_validation_messages() {
        let err = OntologyPreset::from_json(r#"{"key": "", "name": "x", "data": {}}"#, "inline")
            .unwrap_err();
        assert_eq!(err.to_string(), "Preset inline has an invalid key.");
        let err = OntologyPreset::from_json(
            r#"{"key": "k", "name": "x", "data": {"nodes": []}}"#,
            "inline",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Preset inline: JSON must include arrays: nodes, edges, and metaEdges."
        );
    }
}
