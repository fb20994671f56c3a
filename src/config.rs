use crate::{
    diff::DEFAULT_STRENGTH_EPSILON, error::OntologyError, layout::LayoutMode, poset::OntologyMode,
    query::ViewFilters, repair::DEFAULT_MAX_REPAIRS,
};
use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
};

/// Analysis settings. Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub mode: OntologyMode,
    pub max_repairs: usize,
    /// Strength differences at or below this are not reported by snapshot diffs.
    pub strength_epsilon: f64,
    /// Extra directories of preset JSON files.
    pub preset_dirs: Vec<PathBuf>,
    pub layout: LayoutMode,
    pub filters: ViewFilters,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            mode: OntologyMode::default(),
            max_repairs: DEFAULT_MAX_REPAIRS,
            strength_epsilon: DEFAULT_STRENGTH_EPSILON,
            preset_dirs: Vec::new(),
            layout: LayoutMode::default(),
            filters: ViewFilters::default(),
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn get_config(&self) -> Result<AnalysisConfig, OntologyError>;
    fn set_config(&self, config: &AnalysisConfig) -> Result<(), OntologyError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TomlConfigProvider {
    path: PathBuf,
}

impl TomlConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigProvider { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn get_config(&self) -> Result<AnalysisConfig, OntologyError> {
        tracing::debug!("Attempting to read config from: {:?}", &self.path);
        if !self.path.exists() {
            tracing::debug!("Config file not found, using defaults.");
            return Ok(AnalysisConfig::default());
        }
        let content = read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    fn set_config(&self, config: &AnalysisConfig) -> Result<(), OntologyError> {
        tracing::debug!("Attempting to write config to: {:?}", &self.path);
        let toml_string = toml::to_string(config)?;
        write(&self.path, toml_string)?;
        Ok(())
    }
}

pub fn get_content<P: AsRef<Path>>(path: P) -> Result<String, OntologyError> {
    tracing::debug!("Reading {:?}", path.as_ref());
    Ok(read_to_string(path)?)
}

pub fn set_content<P: AsRef<Path>>(path: P, text: String) -> Result<(), OntologyError> {
    tracing::debug!("Writing {:?}", path.as_ref());
    Ok(write(path, text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::RelationType;
    use test_log::test;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: AnalysisConfig = toml::from_str(
            r#"
mode = "strict_poset"

[filters]
types = ["envelops", "grounds"]
"#,
        )
        .unwrap();
        assert_eq!(config.mode, OntologyMode::StrictPoset);
        assert_eq!(config.max_repairs, DEFAULT_MAX_REPAIRS);
        assert_eq!(config.filters.types, RelationType::Envelops | RelationType::Grounds);
        assert_eq!(config.filters.min_strength, 0.0);
        assert_eq!(config.layout, LayoutMode::Layered);
    }

    #[test]
    fn test_toml_provider_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TomlConfigProvider::new(dir.path().join("ontoposet.toml"));
        assert_eq!(provider.get_config().unwrap(), AnalysisConfig::default());

        let config = AnalysisConfig {
            mode: OntologyMode::FreeGraph,
            max_repairs: 3,
            layout: LayoutMode::Force,
            preset_dirs: vec![PathBuf::from("extra/presets")],
            ..Default::default()
        };
        provider.set_config(&config).unwrap();
        assert_eq!(provider.get_config().unwrap(), config);
        assert!(get_content(provider.path()).unwrap().contains("free_graph"));
    }

    #[test]
    fn test_malformed_config_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        set_content(&path, "mode = 7".to_string()).unwrap();
        let err = TomlConfigProvider::new(path).get_config().unwrap_err();
        assert!(matches!(err, OntologyError::Serialization(_)));
    }
}
