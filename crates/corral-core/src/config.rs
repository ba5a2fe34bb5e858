//! corral.toml planner configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::PlacementStrategy;
use crate::version::CURRENT_FEATURE_SET;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("history.origin must not be empty")]
    EmptyOrigin,
    #[error("invalid feature set: {0}")]
    InvalidFeatureSet(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    #[serde(default)]
    pub strategy: PlacementStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Feature set stamped on every record and used to pick digest rules.
    #[serde(default = "default_feature_set")]
    pub feature_set: String,
    /// Origin recorded when the caller does not supply one.
    #[serde(default = "default_origin")]
    pub origin: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            feature_set: default_feature_set(),
            origin: default_origin(),
        }
    }
}

fn default_feature_set() -> String {
    CURRENT_FEATURE_SET.to_string()
}

fn default_origin() -> String {
    "corral".to_string()
}

impl PlannerConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: PlannerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history.origin.trim().is_empty() {
            return Err(ConfigError::EmptyOrigin);
        }
        let fs = &self.history.feature_set;
        let numeric = !fs.is_empty()
            && fs
                .split('.')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
        if !numeric {
            return Err(ConfigError::InvalidFeatureSet(fs.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = PlannerConfig::from_toml_str("").unwrap();
        assert_eq!(config.placement.strategy, PlacementStrategy::Default);
        assert_eq!(config.history.feature_set, CURRENT_FEATURE_SET);
        assert_eq!(config.history.origin, "corral");
    }

    #[test]
    fn parses_strategy_and_history() {
        let toml_str = r#"
[placement]
strategy = "balanced"

[history]
feature_set = "3.0.14"
origin = "do_update_resource"
"#;
        let config = PlannerConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.placement.strategy, PlacementStrategy::Balanced);
        assert_eq!(config.history.feature_set, "3.0.14");
        assert_eq!(config.history.origin, "do_update_resource");
    }

    #[test]
    fn rejects_unknown_strategy() {
        let toml_str = r#"
[placement]
strategy = "random"
"#;
        assert!(PlannerConfig::from_toml_str(toml_str).is_err());
    }

    #[test]
    fn rejects_bad_feature_set() {
        let mut config = PlannerConfig::default();
        config.history.feature_set = "3.x".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidFeatureSet("3.x".to_string()))
        );
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = PlannerConfig::default();
        config.placement.strategy = PlacementStrategy::Minimal;
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("minimal"));
        assert_eq!(PlannerConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corral.toml");
        std::fs::write(&path, "[placement]\nstrategy = \"utilization\"\n").unwrap();
        let config = PlannerConfig::from_file(&path).unwrap();
        assert_eq!(config.placement.strategy, PlacementStrategy::Utilization);
    }
}
