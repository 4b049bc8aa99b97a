//! Run configuration
//!
//! Defaults, optionally replaced by a JSON file named in `WALS_CONFIG`,
//! then selectively overridden from the environment:
//! - `WALS_DATA_DIR`: directory holding the feature and language files
//! - `WALS_OUTPUT_DIR`: where the wide table and reports are written
//! - `WALS_SEED`: classifier split seed

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::classifier::ClassifierConfig;
use crate::data::FeatureSources;
use crate::error::WalsError;
use crate::features::FeatureCode;
use crate::join::JoinPolicy;

pub const CONFIG_ENV: &str = "WALS_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub data_dir: PathBuf,
    /// Features to load, in wide-table column order
    pub features: Vec<FeatureCode>,
    /// File name per feature inside `data_dir`; unlisted features use `<wals_id>.tab`
    pub feature_files: BTreeMap<FeatureCode, String>,
    pub languages_file: String,
    pub output_dir: PathBuf,
    pub wide_table_file: String,
    pub join_policy: JoinPolicy,
    /// Write a per-language verdict CSV for every rule
    pub write_verdicts: bool,
    pub classifier: ClassifierConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            data_dir: PathBuf::from("data"),
            features: FeatureCode::ALL.to_vec(),
            feature_files: BTreeMap::new(),
            languages_file: "languages.csv".to_string(),
            output_dir: PathBuf::from("output"),
            wide_table_file: "wals_wide.csv".to_string(),
            join_policy: JoinPolicy::Left,
            write_verdicts: true,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// `WALS_CONFIG` file (or defaults) plus environment overrides, validated
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                info!("Loading configuration from {}", path);
                Self::from_file(Path::new(&path))?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `WALS_DATA_DIR`, `WALS_OUTPUT_DIR` and `WALS_SEED` from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup("WALS_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("WALS_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(seed) = lookup("WALS_SEED") {
            self.classifier.seed = seed
                .trim()
                .parse()
                .with_context(|| format!("WALS_SEED is not an unsigned integer: {:?}", seed))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), WalsError> {
        let c = &self.classifier;
        if !(c.test_fraction > 0.0 && c.test_fraction < 1.0) {
            return Err(WalsError::Config(format!(
                "classifier.test_fraction must lie strictly between 0 and 1, got {}",
                c.test_fraction
            )));
        }
        if c.max_depth == 0 {
            return Err(WalsError::Config(
                "classifier.max_depth must be at least 1".to_string(),
            ));
        }
        if self.features.is_empty() {
            return Err(WalsError::Config("no features selected".to_string()));
        }
        Ok(())
    }

    pub fn feature_path(&self, code: FeatureCode) -> PathBuf {
        match self.feature_files.get(&code) {
            Some(file) => self.data_dir.join(file),
            None => self.data_dir.join(format!("{}.tab", code.wals_id())),
        }
    }

    pub fn sources(&self) -> FeatureSources {
        FeatureSources {
            features: self
                .features
                .iter()
                .map(|&code| (code, self.feature_path(code)))
                .collect(),
            languages: self.data_dir.join(&self.languages_file),
        }
    }

    pub fn wide_table_path(&self) -> PathBuf {
        self.output_dir.join(&self.wide_table_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.classifier.seed, 42);
        assert_eq!(config.classifier.test_fraction, 0.25);
        assert_eq!(config.wide_table_path(), PathBuf::from("output/wals_wide.csv"));

        let sources = config.sources();
        assert_eq!(sources.features.len(), 8);
        assert_eq!(
            sources.features[&FeatureCode::WordOrder],
            PathBuf::from("data/81A.tab")
        );
        assert_eq!(sources.languages, PathBuf::from("data/languages.csv"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "data_dir": "wals",
            "feature_files": { "case_count_bucket": "cases.csv" },
            "join_policy": "inner",
            "classifier": { "max_depth": 2 }
        }"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.join_policy, JoinPolicy::Inner);
        assert_eq!(config.classifier.max_depth, 2);
        assert_eq!(config.classifier.seed, 42);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(
            config.feature_path(FeatureCode::CaseCountBucket),
            PathBuf::from("wals/cases.csv")
        );
        assert_eq!(
            config.feature_path(FeatureCode::GenitiveOrder),
            PathBuf::from("wals/86A.tab")
        );
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "output_dir": "out", "write_verdicts": false }"#).unwrap();

        let config = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(!config.write_verdicts);

        assert!(AnalysisConfig::from_file(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [("WALS_DATA_DIR", "/tmp/wals"), ("WALS_SEED", "7")]
            .into_iter()
            .collect();
        let mut config = AnalysisConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/wals"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.classifier.seed, 7);

        let bad = |k: &str| (k == "WALS_SEED").then(|| "seven".to_string());
        assert!(AnalysisConfig::default().apply_overrides(bad).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_classifier_settings() {
        let mut config = AnalysisConfig::default();
        config.classifier.test_fraction = 1.0;
        assert!(matches!(config.validate(), Err(WalsError::Config(_))));

        let mut config = AnalysisConfig::default();
        config.classifier.test_fraction = 0.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.classifier.max_depth = 0;
        assert!(config.validate().is_err());
    }
}
