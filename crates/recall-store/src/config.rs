use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use recall_core::{AssistantKind, ContextBudget, DEFAULT_DIMENSION};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// File name of the config inside the data directory.
pub const CONFIG_FILE: &str = "recall.toml";

/// User configuration, read from `<data_dir>/recall.toml`.
///
/// Every field is optional in the file; missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    /// Embedding dimensionality for fresh vectorizers.
    pub dimension: usize,
    /// Default number of results for similarity queries.
    pub top_k: usize,
    pub assistant: AssistantKind,
    pub budget: ContextBudget,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            top_k: 5,
            assistant: AssistantKind::default(),
            budget: ContextBudget::default(),
        }
    }
}

impl RecallConfig {
    pub fn parse(content: &str) -> Result<Self> {
        let config: RecallConfig =
            toml::from_str(content).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(StoreError::Config("dimension must be positive".into()));
        }
        let b = &self.budget;
        for (name, ratio) in [
            ("pinned_ratio", b.pinned_ratio),
            ("relevant_ratio", b.relevant_ratio),
            ("metadata_ratio", b.metadata_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(StoreError::Config(format!("budget.{name} must be within [0, 1]")));
            }
        }
        if !(b.pinned_ratio <= b.relevant_ratio && b.relevant_ratio <= b.metadata_ratio) {
            return Err(StoreError::Config(
                "budget ratios must be cumulative: pinned <= relevant <= metadata".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(RecallConfig::parse("").unwrap(), RecallConfig::default());
    }

    #[test]
    fn test_partial_budget() {
        let config = RecallConfig::parse(
            r#"
            top_k = 3

            [budget]
            total_chars = 4000
            excerpt_cap = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.budget.total_chars, 4000);
        assert_eq!(config.budget.excerpt_cap, 250);
        assert_eq!(config.budget.pinned_doc_cap, 1500);
        assert_eq!(config.dimension, DEFAULT_DIMENSION);
    }

    #[test]
    fn test_assistant_kind() {
        let config = RecallConfig::parse(r#"assistant = "local""#).unwrap();
        assert_eq!(config.assistant, AssistantKind::Local);
        assert!(RecallConfig::parse(r#"assistant = "cloud""#).is_err());
    }

    #[test]
    fn test_rejects_non_cumulative_ratios() {
        let err = RecallConfig::parse("[budget]\npinned_ratio = 0.9\nrelevant_ratio = 0.5\n");
        assert!(matches!(err, Err(StoreError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_dimension() {
        assert!(RecallConfig::parse("dimension = 0").is_err());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            RecallConfig::parse("dimension = ["),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = RecallConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, RecallConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "dimension = 64\n").unwrap();
        assert_eq!(RecallConfig::load(&path).unwrap().dimension, 64);
    }
}
