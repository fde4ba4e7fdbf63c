use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{HeartMapError, Result};

/// Top-level configuration for the HeartMap application.
///
/// Loaded from `heartmap.toml` by default. Every section falls back to its
/// defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartMapConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl HeartMapConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HeartMapConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the SQLite database file.
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "data/heartmap.db".to_string(),
        }
    }
}

/// Which inclusion preset an ingestion run uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    /// One target year, per-topic caps, demographic ignored.
    #[default]
    CappedDualTopic,
    /// Several years, breakout categories in scope, optional overall cap.
    MultiYearDemographic,
}

impl std::str::FromStr for IngestMode {
    type Err = HeartMapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "capped" | "capped_dual_topic" => Ok(IngestMode::CappedDualTopic),
            "multi-year" | "multi_year" | "multi_year_demographic" => {
                Ok(IngestMode::MultiYearDemographic)
            }
            other => Err(HeartMapError::Config(format!(
                "Unknown ingest mode '{}'. Must be one of: capped, multi-year",
                other
            ))),
        }
    }
}

/// CSV ingestion configuration.
///
/// Parameters for both modes live side by side; `mode` selects which of them
/// apply to a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory holding the source CSV. A relative path is resolved against
    /// the working directory the binary is started from.
    pub data_dir: String,
    /// File name of the source CSV inside `data_dir`.
    pub file_name: String,
    pub mode: IngestMode,
    /// Case-sensitive substrings a row's topic must contain.
    pub topic_keywords: Vec<String>,
    /// Capped mode: the only year ingested.
    pub target_year: i64,
    /// Capped mode: cap applied to each topic keyword independently.
    pub per_topic_cap: usize,
    /// Multi-year mode: years ingested.
    pub years: Vec<i64>,
    /// Multi-year mode: `Break_Out_Category` values ingested.
    pub categories: Vec<String>,
    /// Multi-year mode: optional cap on the total number of records.
    pub overall_cap: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            file_name: "heart_and_stroke_data.csv".to_string(),
            mode: IngestMode::CappedDualTopic,
            topic_keywords: vec!["Stroke".to_string(), "Heart".to_string()],
            target_year: 2020,
            per_topic_cap: 500,
            years: vec![2019, 2020, 2021, 2022],
            categories: vec!["Overall".to_string(), "Gender".to_string()],
            overall_cap: None,
        }
    }
}

impl IngestConfig {
    /// Full path of the source CSV. Stays relative when `data_dir` is; run
    /// the binary from the project root or configure an absolute `data_dir`.
    pub fn source_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.file_name)
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Narrow indicator/year/demographic options by the chosen topic.
    pub cascading_options: bool,
    /// Origins allowed by CORS (the map front-end).
    pub allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cascading_options: true,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_temp_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = HeartMapConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.storage.db_path, "data/heartmap.db");
        assert_eq!(config.ingest.mode, IngestMode::CappedDualTopic);
        assert_eq!(config.ingest.target_year, 2020);
        assert_eq!(config.ingest.per_topic_cap, 500);
        assert_eq!(config.ingest.topic_keywords, vec!["Stroke", "Heart"]);
        assert_eq!(config.ingest.categories, vec!["Overall", "Gender"]);
        assert!(config.ingest.overall_cap.is_none());
        assert_eq!(config.api.port, 8000);
        assert!(config.api.cascading_options);
    }

    #[test]
    fn test_source_path_joins_data_dir() {
        let config = IngestConfig::default();
        assert_eq!(
            config.source_path(),
            PathBuf::from("data").join("heart_and_stroke_data.csv")
        );
    }

    #[test]
    fn test_source_path_keeps_absolute_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = IngestConfig {
            data_dir: dir.path().to_string_lossy().to_string(),
            ..IngestConfig::default()
        };
        let path = config.source_path();
        assert!(path.is_absolute());
        assert_eq!(path, dir.path().join("heart_and_stroke_data.csv"));
    }

    #[test]
    fn test_config_load_partial_toml() {
        let content = r#"
[ingest]
mode = "multi_year_demographic"
years = [2018, 2019]
overall_cap = 1000

[api]
cascading_options = false
"#;
        let file = create_temp_config(content);
        let config = HeartMapConfig::load(file.path()).unwrap();

        assert_eq!(config.ingest.mode, IngestMode::MultiYearDemographic);
        assert_eq!(config.ingest.years, vec![2018, 2019]);
        assert_eq!(config.ingest.overall_cap, Some(1000));
        // Unspecified fields keep their defaults.
        assert_eq!(config.ingest.file_name, "heart_and_stroke_data.csv");
        assert!(!config.api.cascading_options);
        assert_eq!(config.api.port, 8000);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(HeartMapConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = HeartMapConfig::load_or_default(Path::new("/nonexistent/heartmap.toml"));
        assert_eq!(config.api.port, 8000);
    }

    #[test]
    fn test_ingest_mode_from_str() {
        assert_eq!(
            "capped".parse::<IngestMode>().unwrap(),
            IngestMode::CappedDualTopic
        );
        assert_eq!(
            "multi-year".parse::<IngestMode>().unwrap(),
            IngestMode::MultiYearDemographic
        );
        assert!("weekly".parse::<IngestMode>().is_err());
    }
}
