use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::sink::DEFAULT_TABLE;

pub const DEFAULT_EVAPOTRANSPIRATION_PATH: &str = "evapotranspiration.csv";
pub const DEFAULT_SOIL_MOISTURE_PATH: &str = "soil_moisture.csv";

/// Inputs and target of one run.
///
/// Everything except the database URL can come from a TOML file; the URL is
/// only ever taken from the environment.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default = "default_evapotranspiration_path")]
    pub evapotranspiration_path: PathBuf,
    #[serde(default = "default_soil_moisture_path")]
    pub soil_moisture_path: PathBuf,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(skip)]
    pub database_url: Option<String>,
}

fn default_evapotranspiration_path() -> PathBuf {
    PathBuf::from(DEFAULT_EVAPOTRANSPIRATION_PATH)
}

fn default_soil_moisture_path() -> PathBuf {
    PathBuf::from(DEFAULT_SOIL_MOISTURE_PATH)
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            evapotranspiration_path: default_evapotranspiration_path(),
            soil_moisture_path: default_soil_moisture_path(),
            table: default_table(),
            dry_run: false,
            database_url: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| PipelineError::Config(err.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| {
            PipelineError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.table, "district_water_stats");
    }

    #[test]
    fn reads_overrides() {
        let config = PipelineConfig::from_toml_str(
            r#"
                evapotranspiration_path = "data/evapo.csv"
                soil_moisture_path = "data/soil.csv"
                table = "gov_data.district_water_stats"
                dry_run = true
            "#,
        )
        .unwrap();

        assert_eq!(config.evapotranspiration_path, PathBuf::from("data/evapo.csv"));
        assert_eq!(config.soil_moisture_path, PathBuf::from("data/soil.csv"));
        assert_eq!(config.table, "gov_data.district_water_stats");
        assert!(config.dry_run);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn rejects_database_url_and_unknown_keys() {
        for content in ["database_url = \"postgres://x\"", "tabel = \"typo\""] {
            let err = PipelineConfig::from_toml_str(content).unwrap_err();
            assert_eq!(err.category(), "config");
        }
    }
}
