//! Pipeline configuration with embedded defaults, loadable from JSON.

use crate::chart::error::RenderError;
use crate::chart::scale::{ColorScale, UnknownCategoryPolicy};
use crate::table::normalize::NormalizeOptions;
use crate::table::schema::default_source_columns;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// SBC LTER annual kelp forest community biomass, all species, on EDI.
pub const DEFAULT_URL: &str =
    "https://pasta.lternet.edu/package/data/eml/knb-lter-sbc/50/17/24d18d9ebe4f6e8b94e222840096963c";

pub const DEFAULT_USER_AGENT: &str = concat!(
    "urchin_biomass/",
    env!("CARGO_PKG_VERSION"),
    " (+https://sbclter.msi.ucsb.edu)"
);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub url: String,
    pub year_min: i64,
    pub year_max: i64,
    pub species: Vec<String>,
    pub site: String,
    /// Names assigned positionally to the 24 source columns.
    pub columns: Vec<String>,
    /// Species name → `#RRGGBB`.
    pub colors: BTreeMap<String, String>,
    pub unknown_category: UnknownCategoryPolicy,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            year_min: 2014,
            year_max: 2024,
            species: vec!["red urchin".to_string(), "purple urchin".to_string()],
            site: "napl".to_string(),
            columns: default_source_columns(),
            colors: BTreeMap::from([
                ("purple urchin".to_string(), "#68228B".to_string()),
                ("red urchin".to_string(), "#FF0000".to_string()),
            ]),
            unknown_category: UnknownCategoryPolicy::default(),
            output: PathBuf::from("urchin_biomass.svg"),
            width: 1000,
            height: 600,
            timeout_secs: 120,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Reads a JSON config. Missing fields keep their defaults.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config: PipelineConfig =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.year_min > self.year_max {
            return Err(ConfigError::Invalid(format!(
                "year_min ({}) is after year_max ({})",
                self.year_min, self.year_max
            )));
        }
        if self.columns.len() != 24 {
            return Err(ConfigError::Invalid(format!(
                "expected 24 column names, got {}",
                self.columns.len()
            )));
        }
        if self.species.is_empty() {
            return Err(ConfigError::Invalid("species list is empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "chart size {}x{} has a zero dimension",
                self.width, self.height
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions::new(self.year_min, self.year_max, &self.species, &self.site)
    }

    pub fn color_scale(&self) -> Result<ColorScale, RenderError> {
        Ok(ColorScale::from_hex_map(&self.colors)?.with_policy(self.unknown_category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::scale::Rgb;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() -> Result<(), ConfigError> {
        let config = PipelineConfig::default();
        config.validate()?;
        assert_eq!(config.columns.len(), 24);
        assert_eq!(config.columns[10], "DRY_GM2");
        assert_eq!(config.timeout(), Duration::from_secs(120));
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<(), ConfigError> {
        let file = write_config(
            r#"{ "year_min": 2018, "site": "AQUE", "unknown_category": "reject" }"#,
        );
        let config = PipelineConfig::from_path(file.path())?;

        assert_eq!(config.year_min, 2018);
        assert_eq!(config.year_max, 2024);
        assert_eq!(config.site, "AQUE");
        assert_eq!(config.unknown_category, UnknownCategoryPolicy::Reject);
        assert_eq!(config.output, PathBuf::from("urchin_biomass.svg"));

        let options = config.normalize_options();
        assert_eq!(options.site, "aque");
        Ok(())
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let reversed = write_config(r#"{ "year_min": 2024, "year_max": 2014 }"#);
        assert!(matches!(
            PipelineConfig::from_path(reversed.path()),
            Err(ConfigError::Invalid(_))
        ));

        let no_species = write_config(r#"{ "species": [] }"#);
        assert!(matches!(
            PipelineConfig::from_path(no_species.path()),
            Err(ConfigError::Invalid(_))
        ));

        let short_columns = write_config(r#"{ "columns": ["YEAR", "DATE"] }"#);
        assert!(matches!(
            PipelineConfig::from_path(short_columns.path()),
            Err(ConfigError::Invalid(_))
        ));

        let malformed = write_config("{ year_min: ");
        assert!(matches!(
            PipelineConfig::from_path(malformed.path()),
            Err(ConfigError::Parse(..))
        ));

        assert!(matches!(
            PipelineConfig::from_path(Path::new("/nonexistent/urchin.json")),
            Err(ConfigError::Read(..))
        ));
    }

    #[test]
    fn test_color_scale_from_config() -> Result<(), RenderError> {
        let scale = PipelineConfig::default().color_scale()?;
        assert_eq!(scale.color_for("purple urchin")?, Rgb(104, 34, 139));
        assert_eq!(scale.color_for("red urchin")?, Rgb(255, 0, 0));
        Ok(())
    }
}
