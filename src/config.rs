//! Leaderboard Configuration
//!
//! Tunables for ingestion, date parsing, column auto-detection and reporting.
//! Every section has defaults, so a config file only needs the keys it overrides.

use crate::error::{LeaderboardError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming a config file when none is passed explicitly
pub const CONFIG_ENV_VAR: &str = "LEADERBOARD_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    pub ingestion: IngestionConfig,
    pub dates: DateConfig,
    pub mapping: MappingConfig,
    pub report: ReportConfig,
}

/// Settings for reading uploaded files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Field delimiter for CSV sources
    pub csv_delimiter: char,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self { csv_delimiter: ',' }
    }
}

/// Accepted textual date layouts, tried in order after RFC 3339
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DateConfig {
    /// chrono formats carrying a time of day (the time is discarded)
    pub datetime_formats: Vec<String>,

    /// chrono formats for plain calendar dates
    pub date_formats: Vec<String>,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            datetime_formats: vec![
                "%Y-%m-%d %H:%M:%S%.f".to_string(),
                "%Y-%m-%dT%H:%M:%S%.f".to_string(),
                "%Y-%m-%d %H:%M".to_string(),
                "%Y/%m/%d %H:%M:%S".to_string(),
                "%m/%d/%Y %H:%M:%S".to_string(),
                "%m/%d/%Y %H:%M".to_string(),
            ],
            date_formats: vec![
                "%Y-%m-%d".to_string(),
                "%Y/%m/%d".to_string(),
                "%m/%d/%Y".to_string(),
                "%d %b %Y".to_string(),
                "%b %d, %Y".to_string(),
            ],
        }
    }
}

/// Column auto-detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Minimum Jaro-Winkler similarity for the fuzzy fallback
    pub fuzzy_threshold: f64,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self { fuzzy_threshold: 0.85 }
    }
}

/// Report settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Rows shown in the "top by engagement" and "most days won" insights
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { top_n: 5 }
    }
}

impl LeaderboardConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| LeaderboardError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: LeaderboardConfig = serde_json::from_str(&content)
            .map_err(|e| LeaderboardError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot honour
    pub fn validate(&self) -> Result<()> {
        if !self.ingestion.csv_delimiter.is_ascii() {
            return Err(LeaderboardError::Config(format!(
                "csv_delimiter must be a single ASCII character, got '{}'",
                self.ingestion.csv_delimiter
            )));
        }
        if !(0.0..=1.0).contains(&self.mapping.fuzzy_threshold) {
            return Err(LeaderboardError::Config(format!(
                "fuzzy_threshold must be within [0, 1], got {}",
                self.mapping.fuzzy_threshold
            )));
        }
        Ok(())
    }
}
