use crate::data_model::NOT_HATE_LABEL;
use crate::error::{AnalysisError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Formats tried in order when parsing the `posted_at` column. First match
/// wins; a string matching none of them becomes the "unparsed" marker.
pub const DEFAULT_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y",
];

pub const DEFAULT_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Hard ceilings guarding against unbounded work on pathological configs.
const MAX_ROW_CAP: usize = 100_000;
const MAX_TOP_N: usize = 10_000;

/// Represents the overall analysis configuration read from YAML.
/// Every section has sensible defaults, so an empty file (or no file at all,
/// via `AnalysisConfig::default()`) is valid.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub stopwords: StopwordParams,
    #[serde(default)]
    pub timestamps: TimestampParams,
    #[serde(default)]
    pub limits: LimitParams,
    /// Override for the sentinel label marking non-hate posts.
    #[serde(default)]
    pub not_hate_label: Option<String>,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        self.stopwords.validate()?;
        self.timestamps.validate()?;
        self.limits.validate()?;
        if let Some(label) = &self.not_hate_label {
            if label.trim().is_empty() {
                return Err(AnalysisError::ConfigValidationError(
                    "AnalysisConfig: not_hate_label cannot be blank".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The effective not-hate sentinel, override or builtin.
    pub fn not_hate_label(&self) -> &str {
        self.not_hate_label.as_deref().unwrap_or(NOT_HATE_LABEL)
    }
}

/// Parameters for the stopword exclusion set.
#[derive(Deserialize, Debug, Clone)]
pub struct StopwordParams {
    /// Include the builtin Portuguese list.
    #[serde(default = "default_true")]
    pub use_builtin: bool,
    /// Domain-specific noise words excluded on top of the builtin list.
    #[serde(default)]
    pub extra: Vec<String>,
}

impl Default for StopwordParams {
    fn default() -> Self {
        StopwordParams {
            use_builtin: true,
            extra: Vec::new(),
        }
    }
}

impl StopwordParams {
    pub fn validate(&self) -> Result<()> {
        for (idx, word) in self.extra.iter().enumerate() {
            if word.trim().is_empty() {
                return Err(AnalysisError::ConfigValidationError(format!(
                    "StopwordParams: extra word at index {} is blank",
                    idx
                )));
            }
        }
        Ok(())
    }
}

/// Parameters for lenient timestamp parsing.
#[derive(Deserialize, Debug, Clone)]
pub struct TimestampParams {
    #[serde(default = "default_timestamp_formats")]
    pub formats: Vec<String>,
    #[serde(default = "default_display_format")]
    pub display_format: String,
}

impl Default for TimestampParams {
    fn default() -> Self {
        TimestampParams {
            formats: default_timestamp_formats(),
            display_format: default_display_format(),
        }
    }
}

impl TimestampParams {
    pub fn validate(&self) -> Result<()> {
        if self.formats.is_empty() {
            return Err(AnalysisError::ConfigValidationError(
                "TimestampParams: formats cannot be empty".to_string(),
            ));
        }
        if self.display_format.is_empty() {
            return Err(AnalysisError::ConfigValidationError(
                "TimestampParams: display_format cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result-size bounds.
#[derive(Deserialize, Debug, Clone)]
pub struct LimitParams {
    /// Default cap on filtered rows when the caller does not supply one.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    /// Default top-N size for rankings and word frequencies.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for LimitParams {
    fn default() -> Self {
        LimitParams {
            max_rows: default_max_rows(),
            top_n: default_top_n(),
        }
    }
}

impl LimitParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_rows == 0 {
            return Err(AnalysisError::ConfigValidationError(
                "LimitParams: max_rows must be greater than 0".to_string(),
            ));
        }
        if self.max_rows > MAX_ROW_CAP {
            return Err(AnalysisError::ConfigValidationError(format!(
                "LimitParams: max_rows must not exceed {}, got {}",
                MAX_ROW_CAP, self.max_rows
            )));
        }
        if self.top_n == 0 {
            return Err(AnalysisError::ConfigValidationError(
                "LimitParams: top_n must be greater than 0".to_string(),
            ));
        }
        if self.top_n > MAX_TOP_N {
            return Err(AnalysisError::ConfigValidationError(format!(
                "LimitParams: top_n must not exceed {}, got {}",
                MAX_TOP_N, self.top_n
            )));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_timestamp_formats() -> Vec<String> {
    DEFAULT_TIMESTAMP_FORMATS
        .iter()
        .map(|f| f.to_string())
        .collect()
}

fn default_display_format() -> String {
    DEFAULT_DISPLAY_FORMAT.to_string()
}

fn default_max_rows() -> usize {
    300
}

fn default_top_n() -> usize {
    50
}

/// Loads and parses the analysis configuration YAML file.
pub fn load_analysis_config<P: AsRef<Path>>(config_path: P) -> Result<AnalysisConfig> {
    let path_ref = config_path.as_ref();
    let config_content = fs::read_to_string(path_ref).map_err(|e| {
        AnalysisError::ConfigError(format!(
            "Failed to read analysis config file '{}': {}",
            path_ref.display(),
            e
        ))
    })?;

    let config: AnalysisConfig = serde_yaml::from_str(&config_content).map_err(|e| {
        AnalysisError::ConfigError(format!(
            "Failed to parse analysis config YAML from '{}': {}",
            path_ref.display(),
            e
        ))
    })?;

    config.validate()?;

    Ok(config)
}
