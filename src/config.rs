//! Comparison configuration

use crate::error::{Result, TabreconError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Default absolute tolerance for numeric equality
pub const DEFAULT_FLOAT_TOLERANCE: f64 = 1e-10;

/// Options controlling normalization and matching for one comparison.
///
/// Unrecognized keys in a configuration file are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    #[serde(alias = "floatTolerance")]
    pub float_tolerance: f64,
    #[serde(alias = "ignoreCase")]
    pub ignore_case: bool,
    #[serde(alias = "ignoreWhitespace")]
    pub ignore_whitespace: bool,
    #[serde(alias = "ignoreColumns")]
    pub ignore_columns: HashSet<String>,
    #[serde(alias = "keyColumns")]
    pub key_columns: Vec<String>,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            float_tolerance: DEFAULT_FLOAT_TOLERANCE,
            ignore_case: false,
            ignore_whitespace: true,
            ignore_columns: HashSet::new(),
            key_columns: Vec::new(),
        }
    }
}

impl ComparisonConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TabreconError::config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_json(&content).map_err(|e| match e {
            TabreconError::Config { message } => {
                TabreconError::config(format!("{} ({})", message, path.display()))
            }
            other => other,
        })
    }

    /// Parse configuration from a JSON document
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| TabreconError::config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.float_tolerance.is_finite() || self.float_tolerance < 0.0 {
            return Err(TabreconError::config(format!(
                "float_tolerance must be a finite, non-negative number, got {}",
                self.float_tolerance
            )));
        }
        Ok(())
    }

    pub fn with_key_columns<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.key_columns = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ignore_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.ignore_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.float_tolerance = tolerance;
        self
    }

    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn with_ignore_whitespace(mut self, ignore_whitespace: bool) -> Self {
        self.ignore_whitespace = ignore_whitespace;
        self
    }

    /// Write a sample configuration file
    pub fn write_sample(path: &Path) -> Result<()> {
        let defaults = Self::default();
        let sample = serde_json::json!({
            "float_tolerance": defaults.float_tolerance,
            "ignore_case": defaults.ignore_case,
            "ignore_whitespace": defaults.ignore_whitespace,
            "ignore_columns": [],
            "key_columns": [],
            "description": "Sample configuration for tabrecon comparisons"
        });

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(&sample)?)?;
        log::info!("Wrote sample configuration to {}", path.display());
        Ok(())
    }
}

/// Split a comma-separated CLI list, dropping empty entries
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
