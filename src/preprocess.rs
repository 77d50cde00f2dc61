//! Normalization applied to both inputs before any comparison

use crate::config::ComparisonConfig;
use crate::dataset::{TabularDataset, Value};

/// Produce a cleaned copy of `dataset`.
///
/// Ignored columns are dropped, then text values are trimmed (when
/// `ignore_whitespace`) and lower-cased (when `ignore_case`). Numeric, boolean
/// and null values pass through untouched.
pub fn preprocess(dataset: &TabularDataset, config: &ComparisonConfig) -> TabularDataset {
    let trimmed = if config.ignore_columns.is_empty() {
        dataset.clone()
    } else {
        dataset.without_columns(&config.ignore_columns)
    };

    if !config.ignore_whitespace && !config.ignore_case {
        return trimmed;
    }

    trimmed.map_values(|value| match value {
        Value::Text(s) => Value::Text(normalize_text(s, config)),
        other => other.clone(),
    })
}

fn normalize_text(s: &str, config: &ComparisonConfig) -> String {
    let s = if config.ignore_whitespace { s.trim() } else { s };
    if config.ignore_case {
        s.to_lowercase()
    } else {
        s.to_string()
    }
}
