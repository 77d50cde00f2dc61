//! Comparison engine: preprocessing and dispatch to one strategy per mode

use crate::config::ComparisonConfig;
use crate::dataset::{common_columns, DatasetMetadata, TabularDataset, Value};
use crate::error::{Result, TabreconError};
use crate::keyed_diff::compare_keyed;
use crate::preprocess::preprocess;
use crate::result::{ComparisonMetadata, ComparisonOutcome, ComparisonResult};
use crate::schema_diff::compare_schema;
use crate::stats_diff::compare_statistics;
use crate::subset_check::check_subset;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of comparison semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMode {
    /// Column names and types only
    Schema,
    /// Keyed record-by-record comparison
    Full,
    /// Aggregate per-column statistics
    Statistical,
    /// Whether every distinct row of A appears in B
    Subset,
}

impl ComparisonMode {
    pub const ALL: [ComparisonMode; 4] = [
        ComparisonMode::Full,
        ComparisonMode::Schema,
        ComparisonMode::Statistical,
        ComparisonMode::Subset,
    ];

    /// Parse a mode name; `keyed` is accepted for `full`
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "schema" => Ok(ComparisonMode::Schema),
            "full" | "keyed" => Ok(ComparisonMode::Full),
            "statistical" | "stats" => Ok(ComparisonMode::Statistical),
            "subset" => Ok(ComparisonMode::Subset),
            _ => Err(TabreconError::invalid_mode(s)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonMode::Schema => "schema",
            ComparisonMode::Full => "full",
            ComparisonMode::Statistical => "statistical",
            ComparisonMode::Subset => "subset",
        }
    }
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Null-aware equality with absolute tolerance for numbers.
///
/// Two nulls are equal; a null never equals a non-null. Numbers (integer or
/// float) are equal when identical or within `tolerance` of each other; two
/// integers are compared without going through `f64`. Everything else compares
/// exactly, so values of different kinds are never equal.
pub fn values_equal(a: &Value, b: &Value, tolerance: f64) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Integer(x), Value::Integer(y)) => {
            x == y || ((*x as i128 - *y as i128).unsigned_abs() as f64) <= tolerance
        }
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y || (x - y).abs() <= tolerance,
            _ => a == b,
        },
    }
}

/// Runs comparisons under a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct ComparisonEngine {
    config: ComparisonConfig,
}

impl ComparisonEngine {
    pub fn new(config: ComparisonConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    /// Compare two datasets under `mode`
    pub fn compare(
        &self,
        a: &TabularDataset,
        b: &TabularDataset,
        mode: ComparisonMode,
    ) -> ComparisonResult {
        let metadata_a = DatasetMetadata::for_dataset("dataset_a", a);
        let metadata_b = DatasetMetadata::for_dataset("dataset_b", b);
        self.compare_with_metadata(a, b, mode, metadata_a, metadata_b)
    }

    /// Compare two datasets, echoing the caller's metadata about each source
    pub fn compare_with_metadata(
        &self,
        a: &TabularDataset,
        b: &TabularDataset,
        mode: ComparisonMode,
        metadata_a: DatasetMetadata,
        metadata_b: DatasetMetadata,
    ) -> ComparisonResult {
        let a = preprocess(a, &self.config);
        let b = preprocess(b, &self.config);

        log::debug!(
            "Running {} comparison: {} x {} vs {} x {}, {} common columns",
            mode,
            a.row_count(),
            a.column_count(),
            b.row_count(),
            b.column_count(),
            common_columns(&a, &b).len()
        );

        let outcome = match mode {
            ComparisonMode::Schema => ComparisonOutcome::Schema(compare_schema(&a, &b)),
            ComparisonMode::Full => ComparisonOutcome::Keyed(compare_keyed(&a, &b, &self.config)),
            ComparisonMode::Statistical => ComparisonOutcome::Statistical(compare_statistics(
                &a,
                &b,
                self.config.float_tolerance,
            )),
            ComparisonMode::Subset => ComparisonOutcome::Subset(check_subset(&a, &b)),
        };

        let metadata = ComparisonMetadata {
            dataset_a: metadata_a,
            dataset_b: metadata_b,
            comparison_config: self.config.clone(),
            compared_at: chrono::Utc::now(),
        };

        ComparisonResult::new(mode, outcome, metadata)
    }
}

/// Compare two datasets with the given configuration
pub fn compare(
    a: &TabularDataset,
    b: &TabularDataset,
    mode: ComparisonMode,
    config: &ComparisonConfig,
) -> ComparisonResult {
    ComparisonEngine::new(config.clone()).compare(a, b, mode)
}
