//! Aggregate per-column statistics and their comparison

use crate::dataset::{ColumnType, TabularDataset, Value};
use crate::hash::RowHasher;
use crate::result::{section, ReportSections, Section};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;

/// Descriptive statistics for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStatistics {
    pub column_type: ColumnType,
    pub count: usize,
    pub null_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericDifference {
    pub mean_difference: f64,
    /// Absent when either side has fewer than two values
    pub std_difference: Option<f64>,
    pub significant_difference: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticalReport {
    pub rows_a: usize,
    pub rows_b: usize,
    pub columns_a: usize,
    pub columns_b: usize,
    pub stats_a: IndexMap<String, ColumnStatistics>,
    pub stats_b: IndexMap<String, ColumnStatistics>,
    pub numeric_differences: IndexMap<String, NumericDifference>,
}

impl StatisticalReport {
    pub fn shape_match(&self) -> bool {
        self.rows_a == self.rows_b && self.columns_a == self.columns_b
    }
}

/// Describe every column of a dataset
pub fn describe(dataset: &TabularDataset) -> IndexMap<String, ColumnStatistics> {
    dataset
        .schema()
        .iter()
        .enumerate()
        .map(|(idx, (name, &column_type))| (name.clone(), describe_column(dataset, idx, column_type)))
        .collect()
}

fn describe_column(dataset: &TabularDataset, idx: usize, column_type: ColumnType) -> ColumnStatistics {
    let null_count = dataset.null_count(idx);
    let count = dataset.row_count() - null_count;
    let mut stats = ColumnStatistics {
        column_type,
        count,
        null_count,
        unique: None,
        mean: None,
        std: None,
        min: None,
        max: None,
    };

    if column_type == ColumnType::Numeric {
        let values: Vec<f64> = dataset.column_values(idx).filter_map(Value::as_f64).collect();
        stats.mean = mean(&values);
        stats.std = sample_std(&values);
        stats.min = values.iter().copied().reduce(f64::min);
        stats.max = values.iter().copied().reduce(f64::max);
    } else {
        let distinct: HashSet<_> = dataset
            .column_values(idx)
            .filter(|v| !v.is_null())
            .map(|v| RowHasher::fingerprint([v]))
            .collect();
        stats.unique = Some(distinct.len());
    }
    stats
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample (n - 1) standard deviation
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Compare per-column statistics of two datasets.
///
/// Numeric differences cover columns numeric in both datasets; a column with no
/// non-null values on either side has no mean and is skipped.
pub fn compare_statistics(a: &TabularDataset, b: &TabularDataset, tolerance: f64) -> StatisticalReport {
    let stats_a = describe(a);
    let stats_b = describe(b);

    let mut numeric_differences = IndexMap::new();
    for (name, sa) in &stats_a {
        let Some(sb) = stats_b.get(name) else {
            continue;
        };
        if sa.column_type != ColumnType::Numeric || sb.column_type != ColumnType::Numeric {
            continue;
        }
        let (Some(mean_a), Some(mean_b)) = (sa.mean, sb.mean) else {
            continue;
        };
        let mean_difference = (mean_a - mean_b).abs();
        let std_difference = match (sa.std, sb.std) {
            (Some(x), Some(y)) => Some((x - y).abs()),
            _ => None,
        };
        numeric_differences.insert(
            name.clone(),
            NumericDifference {
                mean_difference,
                std_difference,
                significant_difference: mean_difference > tolerance,
            },
        );
    }

    log::debug!(
        "Statistical comparison: {} numeric columns compared",
        numeric_differences.len()
    );

    StatisticalReport {
        rows_a: a.row_count(),
        rows_b: b.row_count(),
        columns_a: a.column_count(),
        columns_b: b.column_count(),
        stats_a,
        stats_b,
        numeric_differences,
    }
}

fn null_counts(stats: &IndexMap<String, ColumnStatistics>) -> IndexMap<&str, usize> {
    stats
        .iter()
        .map(|(name, s)| (name.as_str(), s.null_count))
        .collect()
}

impl ReportSections for StatisticalReport {
    fn summary(&self) -> Section {
        let significant = self
            .numeric_differences
            .values()
            .filter(|d| d.significant_difference)
            .count();
        section([
            ("shape_match", json!(self.shape_match())),
            ("rows_a", json!(self.rows_a)),
            ("rows_b", json!(self.rows_b)),
            ("columns_a", json!(self.columns_a)),
            ("columns_b", json!(self.columns_b)),
            ("numeric_columns_compared", json!(self.numeric_differences.len())),
            ("significant_differences", json!(significant)),
        ])
    }

    fn differences(&self) -> Section {
        section([("numeric_differences", json!(self.numeric_differences))])
    }

    fn statistics(&self) -> Section {
        section([
            ("a_stats", json!(self.stats_a)),
            ("b_stats", json!(self.stats_b)),
            ("a_nulls", json!(null_counts(&self.stats_a))),
            ("b_nulls", json!(null_counts(&self.stats_b))),
        ])
    }
}
