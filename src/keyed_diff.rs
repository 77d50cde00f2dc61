//! Keyed record-by-record comparison.
//!
//! Rows of A are joined to rows of B on the configured key columns (an inner
//! equality join, nulls matching nulls). Every row of A is paired with every
//! row of B sharing its key tuple, so duplicate keys multiply pairs. Each pair
//! is compared field by field over the remaining common columns.
//!
//! Differences are grouped by the key tuple rendered as `v1_v2_...`. When more
//! than one differing pair shares a key, the record holds the union of their
//! differing fields, the last pair in row order winning per field.

use crate::config::ComparisonConfig;
use crate::dataset::{common_columns, TabularDataset, Value};
use crate::engine::values_equal;
use crate::hash::{Fingerprint, RowHasher};
use crate::result::{percentage, section, ReportSections, Section};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::json;
use std::collections::HashSet;

pub const NO_COMMON_COLUMNS: &str = "no common columns";
pub const NO_KEY_COLUMNS: &str = "key columns required for keyed comparison";

/// Label stored in place of a numeric delta that cannot be computed
pub const NOT_APPLICABLE: &str = "N/A";

/// One unequal field of a matched pair
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDifference {
    pub internal: Value,
    pub fund: Value,
    /// `internal - fund`, only when both sides are numbers
    pub difference: Option<f64>,
}

impl FieldDifference {
    pub fn new(internal: Value, fund: Value) -> Self {
        let difference = match (&internal, &fund) {
            (Value::Integer(x), Value::Integer(y)) => Some((*x as i128 - *y as i128) as f64),
            _ => match (internal.as_f64(), fund.as_f64()) {
                (Some(x), Some(y)) => Some(x - y),
                _ => None,
            },
        };
        Self {
            internal,
            fund,
            difference,
        }
    }

    /// `difference / |fund| * 100` when defined and finite
    pub fn difference_percent(&self) -> Option<f64> {
        let diff = self.difference?;
        let fund = self.fund.as_f64()?;
        if fund == 0.0 {
            return None;
        }
        let pct = diff / fund.abs() * 100.0;
        pct.is_finite().then_some(pct)
    }

    pub fn kind(&self) -> DifferenceKind {
        match (&self.internal, &self.fund) {
            (Value::Null, _) => DifferenceKind::MissingInInternal,
            (_, Value::Null) => DifferenceKind::MissingInFund,
            (a, b) if a.as_f64().is_some() && b.as_f64().is_some() => DifferenceKind::Numeric,
            (Value::Text(_), Value::Text(_)) => DifferenceKind::Text,
            _ => DifferenceKind::Type,
        }
    }
}

impl Serialize for FieldDifference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FieldDifference", 3)?;
        state.serialize_field("internal", &self.internal)?;
        state.serialize_field("fund", &self.fund)?;
        match self.difference.filter(|d| d.is_finite()) {
            Some(d) => state.serialize_field("difference", &d)?,
            None => state.serialize_field("difference", NOT_APPLICABLE)?,
        }
        state.end()
    }
}

/// Classification of a differing field, used by exports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferenceKind {
    MissingInInternal,
    MissingInFund,
    Numeric,
    Text,
    Type,
}

impl DifferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifferenceKind::MissingInInternal => "missing_in_internal",
            DifferenceKind::MissingInFund => "missing_in_fund",
            DifferenceKind::Numeric => "numeric_difference",
            DifferenceKind::Text => "text_difference",
            DifferenceKind::Type => "type_difference",
        }
    }
}

/// Differing fields of one key, by column name
pub type DifferenceRecord = IndexMap<String, FieldDifference>;

/// Summary of numeric deltas within one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl DeltaStats {
    pub fn from_deltas(deltas: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = deltas.iter().copied().filter(|d| d.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        let count = sorted.len();
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };
        Some(Self {
            count,
            mean: sorted.iter().sum::<f64>() / count as f64,
            median,
            min: sorted[0],
            max: sorted[count - 1],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnBreakdown {
    pub different_records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_deltas: Option<DeltaStats>,
}

/// Outcome of a keyed comparison that ran to completion
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedDiff {
    pub key_columns: Vec<String>,
    pub value_columns: Vec<String>,
    pub total_records_a: usize,
    pub total_records_b: usize,
    pub matched_pair_count: usize,
    pub unmatched_records_a: usize,
    pub unmatched_records_b: usize,
    pub different_records: IndexMap<String, DifferenceRecord>,
}

impl KeyedDiff {
    pub fn data_identical(&self) -> bool {
        self.different_records.is_empty()
    }

    pub fn identical_records(&self) -> usize {
        self.matched_pair_count
            .saturating_sub(self.different_records.len())
    }

    pub fn match_percentage(&self) -> f64 {
        percentage(self.identical_records(), self.matched_pair_count)
    }

    pub fn coverage_percentage(&self) -> f64 {
        percentage(self.matched_pair_count, self.total_records_b)
    }

    /// Per value column: how many records differ there, and their numeric deltas
    pub fn column_breakdown(&self) -> IndexMap<String, ColumnBreakdown> {
        let mut breakdown = IndexMap::new();
        for column in &self.value_columns {
            let fields: Vec<&FieldDifference> = self
                .different_records
                .values()
                .filter_map(|record| record.get(column))
                .collect();
            if fields.is_empty() {
                continue;
            }
            let deltas: Vec<f64> = fields.iter().filter_map(|f| f.difference).collect();
            breakdown.insert(
                column.clone(),
                ColumnBreakdown {
                    different_records: fields.len(),
                    numeric_deltas: DeltaStats::from_deltas(&deltas),
                },
            );
        }
        breakdown
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyedReport {
    Compared(KeyedDiff),
    /// Preconditions failed; carries the explanatory reason
    NotCompared { reason: String },
}

impl KeyedReport {
    pub fn data_identical(&self) -> bool {
        match self {
            KeyedReport::Compared(diff) => diff.data_identical(),
            KeyedReport::NotCompared { .. } => false,
        }
    }

    pub fn diff(&self) -> Option<&KeyedDiff> {
        match self {
            KeyedReport::Compared(diff) => Some(diff),
            KeyedReport::NotCompared { .. } => None,
        }
    }

    fn not_compared(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        log::warn!("Keyed comparison skipped: {}", reason);
        KeyedReport::NotCompared { reason }
    }
}

/// Per-row join outcome: partner count and differing fields for each partner
struct RowMatch {
    partners: usize,
    pair_differences: Vec<Vec<(usize, FieldDifference)>>,
}

/// Join `a` to `b` on the configured key columns and compare matched pairs
pub fn compare_keyed(a: &TabularDataset, b: &TabularDataset, config: &ComparisonConfig) -> KeyedReport {
    let common = common_columns(a, b);
    if common.is_empty() {
        return KeyedReport::not_compared(NO_COMMON_COLUMNS);
    }
    if config.key_columns.is_empty() {
        return KeyedReport::not_compared(NO_KEY_COLUMNS);
    }
    let missing: Vec<&str> = config
        .key_columns
        .iter()
        .map(String::as_str)
        .filter(|key| !common.contains(key))
        .collect();
    if !missing.is_empty() {
        return KeyedReport::not_compared(format!(
            "key columns not found in both datasets: {}",
            missing.join(", ")
        ));
    }

    let a = a.project(&common);
    let b = b.project(&common);

    let key_idx: Vec<usize> = config
        .key_columns
        .iter()
        .filter_map(|key| a.column_index(key))
        .collect();
    let value_idx: Vec<usize> = (0..a.column_count())
        .filter(|idx| !key_idx.contains(idx))
        .collect();
    let names = a.column_names();

    let b_index = RowHasher::index_rows(&b, &key_idx);
    let a_keys = RowHasher::fingerprint_rows(&a, &key_idx);
    let tolerance = config.float_tolerance;
    let b_rows = b.rows();

    let matches: Vec<RowMatch> = a
        .rows()
        .par_iter()
        .zip(a_keys.par_iter())
        .map(|(row_a, key)| {
            let partners = b_index.get(key).map(Vec::as_slice).unwrap_or(&[]);
            let pair_differences = partners
                .iter()
                .map(|&b_idx| diff_pair(row_a, &b_rows[b_idx], &value_idx, tolerance))
                .collect();
            RowMatch {
                partners: partners.len(),
                pair_differences,
            }
        })
        .collect();

    let mut matched_pair_count = 0;
    let mut unmatched_records_a = 0;
    let mut different_records: IndexMap<String, DifferenceRecord> = IndexMap::new();

    for (row_a, row_match) in a.rows().iter().zip(matches) {
        matched_pair_count += row_match.partners;
        if row_match.partners == 0 {
            unmatched_records_a += 1;
        }
        for fields in row_match.pair_differences {
            if fields.is_empty() {
                continue;
            }
            let record = different_records
                .entry(record_key(row_a, &key_idx))
                .or_default();
            for (idx, field) in fields {
                record.insert(names[idx].to_string(), field);
            }
        }
    }

    let a_key_set: HashSet<&Fingerprint> = a_keys.iter().collect();
    let unmatched_records_b: usize = b_index
        .iter()
        .filter(|(key, _)| !a_key_set.contains(key))
        .map(|(_, rows)| rows.len())
        .sum();

    log::debug!(
        "Keyed join: {} matched pairs, {} differing records, {} unmatched in A, {} unmatched in B",
        matched_pair_count,
        different_records.len(),
        unmatched_records_a,
        unmatched_records_b
    );

    KeyedReport::Compared(KeyedDiff {
        key_columns: config.key_columns.clone(),
        value_columns: value_idx.iter().map(|&idx| names[idx].to_string()).collect(),
        total_records_a: a.row_count(),
        total_records_b: b.row_count(),
        matched_pair_count,
        unmatched_records_a,
        unmatched_records_b,
        different_records,
    })
}

fn diff_pair(
    row_a: &[Value],
    row_b: &[Value],
    value_idx: &[usize],
    tolerance: f64,
) -> Vec<(usize, FieldDifference)> {
    value_idx
        .iter()
        .filter(|&&idx| !values_equal(&row_a[idx], &row_b[idx], tolerance))
        .map(|&idx| (idx, FieldDifference::new(row_a[idx].clone(), row_b[idx].clone())))
        .collect()
}

/// Key tuple rendered as `v1_v2_...`
pub fn record_key(row: &[Value], key_idx: &[usize]) -> String {
    key_idx
        .iter()
        .map(|&idx| row[idx].key_repr())
        .collect::<Vec<_>>()
        .join("_")
}

impl ReportSections for KeyedReport {
    fn summary(&self) -> Section {
        match self {
            KeyedReport::Compared(diff) => section([
                ("data_identical", json!(diff.data_identical())),
                ("identical_records", json!(diff.identical_records())),
                ("total_records_a", json!(diff.total_records_a)),
                ("total_records_b", json!(diff.total_records_b)),
                ("matched_pair_count", json!(diff.matched_pair_count)),
                ("different_records", json!(diff.different_records.len())),
                ("match_percentage", json!(diff.match_percentage())),
                ("coverage_percentage", json!(diff.coverage_percentage())),
            ]),
            KeyedReport::NotCompared { reason } => section([
                ("data_identical", json!(false)),
                ("reason", json!(reason)),
            ]),
        }
    }

    fn differences(&self) -> Section {
        match self {
            KeyedReport::Compared(diff) => section([
                ("comparison_method", json!("key_matching")),
                ("key_columns_used", json!(diff.key_columns)),
                ("value_columns_compared", json!(diff.value_columns)),
                ("total_different_records", json!(diff.different_records.len())),
                ("unmatched_records_a", json!(diff.unmatched_records_a)),
                ("unmatched_records_b", json!(diff.unmatched_records_b)),
                ("column_breakdown", json!(diff.column_breakdown())),
                ("different_records", json!(diff.different_records)),
            ]),
            KeyedReport::NotCompared { .. } => Section::new(),
        }
    }
}
