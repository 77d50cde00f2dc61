//! Subset check: does every distinct row of A appear in B?

use crate::dataset::{common_columns, TabularDataset, Value};
use crate::hash::{Fingerprint, RowHasher};
use crate::keyed_diff::NO_COMMON_COLUMNS;
use crate::result::{section, ReportSections, Section};
use serde_json::json;
use std::collections::HashSet;

const SAMPLE_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SubsetCheck {
    pub common_columns: Vec<String>,
    pub unique_rows_a: usize,
    pub unique_rows_b: usize,
    pub matching_rows: usize,
    /// Up to ten distinct A tuples absent from B, over the common columns
    pub sample_missing_rows: Vec<Vec<Value>>,
}

impl SubsetCheck {
    pub fn is_subset(&self) -> bool {
        self.matching_rows == self.unique_rows_a
    }

    pub fn rows_missing_in_b(&self) -> usize {
        self.unique_rows_a - self.matching_rows
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubsetReport {
    Checked(SubsetCheck),
    NotChecked { reason: String },
}

impl SubsetReport {
    pub fn is_subset(&self) -> bool {
        match self {
            SubsetReport::Checked(check) => check.is_subset(),
            SubsetReport::NotChecked { .. } => false,
        }
    }
}

/// Check whether A's distinct tuples over the common columns all occur in B
pub fn check_subset(a: &TabularDataset, b: &TabularDataset) -> SubsetReport {
    let common = common_columns(a, b);
    if common.is_empty() {
        return SubsetReport::NotChecked {
            reason: NO_COMMON_COLUMNS.to_string(),
        };
    }

    let a = a.project(&common);
    let b = b.project(&common);
    let all: Vec<usize> = (0..common.len()).collect();

    let b_distinct: HashSet<Fingerprint> = RowHasher::fingerprint_rows(&b, &all).into_iter().collect();

    let mut seen = HashSet::new();
    let mut unique_rows_a = 0;
    let mut matching_rows = 0;
    let mut sample_missing_rows = Vec::new();
    for (row, fp) in a.rows().iter().zip(RowHasher::fingerprint_rows(&a, &all)) {
        if !seen.insert(fp) {
            continue;
        }
        unique_rows_a += 1;
        if b_distinct.contains(&fp) {
            matching_rows += 1;
        } else if sample_missing_rows.len() < SAMPLE_LIMIT {
            sample_missing_rows.push(row.clone());
        }
    }

    log::debug!(
        "Subset check: {}/{} distinct rows of A found in B",
        matching_rows,
        unique_rows_a
    );

    SubsetReport::Checked(SubsetCheck {
        common_columns: common.iter().map(|c| c.to_string()).collect(),
        unique_rows_a,
        unique_rows_b: b_distinct.len(),
        matching_rows,
        sample_missing_rows,
    })
}

impl ReportSections for SubsetReport {
    fn summary(&self) -> Section {
        match self {
            SubsetReport::Checked(check) => section([
                ("is_subset", json!(check.is_subset())),
                ("common_columns", json!(check.common_columns.len())),
                ("unique_rows_a", json!(check.unique_rows_a)),
                ("unique_rows_b", json!(check.unique_rows_b)),
                ("matching_rows", json!(check.matching_rows)),
            ]),
            SubsetReport::NotChecked { reason } => {
                section([("is_subset", json!(false)), ("reason", json!(reason))])
            }
        }
    }

    fn differences(&self) -> Section {
        match self {
            SubsetReport::Checked(check) => {
                let samples: Vec<serde_json::Map<String, serde_json::Value>> = check
                    .sample_missing_rows
                    .iter()
                    .map(|row| {
                        check
                            .common_columns
                            .iter()
                            .zip(row)
                            .map(|(name, value)| (name.clone(), value.to_json()))
                            .collect()
                    })
                    .collect();
                section([
                    ("rows_missing_in_b", json!(check.rows_missing_in_b())),
                    ("sample_missing_rows", json!(samples)),
                ])
            }
            SubsetReport::NotChecked { .. } => Section::new(),
        }
    }
}
