//! Column-level schema comparison

use crate::dataset::{ColumnType, TabularDataset};
use crate::result::{section, ReportSections, Section};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::json;

/// A column present in both datasets whose inferred types disagree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeMismatch {
    pub type_a: ColumnType,
    pub type_b: ColumnType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaReport {
    /// Columns of B absent from A
    pub missing_in_a: Vec<String>,
    /// Columns of A absent from B
    pub missing_in_b: Vec<String>,
    pub type_mismatches: IndexMap<String, TypeMismatch>,
    pub total_columns_a: usize,
    pub total_columns_b: usize,
    pub common_columns: usize,
}

impl SchemaReport {
    pub fn columns_match(&self) -> bool {
        self.missing_in_a.is_empty() && self.missing_in_b.is_empty()
    }

    pub fn types_match(&self) -> bool {
        self.type_mismatches.is_empty()
    }
}

/// Compare column names and types. Row data is never inspected.
pub fn compare_schema(a: &TabularDataset, b: &TabularDataset) -> SchemaReport {
    let missing_in_a: Vec<String> = b
        .schema()
        .keys()
        .filter(|name| !a.has_column(name))
        .cloned()
        .collect();
    let missing_in_b: Vec<String> = a
        .schema()
        .keys()
        .filter(|name| !b.has_column(name))
        .cloned()
        .collect();

    let mut type_mismatches = IndexMap::new();
    let mut common = 0;
    for (name, &type_a) in a.schema() {
        if let Some(type_b) = b.column_type(name) {
            common += 1;
            if type_a != type_b {
                type_mismatches.insert(name.clone(), TypeMismatch { type_a, type_b });
            }
        }
    }

    SchemaReport {
        missing_in_a,
        missing_in_b,
        type_mismatches,
        total_columns_a: a.column_count(),
        total_columns_b: b.column_count(),
        common_columns: common,
    }
}

impl ReportSections for SchemaReport {
    fn summary(&self) -> Section {
        section([
            ("columns_match", json!(self.columns_match())),
            ("types_match", json!(self.types_match())),
            ("total_columns_a", json!(self.total_columns_a)),
            ("total_columns_b", json!(self.total_columns_b)),
            ("common_columns", json!(self.common_columns)),
        ])
    }

    fn differences(&self) -> Section {
        section([
            ("missing_in_a", json!(self.missing_in_a)),
            ("missing_in_b", json!(self.missing_in_b)),
            ("type_mismatches", json!(self.type_mismatches)),
        ])
    }
}
