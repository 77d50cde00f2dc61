//! In-memory tabular datasets used as comparison inputs

use crate::error::{Result, TabreconError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    /// Exact integer, kept apart from `Number` so 64-bit identifiers survive
    Integer(i64),
    Number(f64),
    Text(String),
    Boolean(bool),
}

impl Value {
    /// Build a numeric value, mapping NaN to null
    pub fn number(n: f64) -> Self {
        if n.is_nan() {
            Value::Null
        } else {
            Value::Number(n)
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The type tag this value would carry on its own
    pub fn kind(&self) -> ColumnType {
        match self {
            Value::Null => ColumnType::Null,
            Value::Integer(_) | Value::Number(_) => ColumnType::Numeric,
            Value::Text(_) => ColumnType::Text,
            Value::Boolean(_) => ColumnType::Boolean,
        }
    }

    /// Rendering used when joining key values into a record identifier
    pub fn key_repr(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            other => other.to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(n.to_string())),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Per-column type tag, decided once when a dataset is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Text,
    Boolean,
    Null,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::Null => "null",
        }
    }

    /// Infer a column type from its values.
    ///
    /// All-null columns are `Null`; a column mixing kinds falls back to `Text`.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut inferred = ColumnType::Null;
        for value in values {
            let kind = value.kind();
            if kind == ColumnType::Null {
                continue;
            }
            if inferred == ColumnType::Null {
                inferred = kind;
            } else if inferred != kind {
                return ColumnType::Text;
            }
        }
        inferred
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One comparison input: ordered, uniquely named, typed columns and rows of values.
///
/// Every row holds exactly one value per declared column. Datasets are never
/// mutated in place; transformations return new datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularDataset {
    schema: IndexMap<String, ColumnType>,
    rows: Vec<Vec<Value>>,
}

impl TabularDataset {
    /// Build a dataset from an explicit schema
    pub fn new(schema: Vec<(String, ColumnType)>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let width = schema.len();
        let mut ordered = IndexMap::with_capacity(width);
        for (name, column_type) in schema {
            if ordered.insert(name.clone(), column_type).is_some() {
                return Err(TabreconError::invalid_dataset(format!(
                    "Duplicate column name: {}",
                    name
                )));
            }
        }

        if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(TabreconError::invalid_dataset(format!(
                "Row {} has {} values but {} columns are declared",
                index,
                row.len(),
                width
            )));
        }

        Ok(Self {
            schema: ordered,
            rows,
        })
    }

    /// Build a dataset inferring each column's type from its values
    pub fn from_rows<S: Into<String>>(columns: Vec<S>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let names: Vec<String> = columns.into_iter().map(Into::into).collect();
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != names.len()) {
            return Err(TabreconError::invalid_dataset(format!(
                "Row {} has {} values but {} columns are declared",
                index,
                row.len(),
                names.len()
            )));
        }

        let schema = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let column_type = ColumnType::infer(rows.iter().map(|row| &row[idx]));
                (name, column_type)
            })
            .collect();

        Self::new(schema, rows)
    }

    pub fn schema(&self) -> &IndexMap<String, ColumnType> {
        &self.schema
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.schema.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.keys().map(String::as_str).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.get_index_of(name)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.schema.get(name).copied()
    }

    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    pub fn null_count(&self, index: usize) -> usize {
        self.column_values(index).filter(|v| v.is_null()).count()
    }

    /// Keep only the named columns, in the order given. Unknown names are skipped.
    pub fn project(&self, columns: &[&str]) -> TabularDataset {
        let indices: Vec<usize> = columns
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        self.select_indices(&indices)
    }

    /// Drop every column named in `names`. Unknown names are ignored.
    pub fn without_columns(&self, names: &HashSet<String>) -> TabularDataset {
        let indices: Vec<usize> = self
            .schema
            .keys()
            .enumerate()
            .filter(|(_, name)| !names.contains(*name))
            .map(|(idx, _)| idx)
            .collect();
        self.select_indices(&indices)
    }

    /// Apply `f` to every value, keeping the schema
    pub fn map_values(&self, f: impl Fn(&Value) -> Value) -> TabularDataset {
        TabularDataset {
            schema: self.schema.clone(),
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(&f).collect())
                .collect(),
        }
    }

    fn select_indices(&self, indices: &[usize]) -> TabularDataset {
        let schema = indices
            .iter()
            .filter_map(|&idx| self.schema.get_index(idx))
            .map(|(name, column_type)| (name.clone(), *column_type))
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&idx| row[idx].clone()).collect())
            .collect();
        TabularDataset { schema, rows }
    }

    /// Structural issues worth warning about before comparing
    pub fn validate_structure(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.rows.is_empty() {
            issues.push("Dataset is empty".to_string());
        }

        let unnamed: Vec<&str> = self
            .schema
            .keys()
            .map(String::as_str)
            .filter(|name| is_generated_column_name(name))
            .collect();
        if !unnamed.is_empty() {
            issues.push(format!("Found unnamed columns: {}", unnamed.join(", ")));
        }

        if !self.rows.is_empty() {
            let sparse: Vec<&str> = self
                .schema
                .keys()
                .enumerate()
                .filter(|(idx, _)| self.null_count(*idx) * 2 > self.rows.len())
                .map(|(_, name)| name.as_str())
                .collect();
            if !sparse.is_empty() {
                issues.push(format!("Columns with >50% missing data: {}", sparse.join(", ")));
            }
        }

        issues
    }
}

/// Column names shared by both datasets, in `a`'s order
pub fn common_columns<'a>(a: &'a TabularDataset, b: &TabularDataset) -> Vec<&'a str> {
    a.schema
        .keys()
        .map(String::as_str)
        .filter(|name| b.has_column(name))
        .collect()
}

/// Loaders name header-less columns `column0`, `column1`, ...
fn is_generated_column_name(name: &str) -> bool {
    name.trim().is_empty()
        || name
            .strip_prefix("column")
            .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false)
}

/// Descriptive information about where a dataset came from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub source: String,
    pub encoding: Option<String>,
    pub delimiter: Option<String>,
    pub row_count: usize,
    pub column_count: usize,
    pub file_size: Option<u64>,
    pub query: Option<String>,
    pub column_types: IndexMap<String, ColumnType>,
}

impl DatasetMetadata {
    pub fn for_dataset(source: impl Into<String>, dataset: &TabularDataset) -> Self {
        Self {
            source: source.into(),
            row_count: dataset.row_count(),
            column_count: dataset.column_count(),
            column_types: dataset.schema().clone(),
            ..Default::default()
        }
    }
}
