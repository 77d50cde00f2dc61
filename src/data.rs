//! Data loading using DuckDB

use crate::dataset::{DatasetMetadata, TabularDataset, Value};
use crate::error::{Result, TabreconError};
use anyhow::Context;
use duckdb::types::ValueRef;
use duckdb::Connection;
use std::fs;
use std::path::{Path, PathBuf};

/// Text encodings accepted for delimited input files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEncoding {
    Utf8,
    Latin1,
    Cp1252,
}

impl FileEncoding {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(FileEncoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(FileEncoding::Latin1),
            "cp1252" | "windows-1252" => Ok(FileEncoding::Cp1252),
            _ => Err(format!(
                "Unsupported encoding: {}. Valid options: utf-8, latin-1, iso-8859-1, cp1252",
                s
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileEncoding::Utf8 => "utf-8",
            FileEncoding::Latin1 => "latin-1",
            FileEncoding::Cp1252 => "cp1252",
        }
    }
}

/// Per-file overrides for auto-detection
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub encoding: Option<FileEncoding>,
    pub delimiter: Option<u8>,
}

/// How DuckDB column types map onto dataset values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Boolean,
    /// Integer types that fit in `i64`, read without conversion
    Integer,
    /// HUGEINT, UBIGINT and wider: read as text, narrowed to `i64` per value when it fits
    WideInteger,
    Numeric,
    Text,
}

impl ColumnKind {
    fn from_duckdb_type(data_type: &str) -> Self {
        let upper = data_type.trim().to_uppercase();
        match upper.as_str() {
            "BOOLEAN" => ColumnKind::Boolean,
            "TINYINT" | "SMALLINT" | "INTEGER" | "BIGINT" | "UTINYINT" | "USMALLINT"
            | "UINTEGER" => ColumnKind::Integer,
            "HUGEINT" | "UBIGINT" | "UHUGEINT" => ColumnKind::WideInteger,
            "FLOAT" | "REAL" | "DOUBLE" => ColumnKind::Numeric,
            other if other.starts_with("DECIMAL") || other.starts_with("NUMERIC") => {
                ColumnKind::Numeric
            }
            _ => ColumnKind::Text,
        }
    }

    fn select_expr(&self, column: &str) -> String {
        let ident = quote_ident(column);
        match self {
            ColumnKind::Boolean => ident,
            ColumnKind::Integer => format!("CAST({} AS BIGINT) AS {}", ident, ident),
            ColumnKind::Numeric => format!("CAST({} AS DOUBLE) AS {}", ident, ident),
            ColumnKind::WideInteger | ColumnKind::Text => {
                format!("CAST({} AS VARCHAR) AS {}", ident, ident)
            }
        }
    }

    fn read(&self, value: ValueRef<'_>) -> Value {
        match (self, value) {
            (ColumnKind::WideInteger, ValueRef::Text(s)) => {
                let text = String::from_utf8_lossy(s);
                match text.parse::<i64>() {
                    Ok(i) => Value::Integer(i),
                    Err(_) => Value::Text(text.into_owned()),
                }
            }
            (_, other) => value_from_ref(other),
        }
    }
}

/// Loads files and query results into [`TabularDataset`]s
pub struct DataProcessor {
    connection: Connection,
    scratch_files: Vec<PathBuf>,
}

impl DataProcessor {
    pub fn new() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        connection.execute("SET enable_progress_bar=false", [])?;
        Ok(Self {
            connection,
            scratch_files: Vec::new(),
        })
    }

    /// Load a file, detecting encoding and delimiter for delimited text
    pub fn load_file(
        &mut self,
        file_path: &Path,
        options: &LoadOptions,
    ) -> Result<(TabularDataset, DatasetMetadata)> {
        if !file_path.is_file() {
            return Err(TabreconError::invalid_input(format!(
                "File not found: {}",
                file_path.display()
            )));
        }
        if !Self::is_supported_format(file_path) {
            return Err(TabreconError::invalid_input(format!(
                "Unsupported file format: {}",
                file_path.display()
            )));
        }

        let file_size = fs::metadata(file_path)?.len();
        let mut metadata = DatasetMetadata {
            source: file_path.display().to_string(),
            file_size: Some(file_size),
            ..Default::default()
        };

        let relation = if Self::is_delimited(file_path) {
            let (readable, encoding, delimiter) = self.prepare_delimited(file_path, options)?;
            metadata.encoding = Some(encoding.as_str().to_string());
            metadata.delimiter = Some(describe_delimiter(delimiter));
            format!(
                "SELECT * FROM read_csv('{}', delim='{}', header=true, null_padding=true)",
                escape_literal(&readable.to_string_lossy()),
                escape_literal(&(delimiter as char).to_string())
            )
        } else {
            format!(
                "SELECT * FROM '{}'",
                escape_literal(&file_path.to_string_lossy())
            )
        };

        let dataset = self
            .read_relation(&relation)
            .map_err(|e| match e {
                TabreconError::DuckDb(err) => convert_duckdb_error(err, file_path),
                other => other,
            })?;

        metadata.row_count = dataset.row_count();
        metadata.column_count = dataset.column_count();
        metadata.column_types = dataset.schema().clone();

        log::info!(
            "Loaded {} rows x {} columns from {}",
            dataset.row_count(),
            dataset.column_count(),
            file_path.display()
        );
        for issue in dataset.validate_structure() {
            log::warn!("{}: {}", file_path.display(), issue);
        }

        Ok((dataset, metadata))
    }

    /// Run a query, optionally after attaching an external database
    pub fn run_query(&self, attach: Option<&str>, query: &str) -> Result<TabularDataset> {
        if let Some(statement) = attach {
            log::debug!("Attaching external database");
            self.connection.execute_batch(statement)?;
        }
        let query = query.trim().trim_end_matches(';');
        self.read_relation(query)
    }

    /// Decode the file if needed and pick its delimiter.
    ///
    /// Returns a path DuckDB can read as UTF-8, the encoding used and the delimiter.
    fn prepare_delimited(
        &mut self,
        file_path: &Path,
        options: &LoadOptions,
    ) -> Result<(PathBuf, FileEncoding, u8)> {
        let bytes = fs::read(file_path)
            .with_context(|| format!("Failed to read {}", file_path.display()))?;

        let (content, encoding, needs_copy) = match options.encoding {
            Some(FileEncoding::Utf8) => {
                let valid = std::str::from_utf8(&bytes).is_ok();
                (String::from_utf8_lossy(&bytes).into_owned(), FileEncoding::Utf8, !valid)
            }
            Some(FileEncoding::Latin1) => (decode_latin1(&bytes), FileEncoding::Latin1, true),
            Some(FileEncoding::Cp1252) => (decode_cp1252(&bytes), FileEncoding::Cp1252, true),
            None => match String::from_utf8(bytes) {
                Ok(s) => (s, FileEncoding::Utf8, false),
                Err(e) => {
                    log::info!(
                        "{} is not valid UTF-8, decoding as cp1252",
                        file_path.display()
                    );
                    (decode_cp1252(&e.into_bytes()), FileEncoding::Cp1252, true)
                }
            },
        };

        let delimiter = options
            .delimiter
            .unwrap_or_else(|| sniff_delimiter(&content));
        log::debug!(
            "{}: encoding {}, delimiter {}",
            file_path.display(),
            encoding.as_str(),
            describe_delimiter(delimiter)
        );

        if !needs_copy {
            return Ok((file_path.to_path_buf(), encoding, delimiter));
        }

        let copy = std::env::temp_dir().join(format!("tabrecon_{}.csv", uuid::Uuid::new_v4()));
        fs::write(&copy, content.as_bytes())?;
        self.scratch_files.push(copy.clone());
        Ok((copy, encoding, delimiter))
    }

    /// Materialize a SELECT statement into a dataset
    fn read_relation(&self, select_sql: &str) -> Result<TabularDataset> {
        self.connection.execute(
            &format!("CREATE OR REPLACE TEMP VIEW data_view AS {}", select_sql),
            [],
        )?;

        let columns = self.describe_view()?;
        if columns.is_empty() {
            return TabularDataset::from_rows(Vec::<String>::new(), Vec::new());
        }

        let select_list = columns
            .iter()
            .map(|(name, kind)| kind.select_expr(name))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = self
            .connection
            .prepare(&format!("SELECT {} FROM data_view", select_list))?;

        let width = columns.len();
        let rows = stmt.query_map([], |row| {
            let mut values = Vec::with_capacity(width);
            for (i, (_, kind)) in columns.iter().enumerate() {
                values.push(kind.read(row.get_ref(i)?));
            }
            Ok(values)
        })?;

        let mut data = Vec::new();
        for row in rows {
            data.push(row.map_err(|e| {
                TabreconError::data_processing(format!("Failed to read data row: {}", e))
            })?);
        }

        let names: Vec<String> = columns.into_iter().map(|(name, _)| name).collect();
        TabularDataset::from_rows(names, data)
    }

    fn describe_view(&self) -> Result<Vec<(String, ColumnKind)>> {
        let mut stmt = self.connection.prepare("DESCRIBE data_view")?;
        let rows = stmt.query_map([], |row| {
            let name: String = row.get(0)?;
            let data_type: String = row.get(1)?;
            Ok((name, ColumnKind::from_duckdb_type(&data_type)))
        })?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        Ok(columns)
    }

    /// Check if file format is supported
    pub fn is_supported_format(file_path: &Path) -> bool {
        extension(file_path)
            .map(|ext| matches!(ext.as_str(), "csv" | "tsv" | "txt" | "parquet" | "json" | "jsonl"))
            .unwrap_or(false)
    }

    fn is_delimited(file_path: &Path) -> bool {
        extension(file_path)
            .map(|ext| matches!(ext.as_str(), "csv" | "tsv" | "txt"))
            .unwrap_or(false)
    }
}

impl Drop for DataProcessor {
    fn drop(&mut self) {
        for path in &self.scratch_files {
            if let Err(e) = fs::remove_file(path) {
                log::debug!("Could not remove {}: {}", path.display(), e);
            }
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(str::to_lowercase)
}

fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Boolean(b),
        ValueRef::Double(f) => Value::number(f),
        ValueRef::Float(f) => Value::number(f as f64),
        ValueRef::TinyInt(i) => Value::Integer(i as i64),
        ValueRef::SmallInt(i) => Value::Integer(i as i64),
        ValueRef::Int(i) => Value::Integer(i as i64),
        ValueRef::BigInt(i) => Value::Integer(i),
        ValueRef::UTinyInt(i) => Value::Integer(i as i64),
        ValueRef::USmallInt(i) => Value::Integer(i as i64),
        ValueRef::UInt(i) => Value::Integer(i as i64),
        ValueRef::Text(s) => Value::Text(String::from_utf8_lossy(s).into_owned()),
        other => Value::Text(format!("{:?}", other)),
    }
}

/// Used when detection falls back: cp1252 agrees with latin-1 on printable characters
fn decode_cp1252(bytes: &[u8]) -> String {
    let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    decoded.into_owned()
}

/// ISO-8859-1 maps every byte to the code point of the same value
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Pick the delimiter giving the most consistent field count over the first lines.
///
/// Candidates are tab, semicolon, comma and pipe; comma wins when nothing else
/// splits the header.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let target = counts.first().copied().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Parse a delimiter given on the command line (`,`, `;`, `|`, `tab` or `\t`)
pub fn parse_delimiter(s: &str) -> Result<u8> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        _ => Err(TabreconError::invalid_input(format!(
            "Delimiter must be a single ASCII character or 'tab', got '{}'",
            s
        ))),
    }
}

fn describe_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "tab".to_string(),
        other => (other as char).to_string(),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn escape_literal(s: &str) -> String {
    s.replace('\'', "''")
}

/// Map DuckDB failures to user-facing errors
fn convert_duckdb_error(error: duckdb::Error, file_path: &Path) -> TabreconError {
    let error_msg = error.to_string();

    if error_msg.contains("CSV Error")
        || error_msg.contains("Invalid CSV")
        || error_msg.contains("Unterminated quoted field")
    {
        TabreconError::invalid_input(format!(
            "Malformed CSV file '{}': {}",
            file_path.display(),
            error_msg
        ))
    } else if error_msg.contains("JSON") {
        TabreconError::invalid_input(format!(
            "Malformed JSON file '{}': {}",
            file_path.display(),
            error_msg
        ))
    } else if error_msg.contains("No files found") || error_msg.contains("does not exist") {
        TabreconError::invalid_input(format!("File not found: {}", file_path.display()))
    } else if error_msg.contains("UTF-8") || error_msg.contains("encoding") {
        TabreconError::invalid_input(format!(
            "File encoding error '{}': {}",
            file_path.display(),
            error_msg
        ))
    } else {
        TabreconError::DuckDb(error)
    }
}
