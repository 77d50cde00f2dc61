//! Internal dataset extraction from SQL files

use crate::data::DataProcessor;
use crate::dataset::{DatasetMetadata, TabularDataset};
use crate::error::{Result, TabreconError};
use indexmap::IndexMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// A parsed SQL file: optional ATTACH statement, setup statements and the query
#[derive(Debug, Clone)]
pub struct SqlFile {
    /// `ATTACH ...` statement declared in a comment, placeholders unresolved
    pub attach: Option<String>,
    /// Statements before the query (`USE db;`, `SET ...;`)
    pub setup: Vec<String>,
    pub query: String,
    pub source_path: PathBuf,
}

/// Parse a SQL file to extract the connection statement and query
pub fn parse_sql_file(file_path: &Path) -> Result<SqlFile> {
    let content = fs::read_to_string(file_path).map_err(|e| {
        TabreconError::query(file_path, format!("Failed to read SQL file: {}", e))
    })?;

    let mut attach = None;
    let mut setup_lines = Vec::new();
    let mut query_lines = Vec::new();
    let mut in_query = false;

    for line in content.lines() {
        let trimmed = line.trim();

        if let Some(comment) = trimmed.strip_prefix("--") {
            let comment = comment.trim();
            if !in_query && attach.is_none() && comment.to_uppercase().starts_with("ATTACH") {
                attach = Some(comment.to_string());
            }
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }

        let upper = trimmed.to_uppercase();
        if !in_query && (upper.starts_with("SELECT") || upper.starts_with("WITH")) {
            in_query = true;
        }
        if in_query {
            query_lines.push(line);
        } else {
            setup_lines.push(trimmed);
        }
    }

    // Setup statements may span lines; split them on ';'
    let setup = setup_lines
        .join("\n")
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if query_lines.is_empty() {
        return Err(TabreconError::query(file_path, "No SELECT query found"));
    }

    Ok(SqlFile {
        attach,
        setup,
        query: query_lines.join("\n").trim().to_string(),
        source_path: file_path.to_path_buf(),
    })
}

/// Substitute `{VAR}` placeholders with environment variables
pub fn substitute_env_vars(connection_string: &str) -> Result<String> {
    let mut result = connection_string.to_string();

    let mut start = 0;
    while let Some(open_pos) = result[start..].find('{') {
        let open_pos = start + open_pos;
        let Some(close_pos) = result[open_pos..].find('}') else {
            break;
        };
        let close_pos = open_pos + close_pos;
        let var_name = &result[open_pos + 1..close_pos];

        let var_value = env::var(var_name).map_err(|_| {
            TabreconError::config(format!(
                "Environment variable '{}' not found. Make sure it's set in your .env file or environment.",
                var_name
            ))
        })?;

        result.replace_range(open_pos..=close_pos, &var_value);
        start = open_pos + var_value.len();
    }

    Ok(result)
}

/// Substitute `{name}` placeholders in a query with named parameters.
///
/// Placeholders without a matching parameter are left as they are.
pub fn substitute_params(query: &str, params: &IndexMap<String, String>) -> String {
    params.iter().fold(query.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{}}}", name), value)
    })
}

/// Parse a `name=value` query parameter
pub fn parse_param(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(TabreconError::invalid_input(format!(
            "Query parameters must look like name=value, got '{}'",
            raw
        ))),
    }
}

/// Load environment variables from .env file if it exists
pub fn load_env_file() -> Result<()> {
    if Path::new(".env").exists() {
        dotenv::dotenv()
            .map_err(|e| TabreconError::config(format!("Failed to load .env file: {}", e)))?;
        log::debug!("Loaded environment from .env");
    }
    Ok(())
}

/// Check if a file is a SQL file
pub fn is_sql_file(file_path: &Path) -> bool {
    file_path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("sql"))
        .unwrap_or(false)
}

/// Run the query in `file_path` and return the internal dataset
pub fn load_internal(
    processor: &DataProcessor,
    file_path: &Path,
    params: &IndexMap<String, String>,
) -> Result<(TabularDataset, DatasetMetadata)> {
    if !is_sql_file(file_path) {
        return Err(TabreconError::invalid_input(format!(
            "Expected a .sql file, got {}",
            file_path.display()
        )));
    }

    load_env_file()?;
    let sql = parse_sql_file(file_path)?;

    let mut prelude = Vec::new();
    if let Some(attach) = &sql.attach {
        let statement = substitute_env_vars(attach)?;
        prelude.push(terminate(&statement));
    }
    prelude.extend(sql.setup.iter().map(|s| terminate(s)));
    let prelude = (!prelude.is_empty()).then(|| prelude.join("\n"));

    let query = substitute_params(&sql.query, params);
    log::info!("Running internal query from {}", file_path.display());
    log::debug!("Query:\n{}", query);

    let dataset = processor
        .run_query(prelude.as_deref(), &query)
        .map_err(|e| TabreconError::query(file_path, e.to_string()))?;

    let mut metadata = DatasetMetadata::for_dataset(file_path.display().to_string(), &dataset);
    metadata.query = Some(query);
    Ok((dataset, metadata))
}

fn terminate(statement: &str) -> String {
    let statement = statement.trim();
    if statement.ends_with(';') {
        statement.to_string()
    } else {
        format!("{};", statement)
    }
}
