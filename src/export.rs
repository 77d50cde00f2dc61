//! CSV exports of keyed differences and datasets

use crate::dataset::{TabularDataset, Value};
use crate::error::{Result, TabreconError};
use crate::keyed_diff::KeyedDiff;
use std::fs;
use std::path::Path;

const DIFFERENCE_HEADER: [&str; 7] = [
    "key",
    "column",
    "internal_value",
    "fund_value",
    "difference",
    "difference_percent",
    "difference_type",
];

/// Write one row per differing field. Returns the number of rows written.
pub fn export_differences(diff: &KeyedDiff, path: &Path) -> Result<usize> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(DIFFERENCE_HEADER)?;

    let mut written = 0;
    for (key, record) in &diff.different_records {
        for (column, field) in record {
            let internal = field.internal.to_string();
            let fund = field.fund.to_string();
            let difference = field.difference.map(|d| d.to_string()).unwrap_or_default();
            let percent = field
                .difference_percent()
                .map(|p| format!("{:.4}", p))
                .unwrap_or_default();
            writer.write_record([
                key.as_str(),
                column.as_str(),
                internal.as_str(),
                fund.as_str(),
                difference.as_str(),
                percent.as_str(),
                field.kind().as_str(),
            ])?;
            written += 1;
        }
    }
    writer.flush()?;

    log::info!("Exported {} differences to {}", written, path.display());
    Ok(written)
}

/// Write a dataset as CSV with a header row; nulls become empty fields
pub fn export_dataset(dataset: &TabularDataset, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(dataset.column_names())?;
    for row in dataset.rows() {
        writer.write_record(row.iter().map(Value::to_string))?;
    }
    writer.flush()?;

    log::info!(
        "Exported {} rows to {}",
        dataset.row_count(),
        path.display()
    );
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).map_err(|e| {
            TabreconError::export(format!("Cannot create {}: {}", parent.display(), e))
        }),
        _ => Ok(()),
    }
}
