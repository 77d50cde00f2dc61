//! Output formatting utilities

use crate::dataset::DatasetMetadata;
use crate::error::Result;
use crate::keyed_diff::KeyedReport;
use crate::reports::{ReportFile, ReportsStats};
use crate::result::{ComparisonOutcome, ComparisonResult, Section};
use crate::subset_check::SubsetReport;
use serde_json::{json, Value};

/// Keyed difference records kept in JSON output unless all are requested
pub const MAX_JSON_DIFFERENCES: usize = 100;

const CONSOLE_SAMPLE: usize = 5;

/// Pretty printer for tabrecon output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print a comparison report as a tree
    pub fn print_comparison(result: &ComparisonResult, verbose: bool) {
        let metadata = result.metadata();
        println!("🔍 Comparison ({})", result.mode());
        println!("├─ A (internal): {}", metadata.dataset_a.source);
        println!("├─ B (fund): {}", metadata.dataset_b.source);

        println!("├─ Summary");
        print_section(&result.summary(), "│  ");

        match result.outcome() {
            ComparisonOutcome::Schema(report) => {
                if !report.missing_in_a.is_empty() {
                    println!("├─ Only in B: {}", report.missing_in_a.join(", "));
                }
                if !report.missing_in_b.is_empty() {
                    println!("├─ Only in A: {}", report.missing_in_b.join(", "));
                }
                for (column, mismatch) in &report.type_mismatches {
                    println!("├─ Type mismatch: {} ({} vs {})", column, mismatch.type_a, mismatch.type_b);
                }
            }
            ComparisonOutcome::Keyed(KeyedReport::Compared(diff)) => {
                if !diff.different_records.is_empty() {
                    println!("├─ Differing records: {}", diff.different_records.len());
                    for (key, record) in diff.different_records.iter().take(CONSOLE_SAMPLE) {
                        println!("│  ├─ {}", key);
                        for (column, field) in record {
                            println!(
                                "│  │  └─ {}: '{}' → '{}'",
                                column, field.internal, field.fund
                            );
                        }
                    }
                    if diff.different_records.len() > CONSOLE_SAMPLE {
                        println!(
                            "│  └─ ... and {} more",
                            diff.different_records.len() - CONSOLE_SAMPLE
                        );
                    }
                    println!("├─ Column breakdown");
                    for (column, breakdown) in diff.column_breakdown() {
                        match breakdown.numeric_deltas {
                            Some(deltas) => println!(
                                "│  ├─ {}: {} records (mean Δ {:.4}, max Δ {:.4})",
                                column, breakdown.different_records, deltas.mean, deltas.max
                            ),
                            None => println!("│  ├─ {}: {} records", column, breakdown.different_records),
                        }
                    }
                }
                if diff.unmatched_records_a > 0 || diff.unmatched_records_b > 0 {
                    println!(
                        "├─ Unmatched: {} in A, {} in B",
                        diff.unmatched_records_a, diff.unmatched_records_b
                    );
                }
            }
            ComparisonOutcome::Keyed(KeyedReport::NotCompared { .. }) => {}
            ComparisonOutcome::Statistical(report) => {
                for (column, difference) in &report.numeric_differences {
                    let marker = if difference.significant_difference { "❌" } else { "✅" };
                    println!(
                        "├─ {} {}: mean Δ {:.6}",
                        marker, column, difference.mean_difference
                    );
                }
            }
            ComparisonOutcome::Subset(SubsetReport::Checked(check)) => {
                if !check.is_subset() {
                    println!("├─ Rows of A missing in B: {}", check.rows_missing_in_b());
                    for row in &check.sample_missing_rows {
                        let rendered: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                        println!("│  └─ [{}]", rendered.join(", "));
                    }
                }
            }
            ComparisonOutcome::Subset(SubsetReport::NotChecked { .. }) => {}
        }

        if verbose {
            let statistics = result.statistics();
            if !statistics.is_empty() {
                println!("├─ Statistics");
                print_section(&statistics, "│  ");
            }
        }

        let (ok, message) = verdict(result);
        println!("└─ {} {}", if ok { "✅" } else { "❌" }, message);
    }

    /// Print information about one loaded dataset
    pub fn print_dataset_info(metadata: &DatasetMetadata, issues: &[String]) {
        println!("📄 Dataset: {}", metadata.source);
        println!("├─ Rows: {}", metadata.row_count);
        println!("├─ Columns: {}", metadata.column_count);
        if let Some(size) = metadata.file_size {
            println!("├─ Size: {}", format_bytes(size));
        }
        if let Some(encoding) = &metadata.encoding {
            println!("├─ Encoding: {}", encoding);
        }
        if let Some(delimiter) = &metadata.delimiter {
            println!("├─ Delimiter: {}", delimiter);
        }
        if issues.is_empty() {
            println!("├─ ✅ Structure: no issues");
        } else {
            println!("├─ ⚠️  Structure issues:");
            for issue in issues {
                println!("│  └─ {}", issue);
            }
        }
        println!("└─ Column types:");
        let count = metadata.column_types.len();
        for (i, (name, column_type)) in metadata.column_types.iter().enumerate() {
            let prefix = if i + 1 == count { "   └─" } else { "   ├─" };
            println!("{} {}: {}", prefix, name, column_type);
        }
    }

    /// Print the list of generated reports
    pub fn print_reports(files: &[ReportFile], stats: &ReportsStats) {
        if files.is_empty() {
            println!("No reports found.");
            return;
        }

        println!("📁 Reports");
        for file in files {
            println!(
                "├─ [{}] {} ({})",
                file.category,
                file.path.display(),
                format_bytes(file.size)
            );
        }
        println!(
            "└─ {} comparisons, {} exports, {} difference files, {} total",
            stats.comparison_count,
            stats.export_count,
            stats.difference_count,
            format_bytes(stats.total_size)
        );
    }
}

fn print_section(section: &Section, prefix: &str) {
    let count = section.len();
    for (i, (key, value)) in section.iter().enumerate() {
        let marker = if i + 1 == count { "└─" } else { "├─" };
        println!("{}{} {}: {}", prefix, marker, key, render_scalar(value));
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.2}", f),
            _ => n.to_string(),
        },
        Value::Object(map) => format!("{{{} entries}}", map.len()),
        Value::Array(items) => format!("[{} items]", items.len()),
        other => other.to_string(),
    }
}

/// Whether the comparison passed, with a one-line explanation
pub fn verdict(result: &ComparisonResult) -> (bool, String) {
    match result.outcome() {
        ComparisonOutcome::Schema(report) => {
            if report.columns_match() && report.types_match() {
                (true, "Schemas match".to_string())
            } else {
                (false, "Schemas differ".to_string())
            }
        }
        ComparisonOutcome::Keyed(KeyedReport::Compared(diff)) => {
            if diff.data_identical() {
                (true, format!("All {} matched records are identical", diff.matched_pair_count))
            } else {
                (
                    false,
                    format!(
                        "{} of {} matched records differ ({:.2}% match)",
                        diff.different_records.len(),
                        diff.matched_pair_count,
                        diff.match_percentage()
                    ),
                )
            }
        }
        ComparisonOutcome::Keyed(KeyedReport::NotCompared { reason })
        | ComparisonOutcome::Subset(SubsetReport::NotChecked { reason }) => {
            (false, format!("Not compared: {}", reason))
        }
        ComparisonOutcome::Statistical(report) => {
            let significant = report
                .numeric_differences
                .values()
                .filter(|d| d.significant_difference)
                .count();
            if significant == 0 && report.shape_match() {
                (true, "Statistics match".to_string())
            } else {
                (
                    false,
                    format!("{} columns differ significantly", significant),
                )
            }
        }
        ComparisonOutcome::Subset(SubsetReport::Checked(check)) => {
            if check.is_subset() {
                (true, "A is a subset of B".to_string())
            } else {
                (false, "A is not a subset of B".to_string())
            }
        }
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Build the JSON report document
    pub fn report_value(result: &ComparisonResult, full_differences: bool) -> Result<Value> {
        let mut differences = result.differences();
        if !full_differences {
            truncate_records(&mut differences, MAX_JSON_DIFFERENCES);
        }

        Ok(json!({
            "report_info": {
                "generated_at": chrono::Utc::now(),
                "mode": result.mode(),
                "version": crate::VERSION,
            },
            "summary": result.summary(),
            "differences": differences,
            "statistics": result.statistics(),
            "metadata": serde_json::to_value(result.metadata())?,
        }))
    }

    pub fn format_report(result: &ComparisonResult, full_differences: bool) -> Result<String> {
        Self::format(&Self::report_value(result, full_differences)?)
    }

    pub fn format_dataset_info(metadata: &DatasetMetadata, issues: &[String]) -> Result<String> {
        Self::format(&json!({
            "metadata": metadata,
            "issues": issues,
        }))
    }

    pub fn format_reports(files: &[ReportFile], stats: &ReportsStats) -> Result<String> {
        Self::format(&json!({
            "files": files,
            "stats": stats,
        }))
    }
}

/// Keep the first `limit` keyed difference records and note how many were dropped
fn truncate_records(differences: &mut Section, limit: usize) {
    let Some(Value::Object(records)) = differences.get_mut("different_records") else {
        return;
    };
    let total = records.len();
    if total <= limit {
        return;
    }
    let kept: serde_json::Map<String, Value> = std::mem::take(records)
        .into_iter()
        .take(limit)
        .collect();
    *records = kept;
    differences.insert(
        "_truncated".to_string(),
        json!(format!(
            "Showing first {} of {} records; use --full-differences for all",
            limit, total
        )),
    );
}

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
