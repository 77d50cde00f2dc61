//! Edge cases: empty inputs, missing columns, bad arguments, large difference sets

use crate::common::assertions::read_report;
use crate::common::CliTestRunner;
use tabrecon::keyed_diff::{KeyedReport, NO_COMMON_COLUMNS};
use tabrecon::output::{JsonFormatter, MAX_JSON_DIFFERENCES};
use tabrecon::subset_check::SubsetReport;
use tabrecon::{compare, ComparisonConfig, ComparisonMode, TabreconError, TabularDataset, Value};

#[test]
fn test_header_only_internal_file() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let a = fixture.create_csv_raw("a.csv", "id,v\n").unwrap();
    let mut rows = vec![vec!["id", "v"]];
    rows.extend([
        vec!["1", "1.0"],
        vec!["2", "2.0"],
        vec!["3", "3.0"],
        vec!["4", "4.0"],
        vec!["5", "5.0"],
    ]);
    let b = fixture.create_csv("b.csv", &rows).unwrap();
    let output = fixture.path("report.json");

    runner
        .run_comparison(&[
            "compare",
            a.to_str().unwrap(),
            b.to_str().unwrap(),
            "--key-columns",
            "id",
            "--format",
            "json",
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap();

    let report = read_report(&output).unwrap();
    assert_eq!(report["summary"]["total_records_a"], 0);
    assert_eq!(report["summary"]["total_records_b"], 5);
    assert_eq!(report["summary"]["coverage_percentage"], 0.0);
    assert_eq!(report["summary"]["match_percentage"], 0.0);
    assert_eq!(report["differences"]["unmatched_records_b"], 5);
}

#[test]
fn test_short_rows_load_as_nulls() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let ragged = fixture.create_csv_raw("ragged.csv", "id,a,b\n1,x,y\n2,z\n").unwrap();

    let dataset = fixture.load(&ragged).unwrap();
    assert_eq!(dataset.row_count(), 2);
    assert_eq!(dataset.rows()[1][0], Value::from(2));
    assert_eq!(dataset.rows()[1][2], Value::Null);

    let full = fixture
        .create_csv("full.csv", &[vec!["id", "a", "b"], vec!["1", "x", "y"], vec!["2", "z", "w"]])
        .unwrap();
    let output = fixture.path("report.json");
    runner
        .run_comparison(&[
            "compare",
            ragged.to_str().unwrap(),
            full.to_str().unwrap(),
            "--key-columns",
            "id",
            "--format",
            "json",
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap();

    let report = read_report(&output).unwrap();
    assert_eq!(report["summary"]["different_records"], 1);
    let field = &report["differences"]["different_records"]["2"]["b"];
    assert!(field["internal"].is_null());
    assert_eq!(field["fund"], "w");
}

#[test]
fn test_no_common_columns() {
    let a = TabularDataset::from_rows(vec!["x"], vec![vec![Value::from(1)]]).unwrap();
    let b = TabularDataset::from_rows(vec!["y"], vec![vec![Value::from(1)]]).unwrap();
    let config = ComparisonConfig::default().with_key_columns(["x"]);

    let keyed = compare(&a, &b, ComparisonMode::Full, &config);
    assert_eq!(
        keyed.keyed(),
        Some(&KeyedReport::NotCompared {
            reason: NO_COMMON_COLUMNS.to_string()
        })
    );
    assert!(keyed.differences().is_empty());

    let subset = compare(&a, &b, ComparisonMode::Subset, &config);
    assert!(matches!(
        subset.subset(),
        Some(SubsetReport::NotChecked { .. })
    ));

    let schema = compare(&a, &b, ComparisonMode::Schema, &config);
    assert_eq!(schema.schema().unwrap().common_columns, 0);
}

#[test]
fn test_full_mode_without_keys_reports_reason() {
    let a = TabularDataset::from_rows(vec!["id"], vec![vec![Value::from(1)]]).unwrap();

    let result = compare(&a, &a, ComparisonMode::Full, &ComparisonConfig::default());
    match result.keyed().unwrap() {
        KeyedReport::NotCompared { reason } => assert!(reason.contains("key columns")),
        other => panic!("expected NotCompared, got {:?}", other),
    }
}

#[test]
fn test_null_keys_match_each_other() {
    let a = TabularDataset::from_rows(
        vec!["id", "v"],
        vec![vec![Value::Null, Value::from(1.0)]],
    )
    .unwrap();
    let b = TabularDataset::from_rows(
        vec!["id", "v"],
        vec![vec![Value::Null, Value::from(2.0)]],
    )
    .unwrap();
    let config = ComparisonConfig::default().with_key_columns(["id"]);

    let result = compare(&a, &b, ComparisonMode::Full, &config);
    let diff = result.keyed().and_then(KeyedReport::diff).unwrap();
    assert_eq!(diff.matched_pair_count, 1);
    assert!(diff.different_records.contains_key("null"));
}

#[test]
fn test_null_against_value_is_a_difference() {
    let a = TabularDataset::from_rows(
        vec!["id", "v"],
        vec![vec![Value::from(1), Value::Null]],
    )
    .unwrap();
    let b = TabularDataset::from_rows(
        vec!["id", "v"],
        vec![vec![Value::from(1), Value::from(0.0)]],
    )
    .unwrap();
    let config = ComparisonConfig::default().with_key_columns(["id"]);

    let result = compare(&a, &b, ComparisonMode::Full, &config);
    let diff = result.keyed().and_then(KeyedReport::diff).unwrap();
    let field = &diff.different_records["1"]["v"];
    assert_eq!(field.difference, None);
    assert_eq!(field.kind().as_str(), "missing_in_internal");

    let differences = result.differences();
    assert_eq!(differences["different_records"]["1"]["v"]["difference"], "N/A");
}

#[test]
fn test_json_report_truncates_difference_records() {
    let rows_a: Vec<Vec<Value>> = (0..150)
        .map(|i| vec![Value::from(i), Value::from(i as f64)])
        .collect();
    let rows_b: Vec<Vec<Value>> = (0..150)
        .map(|i| vec![Value::from(i), Value::from(i as f64 + 1.0)])
        .collect();
    let a = TabularDataset::from_rows(vec!["id", "v"], rows_a).unwrap();
    let b = TabularDataset::from_rows(vec!["id", "v"], rows_b).unwrap();
    let config = ComparisonConfig::default().with_key_columns(["id"]);
    let result = compare(&a, &b, ComparisonMode::Full, &config);

    let truncated = JsonFormatter::report_value(&result, false).unwrap();
    let records = truncated["differences"]["different_records"].as_object().unwrap();
    assert_eq!(records.len(), MAX_JSON_DIFFERENCES);
    assert!(records.contains_key("0"));
    assert!(!records.contains_key("149"));
    assert!(truncated["differences"]["_truncated"].is_string());
    assert_eq!(truncated["summary"]["different_records"], 150);

    let full = JsonFormatter::report_value(&result, true).unwrap();
    assert_eq!(
        full["differences"]["different_records"].as_object().unwrap().len(),
        150
    );
    assert!(full["differences"].get("_truncated").is_none());
}

#[test]
fn test_invalid_mode_rejected_before_loading() {
    let runner = CliTestRunner::new().unwrap();
    // Neither file exists; the mode must be rejected first
    let err = runner
        .run_comparison(&["compare", "missing_a.csv", "missing_b.csv", "--mode", "fuzzy"])
        .unwrap_err();
    assert!(matches!(err, TabreconError::InvalidMode { .. }));
}

#[test]
fn test_negative_tolerance_rejected() {
    let runner = CliTestRunner::new().unwrap();
    let err = runner
        .run_comparison(&[
            "compare",
            "missing_a.csv",
            "missing_b.csv",
            "--tolerance=-0.5",
        ])
        .unwrap_err();
    assert!(matches!(err, TabreconError::Config { .. }));
}

#[test]
fn test_invalid_output_format_rejected() {
    let runner = CliTestRunner::new().unwrap();
    let err = runner
        .run_comparison(&["compare", "a.csv", "b.csv", "--format", "xml"])
        .unwrap_err();
    assert!(matches!(err, TabreconError::InvalidInput { .. }));
}

#[test]
fn test_missing_file() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let a = fixture.create_csv("a.csv", &[vec!["id"], vec!["1"]]).unwrap();
    let missing = fixture.path("nope.csv");

    let err = runner
        .run_comparison(&[
            "compare",
            a.to_str().unwrap(),
            missing.to_str().unwrap(),
            "--mode",
            "schema",
        ])
        .unwrap_err();
    assert!(matches!(err, TabreconError::InvalidInput { .. }));
    assert!(err.to_string().contains("nope.csv"));
}

#[test]
fn test_unsupported_extension() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let a = fixture.create_csv_raw("a.xlsx", "id\n1\n").unwrap();
    let b = fixture.create_csv("b.csv", &[vec!["id"], vec!["1"]]).unwrap();

    let err = runner
        .run_comparison(&["compare", a.to_str().unwrap(), b.to_str().unwrap()])
        .unwrap_err();
    assert!(matches!(err, TabreconError::InvalidInput { .. }));
}

#[test]
fn test_export_differences_skipped_for_other_modes() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let a = fixture.create_csv("a.csv", &[vec!["id"], vec!["1"]]).unwrap();
    let b = fixture.create_csv("b.csv", &[vec!["id"], vec!["2"]]).unwrap();
    let diffs = fixture.path("diffs.csv");

    runner
        .run_comparison(&[
            "compare",
            a.to_str().unwrap(),
            b.to_str().unwrap(),
            "--mode",
            "subset",
            "--format",
            "json",
            "--export-differences",
            diffs.to_str().unwrap(),
        ])
        .unwrap();
    assert!(!diffs.exists());
}
