//! Integration tests for the reports directory and listing

use crate::common::CliTestRunner;
use std::fs;
use tabrecon::reports::ReportsLayout;

fn run_saved_comparison(runner: &CliTestRunner) {
    let fixture = runner.fixture();
    let a = fixture
        .create_csv("internal.csv", &[vec!["id", "v"], vec!["1", "1"], vec!["2", "2"]])
        .unwrap();
    let b = fixture
        .create_csv("fund.csv", &[vec!["id", "v"], vec!["1", "1"], vec!["2", "3"]])
        .unwrap();

    runner
        .run_comparison(&[
            "compare",
            a.to_str().unwrap(),
            b.to_str().unwrap(),
            "--key-columns",
            "id",
            "--format",
            "json",
            "--save-report",
            "--export-differences",
        ])
        .unwrap();
}

#[test]
fn test_saved_report_naming() {
    let runner = CliTestRunner::new().unwrap();
    run_saved_comparison(&runner);

    let layout = ReportsLayout::from_root(runner.reports_dir());
    let names: Vec<String> = fs::read_dir(&layout.comparisons_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("comparison_full_internal_vs_fund_"));
    assert!(names[0].ends_with(".json"));

    let report: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(layout.comparisons_dir.join(&names[0])).unwrap(),
    )
    .unwrap();
    assert_eq!(report["summary"]["different_records"], 1);
}

#[test]
fn test_reports_listing_and_stats() {
    let runner = CliTestRunner::new().unwrap();
    run_saved_comparison(&runner);

    let layout = ReportsLayout::from_root(runner.reports_dir());
    let files = layout.list().unwrap();
    assert_eq!(files.len(), 2);
    assert!(files.iter().any(|f| f.category == "comparisons"));
    assert!(files.iter().any(|f| f.category == "differences"));

    let stats = layout.stats().unwrap();
    assert_eq!(stats.comparison_count, 1);
    assert_eq!(stats.difference_count, 1);
    assert_eq!(stats.export_count, 0);
    assert_eq!(stats.total_size, files.iter().map(|f| f.size).sum::<u64>());

    let reports_dir = runner.reports_dir();
    runner.expect_success(&["reports", "--reports-dir", reports_dir.to_str().unwrap()]);
    runner.expect_success(&[
        "reports",
        "--reports-dir",
        reports_dir.to_str().unwrap(),
        "--format",
        "json",
    ]);
}

#[test]
fn test_reports_on_missing_directory() {
    let runner = CliTestRunner::new().unwrap();
    let layout = ReportsLayout::from_root(runner.fixture().path("never_created"));
    assert!(layout.list().unwrap().is_empty());
    assert_eq!(layout.stats().unwrap().total_size, 0);

    let root = runner.fixture().path("never_created");
    runner.expect_success(&["reports", "--reports-dir", root.to_str().unwrap()]);
}

#[test]
fn test_internal_export_lands_in_data_exports() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let sql = fixture
        .create_csv_raw(
            "internal.sql",
            "SELECT * FROM (VALUES (1, 5.0), (2, 6.0)) t(id, v);\n",
        )
        .unwrap();
    let fund = fixture
        .create_csv("fund.csv", &[vec!["id", "v"], vec!["1", "5.0"], vec!["2", "6.0"]])
        .unwrap();

    runner
        .run_comparison(&[
            "compare-with-internal",
            fund.to_str().unwrap(),
            "--query",
            sql.to_str().unwrap(),
            "--key-columns",
            "id",
            "--format",
            "json",
            "--export-internal",
        ])
        .unwrap();

    let stats = ReportsLayout::from_root(runner.reports_dir()).stats().unwrap();
    assert_eq!(stats.export_count, 1);
    assert_eq!(stats.comparison_count, 0);
}
