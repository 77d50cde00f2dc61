//! compare-with-internal: internal dataset extracted by a SQL file

use crate::common::assertions::{assert_file_exists_and_not_empty, read_report};
use crate::common::CliTestRunner;
use indexmap::IndexMap;
use std::fs;
use tabrecon::data::DataProcessor;
use tabrecon::sql::load_internal;
use tabrecon::{TabreconError, Value};

const POSITIONS_SQL: &str = r#"
-- Positions held on each valuation date
CREATE TABLE positions (
    id INTEGER,
    name VARCHAR,
    balance DOUBLE,
    valuation_date DATE
);
INSERT INTO positions VALUES
    (1, 'Alpha', 100.0, DATE '2024-01-31'),
    (2, 'Beta', 250.0, DATE '2024-01-31'),
    (3, 'Gamma', 75.5, DATE '2024-02-29');

SELECT id, name, balance
FROM positions
WHERE valuation_date = DATE '{date}'
ORDER BY id;
"#;

#[test]
fn test_load_internal_with_parameters() {
    let runner = CliTestRunner::new().unwrap();
    let sql = runner
        .fixture()
        .create_csv_raw("positions.sql", POSITIONS_SQL)
        .unwrap();

    let processor = DataProcessor::new().unwrap();
    let mut params = IndexMap::new();
    params.insert("date".to_string(), "2024-01-31".to_string());

    let (dataset, metadata) = load_internal(&processor, &sql, &params).unwrap();
    assert_eq!(dataset.column_names(), vec!["id", "name", "balance"]);
    assert_eq!(dataset.row_count(), 2);
    assert_eq!(dataset.rows()[1][1], Value::from("Beta"));
    assert_eq!(dataset.rows()[1][2], Value::from(250.0));
    assert!(metadata.query.unwrap().contains("2024-01-31"));
}

#[test]
fn test_compare_with_internal_end_to_end() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let sql = fixture.create_csv_raw("positions.sql", POSITIONS_SQL).unwrap();
    let fund = fixture
        .create_csv(
            "fund.csv",
            &[
                vec!["id", "name", "balance"],
                vec!["1", "Alpha", "100.0"],
                vec!["2", "Beta", "240.0"],
            ],
        )
        .unwrap();
    let output = fixture.path("report.json");
    let exported = fixture.path("internal.csv");

    runner
        .run_comparison(&[
            "compare-with-internal",
            fund.to_str().unwrap(),
            "--query",
            sql.to_str().unwrap(),
            "--param",
            "date=2024-01-31",
            "--key-columns",
            "id",
            "--export-internal",
            exported.to_str().unwrap(),
            "--format",
            "json",
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap();

    let report = read_report(&output).unwrap();
    assert_eq!(report["summary"]["matched_pair_count"], 2);
    assert_eq!(report["summary"]["different_records"], 1);
    let balance = &report["differences"]["different_records"]["2"]["balance"];
    assert_eq!(balance["internal"], 250.0);
    assert_eq!(balance["fund"], 240.0);
    assert_eq!(balance["difference"], 10.0);
    assert!(report["metadata"]["dataset_a"]["query"]
        .as_str()
        .unwrap()
        .contains("positions"));

    assert_file_exists_and_not_empty(&exported);
    let content = fs::read_to_string(&exported).unwrap();
    assert_eq!(content.lines().next(), Some("id,name,balance"));
    assert_eq!(content.lines().count(), 3);
}

#[test]
fn test_sql_without_select_is_rejected() {
    let runner = CliTestRunner::new().unwrap();
    let sql = runner
        .fixture()
        .create_csv_raw("empty.sql", "-- nothing here\nCREATE TABLE t (id INTEGER);\n")
        .unwrap();

    let processor = DataProcessor::new().unwrap();
    let err = load_internal(&processor, &sql, &IndexMap::new()).unwrap_err();
    assert!(matches!(err, TabreconError::Query { .. }));
}

#[test]
fn test_failing_query_names_the_file() {
    let runner = CliTestRunner::new().unwrap();
    let sql = runner
        .fixture()
        .create_csv_raw("broken.sql", "SELECT * FROM table_that_does_not_exist;\n")
        .unwrap();

    let processor = DataProcessor::new().unwrap();
    let err = load_internal(&processor, &sql, &IndexMap::new()).unwrap_err();
    assert!(matches!(err, TabreconError::Query { .. }));
    assert!(err.to_string().contains("broken.sql"));
}

#[test]
fn test_non_sql_query_file_is_rejected() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let not_sql = fixture.create_csv_raw("query.txt", "SELECT 1").unwrap();
    let fund = fixture
        .create_csv("fund.csv", &[vec!["id"], vec!["1"]])
        .unwrap();

    let err = runner
        .run_comparison(&[
            "compare-with-internal",
            fund.to_str().unwrap(),
            "--query",
            not_sql.to_str().unwrap(),
        ])
        .unwrap_err();
    assert!(matches!(err, TabreconError::InvalidInput { .. }));
}

#[test]
fn test_malformed_param_is_rejected() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let sql = fixture.create_csv_raw("positions.sql", POSITIONS_SQL).unwrap();
    let fund = fixture
        .create_csv("fund.csv", &[vec!["id"], vec!["1"]])
        .unwrap();

    let err = runner
        .run_comparison(&[
            "compare-with-internal",
            fund.to_str().unwrap(),
            "--query",
            sql.to_str().unwrap(),
            "--param",
            "no-equals-sign",
        ])
        .unwrap_err();
    assert!(matches!(err, TabreconError::InvalidInput { .. }));
}
