//! Unit tests for CLI argument parsing and validation

use clap::Parser;
use std::path::PathBuf;
use tabrecon::cli::{Cli, Commands, OutputFormat};

#[test]
fn test_cli_compare_defaults() {
    let cli = Cli::try_parse_from(["tabrecon", "compare", "internal.csv", "fund.csv"]).unwrap();
    assert!(!cli.verbose);
    match cli.command {
        Commands::Compare {
            file_a,
            file_b,
            encoding_a,
            delimiter_b,
            options,
            ..
        } => {
            assert_eq!(file_a, PathBuf::from("internal.csv"));
            assert_eq!(file_b, PathBuf::from("fund.csv"));
            assert!(encoding_a.is_none());
            assert!(delimiter_b.is_none());
            assert_eq!(options.mode, "full");
            assert_eq!(options.format, "console");
            assert!(options.key_columns.is_none());
            assert!(options.tolerance.is_none());
            assert!(options.export_differences.is_none());
            assert!(!options.save_report);
            assert!(!options.full_differences);
            assert_eq!(options.reports_dir, PathBuf::from("reports"));
        }
        _ => panic!("Expected Compare command"),
    }
}

#[test]
fn test_cli_compare_with_options() {
    let cli = Cli::try_parse_from([
        "tabrecon",
        "compare",
        "a.csv",
        "b.csv",
        "--mode",
        "statistical",
        "--key-columns",
        "id,date",
        "--ignore-columns",
        "notes",
        "--ignore-case",
        "--keep-whitespace",
        "--tolerance",
        "0.01",
        "--format",
        "json",
        "--output",
        "out.json",
        "--delimiter-b",
        ";",
        "--encoding-a",
        "latin-1",
        "--export-differences",
        "diffs.csv",
        "--verbose",
    ])
    .unwrap();

    assert!(cli.verbose);
    match cli.command {
        Commands::Compare {
            encoding_a,
            delimiter_b,
            options,
            ..
        } => {
            assert_eq!(encoding_a.as_deref(), Some("latin-1"));
            assert_eq!(delimiter_b.as_deref(), Some(";"));
            assert_eq!(options.mode, "statistical");
            assert_eq!(options.key_columns.as_deref(), Some("id,date"));
            assert_eq!(options.ignore_columns.as_deref(), Some("notes"));
            assert!(options.ignore_case);
            assert!(options.keep_whitespace);
            assert_eq!(options.tolerance, Some(0.01));
            assert_eq!(options.format, "json");
            assert_eq!(options.output, Some(PathBuf::from("out.json")));
            assert_eq!(
                options.export_differences,
                Some(Some(PathBuf::from("diffs.csv")))
            );
        }
        _ => panic!("Expected Compare command"),
    }
}

#[test]
fn test_cli_compare_with_internal() {
    let cli = Cli::try_parse_from([
        "tabrecon",
        "compare-with-internal",
        "fund.csv",
        "--query",
        "internal.sql",
        "--param",
        "date=2024-01-31",
        "--param",
        "fund=ABC",
        "--export-internal",
    ])
    .unwrap();

    match cli.command {
        Commands::CompareWithInternal {
            fund_file,
            query,
            params,
            export_internal,
            options,
            ..
        } => {
            assert_eq!(fund_file, PathBuf::from("fund.csv"));
            assert_eq!(query, PathBuf::from("internal.sql"));
            assert_eq!(params, vec!["date=2024-01-31", "fund=ABC"]);
            assert_eq!(export_internal, Some(None));
            assert_eq!(options.mode, "full");
        }
        _ => panic!("Expected CompareWithInternal command"),
    }
}

#[test]
fn test_cli_compare_with_internal_requires_query() {
    assert!(Cli::try_parse_from(["tabrecon", "compare-with-internal", "fund.csv"]).is_err());
}

#[test]
fn test_cli_create_config_default_path() {
    let cli = Cli::try_parse_from(["tabrecon", "create-config"]).unwrap();
    match cli.command {
        Commands::CreateConfig { path } => {
            assert_eq!(path, PathBuf::from("config/comparison_config.json"));
        }
        _ => panic!("Expected CreateConfig command"),
    }
}

#[test]
fn test_cli_info_command() {
    let cli = Cli::try_parse_from(["tabrecon", "info", "data.csv", "--format", "json"]).unwrap();
    match cli.command {
        Commands::Info { file, format, .. } => {
            assert_eq!(file, PathBuf::from("data.csv"));
            assert_eq!(format, "json");
        }
        _ => panic!("Expected Info command"),
    }
}

#[test]
fn test_cli_reports_command() {
    let cli = Cli::try_parse_from(["tabrecon", "reports", "--reports-dir", "out"]).unwrap();
    match cli.command {
        Commands::Reports {
            reports_dir,
            format,
        } => {
            assert_eq!(reports_dir, PathBuf::from("out"));
            assert_eq!(format, "pretty");
        }
        _ => panic!("Expected Reports command"),
    }
}

#[test]
fn test_cli_missing_arguments() {
    assert!(Cli::try_parse_from(["tabrecon", "compare", "only_one.csv"]).is_err());
    assert!(Cli::try_parse_from(["tabrecon", "info"]).is_err());
    assert!(Cli::try_parse_from(["tabrecon", "snapshot"]).is_err());
}

#[test]
fn test_cli_tolerance_must_be_numeric() {
    assert!(Cli::try_parse_from([
        "tabrecon",
        "compare",
        "a.csv",
        "b.csv",
        "--tolerance",
        "small"
    ])
    .is_err());
}

#[test]
fn test_output_format_parsing() {
    assert_eq!(OutputFormat::parse("console").unwrap(), OutputFormat::Pretty);
    assert_eq!(OutputFormat::parse("Json").unwrap(), OutputFormat::Json);
    assert!(OutputFormat::parse("xml").is_err());
}
