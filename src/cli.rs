//! Command-line interface for tabrecon

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabrecon")]
#[command(about = "Reconcile internal and fund tabular datasets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare two data files
    Compare {
        /// Internal dataset (A)
        file_a: PathBuf,

        /// Fund dataset (B)
        file_b: PathBuf,

        /// Encoding of file A: utf-8, latin-1, iso-8859-1, cp1252 (default: detect)
        #[arg(long)]
        encoding_a: Option<String>,

        /// Encoding of file B (default: detect)
        #[arg(long)]
        encoding_b: Option<String>,

        /// Delimiter of file A: a single character or "tab" (default: detect)
        #[arg(long)]
        delimiter_a: Option<String>,

        /// Delimiter of file B (default: detect)
        #[arg(long)]
        delimiter_b: Option<String>,

        #[command(flatten)]
        options: ComparisonArgs,
    },

    /// Extract the internal dataset with a SQL file and compare it to a fund file
    CompareWithInternal {
        /// Fund dataset (B)
        fund_file: PathBuf,

        /// SQL file producing the internal dataset (A)
        #[arg(long)]
        query: PathBuf,

        /// Query parameter substituted for {name} placeholders (repeatable)
        #[arg(long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Also write the internal dataset to CSV (default path under the reports directory)
        #[arg(long, num_args = 0..=1, value_name = "PATH")]
        export_internal: Option<Option<PathBuf>>,

        /// Encoding of the fund file (default: detect)
        #[arg(long)]
        encoding: Option<String>,

        /// Delimiter of the fund file (default: detect)
        #[arg(long)]
        delimiter: Option<String>,

        #[command(flatten)]
        options: ComparisonArgs,
    },

    /// Write a sample comparison configuration file
    CreateConfig {
        /// Destination path
        #[arg(default_value = "config/comparison_config.json")]
        path: PathBuf,
    },

    /// Show structure and detected format of a data file
    Info {
        /// Data file to inspect
        file: PathBuf,

        #[arg(long)]
        encoding: Option<String>,

        #[arg(long)]
        delimiter: Option<String>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// List generated reports
    Reports {
        #[arg(long, default_value = crate::reports::DEFAULT_REPORTS_DIR)]
        reports_dir: PathBuf,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },
}

/// Options shared by the comparison commands
#[derive(Args, Debug, Clone)]
pub struct ComparisonArgs {
    /// Comparison mode: "full" (alias "keyed"), "schema", "statistical", "subset"
    #[arg(long, default_value = "full")]
    pub mode: String,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Comma-separated key columns (overrides the configuration file)
    #[arg(long)]
    pub key_columns: Option<String>,

    /// Comma-separated columns to drop before comparing
    #[arg(long)]
    pub ignore_columns: Option<String>,

    /// Compare text case-insensitively
    #[arg(long)]
    pub ignore_case: bool,

    /// Keep leading and trailing whitespace in text values
    #[arg(long)]
    pub keep_whitespace: bool,

    /// Absolute tolerance for numeric equality
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Output format: "console", "json"
    #[arg(long, default_value = "console")]
    pub format: String,

    /// Write the JSON report to this path
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write the JSON report under the reports directory
    #[arg(long)]
    pub save_report: bool,

    /// Export keyed differences to CSV (default path under the reports directory)
    #[arg(long, num_args = 0..=1, value_name = "PATH")]
    pub export_differences: Option<Option<PathBuf>>,

    /// Keep every difference record in JSON output
    #[arg(long)]
    pub full_differences: bool,

    #[arg(long, default_value = crate::reports::DEFAULT_REPORTS_DIR)]
    pub reports_dir: PathBuf,
}

/// Parse output format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" | "console" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid output format: {}. Use 'console' or 'json'",
                s
            )),
        }
    }
}
