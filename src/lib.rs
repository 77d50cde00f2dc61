//! # tabrecon
//!
//! Reconciliation of two tabular datasets, an "internal" source and an external
//! "fund" source, under four comparison modes: schema, full (keyed),
//! statistical and subset.

pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod export;
pub mod hash;
pub mod keyed_diff;
pub mod output;
pub mod preprocess;
pub mod progress;
pub mod reports;
pub mod result;
pub mod schema_diff;
pub mod sql;
pub mod stats_diff;
pub mod subset_check;

pub use config::ComparisonConfig;
pub use dataset::{ColumnType, DatasetMetadata, TabularDataset, Value};
pub use engine::{compare, ComparisonEngine, ComparisonMode};
pub use error::{Result, TabreconError};
pub use result::{ComparisonResult, ReportSections, Section};

/// Version stamped into JSON reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
