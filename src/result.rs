//! Comparison results and their flattening into plain JSON sections

use crate::config::ComparisonConfig;
use crate::dataset::DatasetMetadata;
use crate::engine::ComparisonMode;
use crate::keyed_diff::KeyedReport;
use crate::schema_diff::SchemaReport;
use crate::stats_diff::StatisticalReport;
use crate::subset_check::SubsetReport;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// An ordered map of primitive JSON values, the shape renderers consume
pub type Section = IndexMap<String, serde_json::Value>;

/// Flattens a mode-specific report into the three generic result sections
pub trait ReportSections {
    /// Headline metrics (counts, percentages, flags)
    fn summary(&self) -> Section;

    /// Mode-specific structured detail
    fn differences(&self) -> Section;

    /// Aggregate numbers; only the statistical report fills this
    fn statistics(&self) -> Section {
        Section::new()
    }
}

/// Build a section from `(key, value)` pairs
pub(crate) fn section<I, K, V>(entries: I) -> Section
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<serde_json::Value>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// The typed report produced by whichever strategy ran
#[derive(Debug, Clone)]
pub enum ComparisonOutcome {
    Schema(SchemaReport),
    Keyed(KeyedReport),
    Statistical(StatisticalReport),
    Subset(SubsetReport),
}

impl ComparisonOutcome {
    fn sections(&self) -> &dyn ReportSections {
        match self {
            ComparisonOutcome::Schema(report) => report,
            ComparisonOutcome::Keyed(report) => report,
            ComparisonOutcome::Statistical(report) => report,
            ComparisonOutcome::Subset(report) => report,
        }
    }
}

/// Echoed context for a comparison
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonMetadata {
    pub dataset_a: DatasetMetadata,
    pub dataset_b: DatasetMetadata,
    pub comparison_config: ComparisonConfig,
    pub compared_at: DateTime<Utc>,
}

/// Immutable output of one comparison call
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    mode: ComparisonMode,
    outcome: ComparisonOutcome,
    metadata: ComparisonMetadata,
}

impl ComparisonResult {
    pub(crate) fn new(
        mode: ComparisonMode,
        outcome: ComparisonOutcome,
        metadata: ComparisonMetadata,
    ) -> Self {
        Self {
            mode,
            outcome,
            metadata,
        }
    }

    pub fn mode(&self) -> ComparisonMode {
        self.mode
    }

    pub fn outcome(&self) -> &ComparisonOutcome {
        &self.outcome
    }

    pub fn metadata(&self) -> &ComparisonMetadata {
        &self.metadata
    }

    pub fn summary(&self) -> Section {
        self.outcome.sections().summary()
    }

    pub fn differences(&self) -> Section {
        self.outcome.sections().differences()
    }

    pub fn statistics(&self) -> Section {
        self.outcome.sections().statistics()
    }

    pub fn schema(&self) -> Option<&SchemaReport> {
        match &self.outcome {
            ComparisonOutcome::Schema(report) => Some(report),
            _ => None,
        }
    }

    pub fn keyed(&self) -> Option<&KeyedReport> {
        match &self.outcome {
            ComparisonOutcome::Keyed(report) => Some(report),
            _ => None,
        }
    }

    pub fn statistical(&self) -> Option<&StatisticalReport> {
        match &self.outcome {
            ComparisonOutcome::Statistical(report) => Some(report),
            _ => None,
        }
    }

    pub fn subset(&self) -> Option<&SubsetReport> {
        match &self.outcome {
            ComparisonOutcome::Subset(report) => Some(report),
            _ => None,
        }
    }
}

impl Serialize for ComparisonResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ComparisonResult", 5)?;
        state.serialize_field("mode", &self.mode)?;
        state.serialize_field("summary", &self.summary())?;
        state.serialize_field("differences", &self.differences())?;
        state.serialize_field("statistics", &self.statistics())?;
        state.serialize_field("metadata", &self.metadata)?;
        state.end()
    }
}

/// Share of `part` in `whole` as a percentage; 0 when `whole` is 0
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
