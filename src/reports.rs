//! Layout of the reports directory and listing of generated files

use crate::engine::ComparisonMode;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DEFAULT_REPORTS_DIR: &str = "reports";

/// The reports directory and its three subdirectories
#[derive(Debug, Clone)]
pub struct ReportsLayout {
    pub root: PathBuf,
    /// Comparison reports (JSON)
    pub comparisons_dir: PathBuf,
    /// Internal datasets exported to CSV
    pub exports_dir: PathBuf,
    /// Per-field difference exports (CSV)
    pub differences_dir: PathBuf,
}

impl ReportsLayout {
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            comparisons_dir: root.join("comparisons"),
            exports_dir: root.join("data_exports"),
            differences_dir: root.join("differences"),
            root,
        }
    }

    /// Create the directory tree if it does not exist yet
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.comparisons_dir, &self.exports_dir, &self.differences_dir] {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
                log::debug!("Created {}", dir.display());
            }
        }
        Ok(())
    }

    /// `comparisons/comparison_<mode>_<a>_vs_<b>_<timestamp>.<ext>`
    pub fn comparison_path(&self, mode: ComparisonMode, a: &Path, b: &Path, ext: &str) -> PathBuf {
        self.comparisons_dir.join(format!(
            "comparison_{}_{}_vs_{}_{}.{}",
            mode.as_str(),
            file_label(a),
            file_label(b),
            timestamp(),
            ext
        ))
    }

    /// `differences/differences_<a>_vs_<b>_<timestamp>.csv`
    pub fn differences_path(&self, a: &Path, b: &Path) -> PathBuf {
        self.differences_dir.join(format!(
            "differences_{}_vs_{}_{}.csv",
            file_label(a),
            file_label(b),
            timestamp()
        ))
    }

    /// `data_exports/<name>_<timestamp>.csv`
    pub fn export_path(&self, name: &str) -> PathBuf {
        self.exports_dir
            .join(format!("{}_{}.csv", name, timestamp()))
    }

    /// List every generated file, sorted by path
    pub fn list(&self) -> Result<Vec<ReportFile>> {
        let mut files = Vec::new();
        if !self.root.exists() {
            return Ok(files);
        }

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let metadata = entry.metadata()?;
            let category = entry
                .path()
                .parent()
                .and_then(|p| p.strip_prefix(&self.root).ok())
                .map(|p| p.display().to_string())
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| ".".to_string());

            files.push(ReportFile {
                path: entry.path().to_path_buf(),
                category,
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }
        Ok(files)
    }

    pub fn stats(&self) -> Result<ReportsStats> {
        let mut stats = ReportsStats::default();
        for file in self.list()? {
            let path = file.path.as_path();
            if path.starts_with(&self.comparisons_dir) {
                stats.comparison_count += 1;
            } else if path.starts_with(&self.exports_dir) {
                stats.export_count += 1;
            } else if path.starts_with(&self.differences_dir) {
                stats.difference_count += 1;
            }
            stats.total_size += file.size;
        }
        Ok(stats)
    }
}

/// A generated report file
#[derive(Debug, Clone, Serialize)]
pub struct ReportFile {
    pub path: PathBuf,
    pub category: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ReportsStats {
    pub comparison_count: usize,
    pub export_count: usize,
    pub difference_count: usize,
    pub total_size: u64,
}

fn timestamp() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

/// File stem reduced to characters safe in a file name
fn file_label(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("data");
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
