#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report generation.
//!
//! Projects the aggregation and clustering results into flat files: CSV
//! tables for counts and per-facility attribution, and JSON documents for
//! cluster summaries and per-district assignments. JSON files are written
//! to a `.tmp` sibling first and renamed into place.

pub mod clusters;
pub mod counts;

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

pub use clusters::{write_cluster_info, write_district_clusters};
pub use counts::{write_aggregation_summary, write_district_counts, write_facility_assignments};

/// Output file for per-district counts.
pub const OUTPUT_DISTRICT_COUNTS: &str = "district_facility_counts.csv";

/// Output file for per-facility district attribution.
pub const OUTPUT_FACILITIES: &str = "facilities_with_district.csv";

/// Output file for the aggregation summary.
pub const OUTPUT_AGGREGATION_SUMMARY: &str = "aggregation_summary.json";

/// Output file for cluster summaries.
pub const OUTPUT_CLUSTER_INFO: &str = "cluster_info.json";

/// Output file for per-district cluster assignments.
pub const OUTPUT_DISTRICT_CLUSTERS: &str = "district_clusters.json";

/// Errors from writing reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// File system failure.
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// CSV serialization failure.
    #[error("Failed to write CSV {}: {source}", .path.display())]
    Csv {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: csv::Error,
    },
    /// JSON serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Creates `dir` and its parents if missing.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if the directory cannot be created.
pub fn ensure_dir(dir: &Path) -> Result<(), ReportError> {
    std::fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// Writes `value` as pretty JSON to `dir/name` through a `.tmp` file.
///
/// # Errors
///
/// Returns [`ReportError`] if serialization or any file operation fails.
pub fn write_json<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> Result<PathBuf, ReportError> {
    ensure_dir(dir)?;

    let path = dir.join(name);
    let tmp_path = dir.join(format!("{name}.tmp"));
    let contents = serde_json::to_string_pretty(value)?;

    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ReportError::Io { path, source }
    };
    std::fs::write(&tmp_path, contents).map_err(io_error(&tmp_path))?;
    std::fs::rename(&tmp_path, &path).map_err(io_error(&path))?;

    log::info!("Wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
pub(crate) fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pet_map_generate_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}
