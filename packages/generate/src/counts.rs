//! Count tables and the aggregation summary.

use std::path::{Path, PathBuf};

use pet_map_facility_models::FacilityCounts;
use pet_map_geography_models::{DistrictAggregation, DistrictFacilityCounts};
use pet_map_ingest_models::{IngestReport, SkippedRecords};
use serde::Serialize;

use crate::{OUTPUT_AGGREGATION_SUMMARY, OUTPUT_DISTRICT_COUNTS, OUTPUT_FACILITIES, ReportError};

/// District label used for facilities outside every boundary.
pub const OUT_OF_BOUNDS: &str = "경계 외";

/// Districts sorted by total facility count (descending), then by code.
#[must_use]
pub fn sorted_by_total(districts: &[DistrictFacilityCounts]) -> Vec<&DistrictFacilityCounts> {
    let mut sorted: Vec<_> = districts.iter().collect();
    sorted.sort_by(|a, b| {
        b.counts
            .total()
            .cmp(&a.counts.total())
            .then_with(|| a.district_code.cmp(&b.district_code))
    });
    sorted
}

fn csv_writer(dir: &Path, name: &str) -> Result<(csv::Writer<std::fs::File>, PathBuf), ReportError> {
    crate::ensure_dir(dir)?;
    let path = dir.join(name);
    let writer = csv::Writer::from_path(&path).map_err(|source| ReportError::Csv {
        path: path.clone(),
        source,
    })?;
    Ok((writer, path))
}

fn finish(mut writer: csv::Writer<std::fs::File>, path: PathBuf) -> Result<PathBuf, ReportError> {
    writer.flush().map_err(|source| ReportError::Io {
        path: path.clone(),
        source,
    })?;
    log::info!("Wrote {}", path.display());
    Ok(path)
}

/// Writes `district_facility_counts.csv`: one row per district, including
/// districts with no facilities.
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be written.
pub fn write_district_counts(dir: &Path, aggregation: &DistrictAggregation) -> Result<PathBuf, ReportError> {
    let (mut writer, path) = csv_writer(dir, OUTPUT_DISTRICT_COUNTS)?;
    let csv_error = |source| ReportError::Csv {
        path: path.clone(),
        source,
    };

    writer
        .write_record(["district_code", "district_name", "hospital", "cafe", "park", "total"])
        .map_err(csv_error)?;

    for d in sorted_by_total(&aggregation.districts) {
        writer
            .write_record([
                d.district_code.clone(),
                d.district_name.clone(),
                d.counts.hospital.to_string(),
                d.counts.cafe.to_string(),
                d.counts.park.to_string(),
                d.counts.total().to_string(),
            ])
            .map_err(csv_error)?;
    }

    finish(writer, path)
}

/// Writes `facilities_with_district.csv`: every input facility with its
/// district, or [`OUT_OF_BOUNDS`].
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be written.
pub fn write_facility_assignments(
    dir: &Path,
    aggregation: &DistrictAggregation,
) -> Result<PathBuf, ReportError> {
    let (mut writer, path) = csv_writer(dir, OUTPUT_FACILITIES)?;
    let csv_error = |source| ReportError::Csv {
        path: path.clone(),
        source,
    };

    writer
        .write_record([
            "id",
            "name",
            "longitude",
            "latitude",
            "facility_type",
            "district_code",
            "district_name",
        ])
        .map_err(csv_error)?;

    for assignment in &aggregation.assignments {
        let p = &assignment.point;
        let (code, name) = assignment
            .district
            .as_ref()
            .map_or(("", OUT_OF_BOUNDS), |d| (d.code.as_str(), d.name.as_str()));

        writer
            .write_record([
                p.id.as_str(),
                p.name.as_str(),
                p.longitude.to_string().as_str(),
                p.latitude.to_string().as_str(),
                p.facility_type.to_string().as_str(),
                code,
                name,
            ])
            .map_err(csv_error)?;
    }

    finish(writer, path)
}

/// Totals written to `aggregation_summary.json`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationSummary {
    /// Number of districts in the boundary store.
    pub districts: usize,
    /// Districts with at least one facility.
    pub districts_with_facilities: usize,
    /// Points per type that entered aggregation.
    pub input: FacilityCounts,
    /// Points per type attributed to a district.
    pub assigned: FacilityCounts,
    /// Points per type outside every district.
    pub unassigned: FacilityCounts,
    /// Source records read during ingestion.
    pub records_read: u64,
    /// Source records that did not become points.
    pub skipped: SkippedRecords,
}

impl AggregationSummary {
    /// Summarizes an aggregation and the ingestion that fed it.
    #[must_use]
    pub fn new(aggregation: &DistrictAggregation, ingest: &IngestReport) -> Self {
        Self {
            districts: aggregation.districts.len(),
            districts_with_facilities: aggregation
                .districts
                .iter()
                .filter(|d| !d.counts.is_empty())
                .count(),
            input: aggregation.totals(),
            assigned: aggregation.assigned_totals(),
            unassigned: aggregation.unassigned,
            records_read: ingest.records_read(),
            skipped: ingest.skipped(),
        }
    }
}

/// Writes `aggregation_summary.json`.
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be written.
pub fn write_aggregation_summary(
    dir: &Path,
    aggregation: &DistrictAggregation,
    ingest: &IngestReport,
) -> Result<PathBuf, ReportError> {
    crate::write_json(
        dir,
        OUTPUT_AGGREGATION_SUMMARY,
        &AggregationSummary::new(aggregation, ingest),
    )
}
