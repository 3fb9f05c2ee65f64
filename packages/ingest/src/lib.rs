#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Facility ingestion.
//!
//! Reads each configured source file, resolves its coordinate and name
//! columns, converts coordinates to WGS84, and produces classified
//! [`FacilityPoint`]s. Bad records are skipped and counted per reason; they
//! never abort the run.

pub mod fields;
pub mod read;

use std::path::PathBuf;
use std::sync::Arc;

use pet_map_facility_models::FacilityPoint;
use pet_map_geography::{CoordinateTransformer, TransformError};
use pet_map_geography_models::{BoundingBox, Crs};
use pet_map_ingest_models::{IngestReport, SkippedRecords, SourceDefinition, SourceReport};
use pet_map_spatial::progress::ProgressCallback;
use thiserror::Error;

use crate::fields::Coordinate;

/// Errors that abort ingestion of a source.
#[derive(Debug, Error)]
pub enum IngestError {
    /// File could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Malformed CSV.
    #[error("Invalid CSV in {}: {source}", .path.display())]
    Csv {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: csv::Error,
    },
    /// Malformed JSON.
    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// CSV file has no usable header row.
    #[error("CSV file {} has no header row", .path.display())]
    NoHeader {
        /// File path.
        path: PathBuf,
    },
    /// JSON file is neither an array nor a `documents` wrapper.
    #[error("JSON file {} does not contain a list of records", .path.display())]
    NotRecordList {
        /// File path.
        path: PathBuf,
    },
    /// No candidate column for a required field exists in the file.
    #[error("No column for '{field}' in {} (tried {candidates:?})", .path.display())]
    UnresolvedField {
        /// File path.
        path: PathBuf,
        /// Canonical field name.
        field: &'static str,
        /// Column names that were tried.
        candidates: Vec<String>,
    },
    /// The source CRS could not be set up.
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Points and per-source statistics from an ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    /// Every accepted point, in source then record order.
    pub points: Vec<FacilityPoint>,
    /// Per-source statistics.
    pub report: IngestReport,
}

/// Reads every source in order.
///
/// # Errors
///
/// Returns the first [`IngestError`] raised by any source.
pub fn load_sources(
    sources: &[SourceDefinition],
    bounds: Option<&BoundingBox>,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<IngestOutcome, IngestError> {
    let mut outcome = IngestOutcome::default();
    progress.set_total(sources.len() as u64);

    for source in sources {
        progress.set_message(source.label());
        let (points, report) = load_source(source, bounds)?;
        outcome.points.extend(points);
        outcome.report.sources.push(report);
        progress.inc(1);
    }

    progress.finish(format!(
        "Ingested {} points from {} sources ({} skipped)",
        outcome.report.points(),
        sources.len(),
        outcome.report.skipped().total()
    ));

    Ok(outcome)
}

/// Reads one source file.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read or parsed, a
/// coordinate column is missing, or the source CRS is unusable.
pub fn load_source(
    source: &SourceDefinition,
    bounds: Option<&BoundingBox>,
) -> Result<(Vec<FacilityPoint>, SourceReport), IngestError> {
    let records = read::read_records(&source.path, source.format)?;
    normalize_records(source, &records, bounds)
}

/// Turns raw records into points.
///
/// # Errors
///
/// See [`load_source`].
pub fn normalize_records(
    source: &SourceDefinition,
    records: &[serde_json::Value],
    bounds: Option<&BoundingBox>,
) -> Result<(Vec<FacilityPoint>, SourceReport), IngestError> {
    let columns = fields::resolve(&source.fields, &fields::available_columns(records), &source.path)?;
    if columns.name.is_none() {
        log::warn!("[{}] No name column found, names will be empty", source.label());
    }

    let transformer = CoordinateTransformer::new(source.crs.clone(), Crs::Wgs84)?;
    let mut skipped = SkippedRecords::default();
    let mut points = Vec::with_capacity(records.len());

    for (row, record) in records.iter().enumerate() {
        let (x, y) = match (
            fields::coordinate(record, &columns.x),
            fields::coordinate(record, &columns.y),
        ) {
            (Coordinate::Value(x), Coordinate::Value(y)) => (x, y),
            (Coordinate::Missing, _) | (_, Coordinate::Missing) => {
                skipped.missing_coordinate += 1;
                continue;
            }
            _ => {
                skipped.unparseable_coordinate += 1;
                continue;
            }
        };

        let (longitude, latitude) = match transformer.transform(x, y) {
            Ok(lon_lat) => lon_lat,
            Err(e) => {
                log::debug!("[{}] Skipping row {row}: {e}", source.label());
                skipped.invalid_coordinate += 1;
                continue;
            }
        };

        if let Some(bbox) = bounds
            && !bbox.contains(longitude, latitude)
        {
            skipped.out_of_bounds += 1;
            continue;
        }

        let id = columns
            .id
            .as_deref()
            .and_then(|f| fields::text(record, f))
            .unwrap_or_else(|| format!("{}-{row}", source.facility_type));
        let name = columns
            .name
            .as_deref()
            .and_then(|f| fields::text(record, f))
            .unwrap_or_default();

        points.push(FacilityPoint {
            id,
            name,
            longitude,
            latitude,
            facility_type: source.facility_type,
        });
    }

    if skipped.total() > 0 {
        log::warn!(
            "[{}] Skipped {} of {} records (missing {}, unparseable {}, invalid {}, out of bounds {})",
            source.label(),
            skipped.total(),
            records.len(),
            skipped.missing_coordinate,
            skipped.unparseable_coordinate,
            skipped.invalid_coordinate,
            skipped.out_of_bounds
        );
    }
    log::info!("[{}] Loaded {} points", source.label(), points.len());

    let report = SourceReport {
        path: source.path.clone(),
        facility_type: source.facility_type,
        fields: columns,
        records_read: records.len() as u64,
        points: points.len() as u64,
        skipped,
    };

    Ok((points, report))
}
