//! Pipeline orchestrator for the pet map toolchain.
//!
//! Chains ingest -> boundary index -> aggregate -> reports, and for
//! `cluster` runs additionally features -> clustering -> cluster reports.
//! Uses `indicatif` progress bars for real-time visual feedback.

use std::path::Path;
use std::time::Instant;

use pet_map_analytics::{ClusterError, build_features, cluster_districts};
use pet_map_analytics_models::{ClusteringConfig, ClusteringResult};
use pet_map_cli_utils::{MultiProgress, StageProgress};
use pet_map_generate::ReportError;
use pet_map_geography::BoundaryLoadError;
use pet_map_geography_models::DistrictAggregation;
use pet_map_ingest::{IngestError, IngestOutcome};
use pet_map_spatial::{DistrictIndex, SpatialError};
use thiserror::Error;

use crate::config::PipelineConfig;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A facility source could not be ingested.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// District boundaries could not be loaded.
    #[error(transparent)]
    Boundaries(#[from] BoundaryLoadError),

    /// Aggregated counts do not add up to the ingested points.
    #[error(transparent)]
    Spatial(#[from] SpatialError),

    /// Clustering could not run.
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    /// A report could not be written.
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Output of the counting stage.
pub struct CountRun {
    /// Ingested points and per-source statistics.
    pub ingest: IngestOutcome,
    /// Per-district counts and per-point assignments.
    pub aggregation: DistrictAggregation,
}

/// Ingests every source, joins the points to district boundaries, checks
/// the count reconciliation and writes the count reports.
///
/// # Errors
///
/// Returns [`PipelineError`] if any stage fails, including a failed
/// reconciliation.
pub fn count(config: &PipelineConfig, multi: &MultiProgress) -> Result<CountRun, PipelineError> {
    let start = Instant::now();

    let source_progress = StageProgress::sources(multi, "Ingesting sources");
    let ingest = pet_map_ingest::load_sources(
        &config.sources,
        config.bounds.as_ref(),
        &source_progress,
    )?;

    let index = DistrictIndex::load(&config.boundaries)?;

    let join_progress = StageProgress::facilities(multi, "Joining facilities to districts");
    let aggregation = pet_map_spatial::aggregate(&ingest.points, &index, &join_progress);
    pet_map_spatial::reconcile(&aggregation, &ingest.points)?;

    let totals = aggregation.totals();
    log::info!(
        "Reconciled {} points: {} assigned, {} outside every district",
        totals.total(),
        aggregation.assigned_totals().total(),
        aggregation.unassigned.total()
    );

    write_count_reports(&config.output_dir, &aggregation, &ingest)?;

    log::info!("Counting finished in {:.1}s", start.elapsed().as_secs_f64());

    Ok(CountRun { ingest, aggregation })
}

fn write_count_reports(
    dir: &Path,
    aggregation: &DistrictAggregation,
    ingest: &IngestOutcome,
) -> Result<(), ReportError> {
    pet_map_generate::write_district_counts(dir, aggregation)?;
    pet_map_generate::write_facility_assignments(dir, aggregation)?;
    pet_map_generate::write_aggregation_summary(dir, aggregation, &ingest.report)?;
    Ok(())
}

/// Runs [`count`], clusters the resulting districts with `clustering` and
/// writes the cluster reports.
///
/// # Errors
///
/// Returns [`PipelineError`] if counting or clustering fails.
pub fn cluster(
    config: &PipelineConfig,
    clustering: &ClusteringConfig,
    multi: &MultiProgress,
) -> Result<ClusteringResult, PipelineError> {
    let run = count(config, multi)?;
    let start = Instant::now();

    let features = build_features(&run.aggregation.districts);
    let result = cluster_districts(&features, clustering)?;

    for summary in &result.clusters {
        log::info!(
            "Cluster {} ({}): {} districts, centroid hospital={} cafe={} park={}",
            summary.cluster_id,
            summary.type_label,
            summary.member_count,
            summary.centroid.hospital,
            summary.centroid.cafe,
            summary.centroid.park
        );
    }

    pet_map_generate::write_cluster_info(&config.output_dir, &result)?;
    pet_map_generate::write_district_clusters(&config.output_dir, &result)?;

    log::info!(
        "Clustered {} districts into {} clusters ({}) in {:.1}s",
        result.assignments.len(),
        result.k,
        result.strategy,
        start.elapsed().as_secs_f64()
    );

    Ok(result)
}
