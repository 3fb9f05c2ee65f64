//! Per-district facility counting.
//!
//! Every known district appears in the output, including those with no
//! facilities at all, so downstream clustering sees every spatial unit.
//! Points outside every district are counted in a separate unassigned
//! bucket rather than dropped.

use std::sync::Arc;

use pet_map_facility_models::{FacilityCounts, FacilityPoint, FacilityType};
use pet_map_geography_models::{AssignedFacility, DistrictAggregation, DistrictFacilityCounts};

use crate::progress::ProgressCallback;
use crate::{DistrictIndex, SpatialError};

/// Counts `points` per district and facility type.
#[must_use]
pub fn aggregate(
    points: &[FacilityPoint],
    index: &DistrictIndex,
    progress: &Arc<dyn ProgressCallback>,
) -> DistrictAggregation {
    let mut counts = vec![FacilityCounts::default(); index.len()];
    let mut unassigned = FacilityCounts::default();
    let mut assignments = Vec::with_capacity(points.len());

    for joined in index.bulk_join(points, progress) {
        match joined.position {
            Some(position) => counts[position].increment(joined.point.facility_type),
            None => unassigned.increment(joined.point.facility_type),
        }

        assignments.push(AssignedFacility {
            point: joined.point.clone(),
            district: joined.district.map(pet_map_geography::DistrictBoundary::district),
        });
    }

    let districts = index
        .boundaries()
        .iter()
        .zip(counts)
        .map(|(boundary, counts)| DistrictFacilityCounts {
            district_code: boundary.code.clone(),
            district_name: boundary.name.clone(),
            counts,
        })
        .collect::<Vec<_>>();

    let with_facilities = districts.iter().filter(|d| !d.counts.is_empty()).count();
    log::info!(
        "Aggregated {} points into {} districts ({with_facilities} with facilities, {} unassigned)",
        points.len(),
        districts.len(),
        unassigned.total()
    );

    DistrictAggregation {
        districts,
        unassigned,
        assignments,
    }
}

/// Checks that every input point is accounted for exactly once: for each
/// facility type, district counts plus the unassigned bucket must equal the
/// number of input points of that type.
///
/// # Errors
///
/// Returns [`SpatialError::Reconciliation`] for the first facility type
/// whose totals disagree.
pub fn reconcile(aggregation: &DistrictAggregation, points: &[FacilityPoint]) -> Result<(), SpatialError> {
    let input: FacilityCounts = points.iter().collect();
    let accounted = aggregation.totals();

    for &facility_type in FacilityType::all() {
        if input.get(facility_type) != accounted.get(facility_type) {
            return Err(SpatialError::Reconciliation {
                facility_type,
                input: input.get(facility_type),
                accounted: accounted.get(facility_type),
            });
        }
    }

    if aggregation.assignments.len() != points.len() {
        log::warn!(
            "Assignment list has {} entries for {} points",
            aggregation.assignments.len(),
            points.len()
        );
    }

    Ok(())
}
