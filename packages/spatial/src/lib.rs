#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index for district attribution.
//!
//! Builds an R-tree over district polygon envelopes and answers
//! point-in-polygon lookups against it. The [`aggregate`] module turns those
//! lookups into per-district facility counts.

pub mod aggregate;
pub mod progress;

use std::sync::Arc;

use geo::BoundingRect;
use pet_map_facility_models::{FacilityPoint, FacilityType};
use pet_map_geography::{BoundaryLoadError, DistrictBoundary, load_boundaries};
use pet_map_geography_models::BoundarySource;
use rstar::{AABB, RTree, RTreeObject};
use thiserror::Error;

use crate::progress::ProgressCallback;

pub use aggregate::{aggregate, reconcile};

/// Errors raised by the spatial aggregation step.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// District counts plus the unassigned bucket do not add up to the
    /// number of input points of a type.
    #[error(
        "Count reconciliation failed for {facility_type}: {input} input points, {accounted} accounted for"
    )]
    Reconciliation {
        /// Facility type whose totals disagree.
        facility_type: FacilityType,
        /// Number of input points of this type.
        input: u64,
        /// District counts plus unassigned count for this type.
        accounted: u64,
    },
}

/// A district envelope stored in the R-tree. Points back into the
/// boundary list so lookups can resolve ties by store order.
struct BoundaryEntry {
    position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Read-only district boundary store with an R-tree index.
///
/// Constructed once per run. Lookups take `&self`, so the index can be
/// shared freely once built.
pub struct DistrictIndex {
    boundaries: Vec<DistrictBoundary>,
    tree: RTree<BoundaryEntry>,
}

/// A point paired with the district that contains it, if any.
#[derive(Debug, Clone, Copy)]
pub struct JoinedPoint<'a> {
    /// The input point.
    pub point: &'a FacilityPoint,
    /// Store position of the containing district. Unique even when two
    /// boundaries share a code.
    pub position: Option<usize>,
    /// Containing district, or `None` when the point fell outside every
    /// boundary.
    pub district: Option<&'a DistrictBoundary>,
}

impl JoinedPoint<'_> {
    /// Code of the containing district.
    #[must_use]
    pub fn district_code(&self) -> Option<&str> {
        self.district.map(|d| d.code.as_str())
    }
}

impl DistrictIndex {
    /// Builds the R-tree over `boundaries`. Store order is the order given.
    #[must_use]
    pub fn new(boundaries: Vec<DistrictBoundary>) -> Self {
        let entries = boundaries
            .iter()
            .enumerate()
            .map(|(position, boundary)| BoundaryEntry {
                position,
                envelope: compute_envelope(boundary),
            })
            .collect();

        let tree = RTree::bulk_load(entries);
        log::info!("Loaded {} districts into spatial index", tree.size());

        Self { boundaries, tree }
    }

    /// Loads boundaries from `source` and indexes them.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryLoadError`] if the boundary source is missing,
    /// malformed, or empty.
    pub fn load(source: &BoundarySource) -> Result<Self, BoundaryLoadError> {
        Ok(Self::new(load_boundaries(source)?))
    }

    /// Number of districts in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    /// Returns `true` if the store has no districts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// All boundaries in store order.
    #[must_use]
    pub fn boundaries(&self) -> &[DistrictBoundary] {
        &self.boundaries
    }

    /// Finds the district containing `(lon, lat)`.
    ///
    /// District sources are assumed not to overlap. If they do, the first
    /// containing district in store order wins.
    #[must_use]
    pub fn find_boundary(&self, lon: f64, lat: f64) -> Option<&DistrictBoundary> {
        self.locate(lon, lat).map(|position| &self.boundaries[position])
    }

    /// Code of the district containing `(lon, lat)`.
    #[must_use]
    pub fn find_containing(&self, lon: f64, lat: f64) -> Option<&str> {
        self.find_boundary(lon, lat).map(|b| b.code.as_str())
    }

    /// Resolves every point's district. The result is index-aligned with
    /// `points`; unmatched points are kept with `district: None`.
    #[must_use]
    pub fn bulk_join<'a>(
        &'a self,
        points: &'a [FacilityPoint],
        progress: &Arc<dyn ProgressCallback>,
    ) -> Vec<JoinedPoint<'a>> {
        progress.set_total(points.len() as u64);

        let joined = points
            .iter()
            .map(|point| {
                let position = self.locate(point.longitude, point.latitude);
                progress.inc(1);
                JoinedPoint {
                    point,
                    position,
                    district: position.map(|p| &self.boundaries[p]),
                }
            })
            .collect::<Vec<_>>();

        let matched = joined.iter().filter(|j| j.district.is_some()).count();
        progress.finish(format!(
            "Joined {} points ({matched} inside a district)",
            points.len()
        ));

        joined
    }

    fn locate(&self, lon: f64, lat: f64) -> Option<usize> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }

        let query_env = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| self.boundaries[entry.position].contains(lon, lat))
            .map(|entry| entry.position)
            .min()
    }
}

/// Compute the bounding box envelope for a district polygon.
fn compute_envelope(boundary: &DistrictBoundary) -> AABB<[f64; 2]> {
    boundary.polygon.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}


#[cfg(test)]
mod tests {
    use pet_map_facility_models::FacilityType;

    use super::test_support::{point, square};
    use super::*;
    use crate::progress::null_progress;

    #[test]
    fn finds_containing_unit_square() {
        let index = DistrictIndex::new(vec![square("A", 0.0, 0.0, 1.0), square("B", 1.0, 0.0, 1.0)]);
        assert_eq!(index.find_containing(0.5, 0.5), Some("A"));
        assert_eq!(index.find_containing(1.5, 0.5), Some("B"));
        assert_eq!(index.find_containing(5.0, 5.0), None);
    }

    #[test]
    fn overlapping_boundaries_resolve_to_first_in_store_order() {
        let index = DistrictIndex::new(vec![
            square("SECOND", 0.0, 0.0, 2.0),
            square("FIRST", 0.5, 0.5, 1.0),
        ]);
        assert_eq!(index.find_containing(1.0, 1.0), Some("SECOND"));

        let index = DistrictIndex::new(vec![
            square("FIRST", 0.5, 0.5, 1.0),
            square("SECOND", 0.0, 0.0, 2.0),
        ]);
        assert_eq!(index.find_containing(1.0, 1.0), Some("FIRST"));
    }

    #[test]
    fn edge_points_are_not_contained() {
        let index = DistrictIndex::new(vec![square("A", 0.0, 0.0, 1.0)]);
        assert_eq!(index.find_containing(0.0, 0.5), None);
    }

    #[test]
    fn non_finite_points_match_nothing() {
        let index = DistrictIndex::new(vec![square("A", 0.0, 0.0, 1.0)]);
        assert_eq!(index.find_containing(f64::NAN, 0.5), None);
    }

    #[test]
    fn bulk_join_keeps_unmatched_points() {
        let index = DistrictIndex::new(vec![square("A", 0.0, 0.0, 1.0)]);
        let points = vec![
            point("in", 0.5, 0.5, FacilityType::Park),
            point("out", 3.0, 3.0, FacilityType::Park),
        ];
        let joined = index.bulk_join(&points, &null_progress());
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].district_code(), Some("A"));
        assert_eq!(joined[0].position, Some(0));
        assert_eq!(joined[1].district_code(), None);
        assert_eq!(joined[1].position, None);
        assert_eq!(joined[1].point.id, "out");
    }

    #[test]
    fn bulk_join_matches_per_point_lookup_on_grid() {
        let mut boundaries = Vec::new();
        for row in 0..10 {
            for col in 0..10 {
                boundaries.push(square(
                    &format!("{row}-{col}"),
                    f64::from(col),
                    f64::from(row),
                    1.0,
                ));
            }
        }
        let index = DistrictIndex::new(boundaries);

        let points: Vec<_> = (0..250)
            .map(|i| {
                let x = f64::from(i % 25).mul_add(0.47, 0.13);
                let y = f64::from(i / 25).mul_add(1.13, 0.21);
                point(&format!("p{i}"), x, y, FacilityType::Hospital)
            })
            .collect();

        let joined = index.bulk_join(&points, &null_progress());
        for j in &joined {
            let linear = index
                .boundaries()
                .iter()
                .find(|b| b.contains(j.point.longitude, j.point.latitude))
                .map(|b| b.code.as_str());
            assert_eq!(j.district_code(), linear, "mismatch for {}", j.point.id);
        }
    }
}
