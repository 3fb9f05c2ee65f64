#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative district types and per-district facility counts.
//!
//! These types describe the districts (행정동) points are attributed to and
//! the count tables produced by the spatial join. Geometry itself lives in
//! `pet_map_geography`; this crate only carries serializable metadata.

pub mod crs;

use std::path::PathBuf;

use pet_map_facility_models::{FacilityCounts, FacilityPoint, FacilityType};
use serde::{Deserialize, Serialize};

pub use crs::{AreaOfUse, Crs, UnknownCrsError};

/// Where district boundaries come from and how to read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundarySource {
    /// Path to a `GeoJSON` `FeatureCollection` of district polygons.
    pub path: PathBuf,
    /// Feature property holding the unique district code.
    #[serde(default = "default_code_field")]
    pub code_field: String,
    /// Feature property holding the district display name.
    #[serde(default = "default_name_field")]
    pub name_field: String,
    /// Only keep districts whose code starts with this prefix (e.g. `"26"`
    /// for Busan).
    #[serde(default)]
    pub code_prefix: Option<String>,
    /// CRS the polygon coordinates are written in. Non-geographic sources
    /// are reprojected to WGS84 on load.
    #[serde(default)]
    pub crs: Crs,
}

fn default_code_field() -> String {
    "ADM_CD".to_string()
}

fn default_name_field() -> String {
    "ADM_NM".to_string()
}

/// A longitude/latitude rectangle, inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western edge.
    pub min_lon: f64,
    /// Southern edge.
    pub min_lat: f64,
    /// Eastern edge.
    pub max_lon: f64,
    /// Northern edge.
    pub max_lat: f64,
}

impl BoundingBox {
    /// Returns `true` if the coordinate lies inside or on the box.
    #[must_use]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        (self.min_lon..=self.max_lon).contains(&lon) && (self.min_lat..=self.max_lat).contains(&lat)
    }
}

/// Identity of a district without its geometry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct District {
    /// Unique administrative code (e.g. `"2611051000"`).
    pub code: String,
    /// Display name (e.g. `"중앙동"`).
    pub name: String,
}

/// Facility counts for one district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictFacilityCounts {
    /// District code.
    pub district_code: String,
    /// District name.
    pub district_name: String,
    /// Per-type counts. All-zero for districts with no facilities.
    pub counts: FacilityCounts,
}

/// A facility together with the district it was attributed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedFacility {
    /// The input point.
    pub point: FacilityPoint,
    /// Containing district, or `None` if the point fell outside every
    /// boundary.
    pub district: Option<District>,
}

/// Output of the spatial aggregation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictAggregation {
    /// One entry per known district, in boundary store order, including
    /// districts with zero facilities.
    pub districts: Vec<DistrictFacilityCounts>,
    /// Points that matched no district, by type.
    pub unassigned: FacilityCounts,
    /// Every input point with its resolved district, in input order.
    pub assignments: Vec<AssignedFacility>,
}

impl DistrictAggregation {
    /// Sum of district counts, excluding the unassigned bucket.
    #[must_use]
    pub fn assigned_totals(&self) -> FacilityCounts {
        let mut totals = FacilityCounts::default();
        for district in &self.districts {
            totals += district.counts;
        }
        totals
    }

    /// Sum of district counts plus the unassigned bucket. Equals the per-type
    /// input totals for a complete aggregation.
    #[must_use]
    pub fn totals(&self) -> FacilityCounts {
        let mut totals = self.assigned_totals();
        totals += self.unassigned;
        totals
    }

    /// Number of points that fell outside every district.
    #[must_use]
    pub const fn unassigned_total(&self) -> u64 {
        self.unassigned.total()
    }

    /// Looks up the counts for a district code.
    #[must_use]
    pub fn district(&self, code: &str) -> Option<&DistrictFacilityCounts> {
        self.districts.iter().find(|d| d.district_code == code)
    }

    /// Count of `facility_type` in district `code`, or `None` for unknown
    /// districts.
    #[must_use]
    pub fn count(&self, code: &str, facility_type: FacilityType) -> Option<u64> {
        self.district(code).map(|d| d.counts.get(facility_type))
    }
}
