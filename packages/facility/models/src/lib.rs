#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Facility type taxonomy and classified point types.
//!
//! Every ingestion source classifies its records into one of the
//! [`FacilityType`] variants. Counting is keyed by the enum rather than by
//! free-form strings, so a [`FacilityCounts`] always carries an entry for
//! every type, even when that entry is zero.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The kind of pet facility a point represents.
///
/// Parsing accepts both the canonical English names and the Korean labels
/// used in the Busan municipal data sets.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
pub enum FacilityType {
    /// Veterinary hospital.
    #[strum(to_string = "hospital", serialize = "동물병원", serialize = "vet_hospital")]
    Hospital,
    /// Dog café.
    #[strum(to_string = "cafe", serialize = "애견카페", serialize = "dog_cafe")]
    Cafe,
    /// Public park.
    #[strum(to_string = "park", serialize = "공원")]
    Park,
}

impl FacilityType {
    /// Number of facility types. Feature vectors have this many dimensions.
    pub const COUNT: usize = 3;

    /// Returns all variants in feature-vector order (hospital, cafe, park).
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Hospital, Self::Cafe, Self::Park]
    }
}

/// A facility that has been classified and placed in geographic
/// (longitude/latitude, WGS84) coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityPoint {
    /// Identifier from the source, or a synthesized `"<type>-<row>"` id.
    pub id: String,
    /// Display name of the facility.
    pub name: String,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Facility classification.
    pub facility_type: FacilityType,
}

/// Per-type facility counters.
///
/// One field per [`FacilityType`] variant, so a missing entry cannot be
/// represented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityCounts {
    /// Veterinary hospitals.
    pub hospital: u64,
    /// Dog cafés.
    pub cafe: u64,
    /// Parks.
    pub park: u64,
}

impl FacilityCounts {
    /// Returns the count for one facility type.
    #[must_use]
    pub const fn get(&self, facility_type: FacilityType) -> u64 {
        match facility_type {
            FacilityType::Hospital => self.hospital,
            FacilityType::Cafe => self.cafe,
            FacilityType::Park => self.park,
        }
    }

    /// Adds one to the counter for `facility_type`.
    pub const fn increment(&mut self, facility_type: FacilityType) {
        match facility_type {
            FacilityType::Hospital => self.hospital += 1,
            FacilityType::Cafe => self.cafe += 1,
            FacilityType::Park => self.park += 1,
        }
    }

    /// Sum over every facility type.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.hospital + self.cafe + self.park
    }

    /// Returns `true` if every counter is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Iterates `(type, count)` pairs in feature-vector order.
    pub fn iter(&self) -> impl Iterator<Item = (FacilityType, u64)> + '_ {
        FacilityType::all().iter().map(|t| (*t, self.get(*t)))
    }

    /// Counts as a feature vector `[hospital, cafe, park]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn to_vector(&self) -> [f64; FacilityType::COUNT] {
        [self.hospital as f64, self.cafe as f64, self.park as f64]
    }
}

impl std::ops::AddAssign for FacilityCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.hospital += rhs.hospital;
        self.cafe += rhs.cafe;
        self.park += rhs.park;
    }
}

impl<'a> FromIterator<&'a FacilityPoint> for FacilityCounts {
    fn from_iter<I: IntoIterator<Item = &'a FacilityPoint>>(iter: I) -> Self {
        let mut counts = Self::default();
        for point in iter {
            counts.increment(point.facility_type);
        }
        counts
    }
}
