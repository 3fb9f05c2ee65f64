#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! District profiling types: feature vectors, clustering configuration, and
//! cluster results.
//!
//! Cluster ids are not stable across runs. Callers that need a stable
//! identity should key on [`ProfileType`], which is derived from the
//! cluster centroid alone.

use std::collections::BTreeSet;

use pet_map_facility_models::FacilityType;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Number of feature dimensions, in `(hospital, cafe, park)` order.
pub const DIMENSIONS: usize = FacilityType::COUNT;

/// A feature vector in `(hospital, cafe, park)` order.
pub type Vector = [f64; DIMENSIONS];

/// Raw per-district facility counts, ready for clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictFeatureVector {
    /// District code.
    pub district_code: String,
    /// District display name.
    pub district_name: String,
    /// Counts as `(hospital, cafe, park)`.
    pub vector: Vector,
}

/// Human-readable profile of a cluster, derived from its centroid.
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
pub enum ProfileType {
    /// Many hospitals and many parks.
    #[strum(to_string = "comprehensive infrastructure")]
    #[serde(rename = "comprehensive infrastructure")]
    Comprehensive,
    /// Many hospitals.
    #[strum(to_string = "medical-focused")]
    #[serde(rename = "medical-focused")]
    MedicalFocused,
    /// Many parks.
    #[strum(to_string = "leisure-focused")]
    #[serde(rename = "leisure-focused")]
    LeisureFocused,
    /// At least a few dog cafés.
    #[strum(to_string = "café-culture")]
    #[serde(rename = "café-culture")]
    CafeCulture,
    /// None of the above.
    #[strum(to_string = "basic infrastructure")]
    #[serde(rename = "basic infrastructure")]
    Basic,
}

/// Quantile-based categories used by [`ClusteringStrategy::RuleBased`].
///
/// Declaration order is rule evaluation order: a district matching several
/// rules falls into the first one.
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
#[strum(serialize_all = "snake_case")]
pub enum RuleCategory {
    /// Every dimension at or above its 75th percentile.
    Comprehensive,
    /// Hospitals at or above the 75th percentile.
    Medical,
    /// Parks at or above the 75th percentile.
    Leisure,
    /// Cafés at or above the 75th percentile.
    Cafe,
    /// Everything else.
    Basic,
}

impl RuleCategory {
    /// All categories in rule evaluation order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Comprehensive,
            Self::Medical,
            Self::Leisure,
            Self::Cafe,
            Self::Basic,
        ]
    }

    /// Cluster id reported for this category.
    #[must_use]
    pub const fn cluster_id(self) -> usize {
        match self {
            Self::Comprehensive => 0,
            Self::Medical => 1,
            Self::Leisure => 2,
            Self::Cafe => 3,
            Self::Basic => 4,
        }
    }
}

/// Centroid thresholds for [`ProfileType`] labeling. Comparisons are
/// strict (`>`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelThresholds {
    /// Hospital count above which a centroid is medical.
    pub hospital_high: f64,
    /// Park count above which a centroid is leisure.
    pub park_high: f64,
    /// Café count above which a centroid is café-culture.
    pub cafe_low: f64,
}

impl Default for LabelThresholds {
    fn default() -> Self {
        Self {
            hospital_high: 5.0,
            park_high: 7.0,
            cafe_low: 1.0,
        }
    }
}

/// Which clustering algorithm to run.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClusteringStrategy {
    /// Standardized Lloyd's k-means with k-means++ restarts.
    #[default]
    KMeans,
    /// Fixed categories from per-dimension 75th percentiles.
    RuleBased,
}

/// Minimum number of k-means restarts.
pub const MIN_N_INIT: usize = 10;

/// Clustering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Algorithm to run.
    pub strategy: ClusteringStrategy,
    /// Number of clusters for k-means.
    pub k: usize,
    /// Base seed for k-means initialization.
    pub seed: u64,
    /// Number of k-means restarts. Values below [`MIN_N_INIT`] are raised
    /// to it.
    pub n_init: usize,
    /// Iteration cap per restart.
    pub max_iter: usize,
    /// When set, `k` is chosen by silhouette score over `2..=explore_max_k`.
    pub explore_max_k: Option<usize>,
    /// Centroid labeling thresholds.
    pub thresholds: LabelThresholds,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            strategy: ClusteringStrategy::default(),
            k: 5,
            seed: 42,
            n_init: MIN_N_INIT,
            max_iter: 300,
            explore_max_k: None,
            thresholds: LabelThresholds::default(),
        }
    }
}

impl ClusteringConfig {
    /// Restart count actually used.
    #[must_use]
    pub fn effective_n_init(&self) -> usize {
        self.n_init.max(MIN_N_INIT)
    }
}

/// A centroid in original count units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    /// Mean hospital count.
    pub hospital: f64,
    /// Mean café count.
    pub cafe: f64,
    /// Mean park count.
    pub park: f64,
}

impl Centroid {
    /// Builds a centroid from a `(hospital, cafe, park)` vector.
    #[must_use]
    pub const fn from_vector(v: Vector) -> Self {
        Self {
            hospital: v[0],
            cafe: v[1],
            park: v[2],
        }
    }

    /// Returns the `(hospital, cafe, park)` vector.
    #[must_use]
    pub const fn to_vector(self) -> Vector {
        [self.hospital, self.cafe, self.park]
    }

    /// Rounds every component to one decimal place.
    #[must_use]
    pub fn rounded(self) -> Self {
        let round = |v: f64| (v * 10.0).round() / 10.0;
        Self {
            hospital: round(self.hospital),
            cafe: round(self.cafe),
            park: round(self.park),
        }
    }
}

/// Summary of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    /// Cluster id. Not stable across runs.
    pub cluster_id: usize,
    /// Centroid in count units, rounded to one decimal.
    pub centroid: Centroid,
    /// Number of member districts.
    pub member_count: usize,
    /// Codes of member districts.
    pub member_district_codes: BTreeSet<String>,
    /// Profile derived from the unrounded centroid.
    pub type_label: ProfileType,
    /// Display color.
    pub color: String,
    /// Quantile category, for rule-based results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_category: Option<RuleCategory>,
}

/// Cluster membership of one district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictClusterAssignment {
    /// District code.
    pub district_code: String,
    /// District display name.
    pub district_name: String,
    /// Raw `(hospital, cafe, park)` counts.
    pub vector: Vector,
    /// Cluster id.
    pub cluster_id: usize,
    /// Profile of the cluster.
    pub type_label: ProfileType,
    /// Display color of the cluster.
    pub color: String,
}

/// Per-dimension quantiles of the raw feature vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureQuantiles {
    /// 50th percentile.
    pub p50: Centroid,
    /// 75th percentile.
    pub p75: Centroid,
    /// 90th percentile.
    pub p90: Centroid,
}

/// Silhouette score for one candidate `k`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SilhouetteScore {
    /// Candidate cluster count.
    pub k: usize,
    /// Mean silhouette coefficient.
    pub score: f64,
}

/// Output of a clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringResult {
    /// Algorithm that produced the result.
    pub strategy: ClusteringStrategy,
    /// Number of clusters requested (k-means) or produced (rule-based).
    pub k: usize,
    /// Clusters in id order. Rule-based results omit empty categories.
    pub clusters: Vec<ClusterSummary>,
    /// One entry per input district, in input order.
    pub assignments: Vec<DistrictClusterAssignment>,
    /// Final within-cluster sum of squares in standardized space.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inertia: Option<f64>,
    /// Scores evaluated during `k` exploration.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub silhouette: Vec<SilhouetteScore>,
    /// Quantiles used by rule-based clustering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantiles: Option<FeatureQuantiles>,
}
