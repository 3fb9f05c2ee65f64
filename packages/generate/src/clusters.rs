//! Cluster JSON documents.

use std::path::{Path, PathBuf};

use pet_map_analytics_models::{
    ClusterSummary, ClusteringResult, ClusteringStrategy, DistrictClusterAssignment,
    FeatureQuantiles, SilhouetteScore,
};
use serde::Serialize;

use crate::{OUTPUT_CLUSTER_INFO, OUTPUT_DISTRICT_CLUSTERS, ReportError};

/// Contents of `cluster_info.json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInfo<'a> {
    /// Algorithm used.
    pub strategy: ClusteringStrategy,
    /// Number of clusters.
    pub k: usize,
    /// k-means inertia.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inertia: Option<f64>,
    /// Exploration scores.
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub silhouette: &'a [SilhouetteScore],
    /// Rule-based quantiles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantiles: Option<&'a FeatureQuantiles>,
    /// Cluster summaries.
    pub clusters: &'a [ClusterSummary],
}

impl<'a> From<&'a ClusteringResult> for ClusterInfo<'a> {
    fn from(result: &'a ClusteringResult) -> Self {
        Self {
            strategy: result.strategy,
            k: result.k,
            inertia: result.inertia,
            silhouette: &result.silhouette,
            quantiles: result.quantiles.as_ref(),
            clusters: &result.clusters,
        }
    }
}

/// Writes `cluster_info.json`.
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be written.
pub fn write_cluster_info(dir: &Path, result: &ClusteringResult) -> Result<PathBuf, ReportError> {
    crate::write_json(dir, OUTPUT_CLUSTER_INFO, &ClusterInfo::from(result))
}

/// Writes `district_clusters.json`: one entry per district, in input order.
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be written.
pub fn write_district_clusters(dir: &Path, result: &ClusteringResult) -> Result<PathBuf, ReportError> {
    let assignments: &[DistrictClusterAssignment] = &result.assignments;
    crate::write_json(dir, OUTPUT_DISTRICT_CLUSTERS, assignments)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pet_map_analytics_models::{Centroid, ProfileType};

    use super::*;
    use crate::test_dir;

    fn result() -> ClusteringResult {
        ClusteringResult {
            strategy: ClusteringStrategy::KMeans,
            k: 1,
            clusters: vec![ClusterSummary {
                cluster_id: 0,
                centroid: Centroid::from_vector([6.0, 0.5, 8.0]),
                member_count: 1,
                member_district_codes: BTreeSet::from(["2611051000".to_string()]),
                type_label: ProfileType::Comprehensive,
                color: "#FF5733".into(),
                rule_category: None,
            }],
            assignments: vec![DistrictClusterAssignment {
                district_code: "2611051000".into(),
                district_name: "중앙동".into(),
                vector: [6.0, 0.5, 8.0],
                cluster_id: 0,
                type_label: ProfileType::Comprehensive,
                color: "#FF5733".into(),
            }],
            inertia: Some(0.0),
            silhouette: Vec::new(),
            quantiles: None,
        }
    }

    #[test]
    fn cluster_info_shape() {
        let dir = test_dir("cluster_info");
        let path = write_cluster_info(&dir, &result()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(json["strategy"], "k_means");
        assert_eq!(
            json["clusters"][0]["typeLabel"],
            "comprehensive infrastructure"
        );
        assert_eq!(json["clusters"][0]["centroid"]["park"], 8.0);
        assert!(json.get("silhouette").is_none());
        assert!(json.get("quantiles").is_none());
    }

    #[test]
    fn district_clusters_is_a_list() {
        let dir = test_dir("district_clusters");
        let path = write_district_clusters(&dir, &result()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

        let list = json.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["districtName"], "중앙동");
        assert_eq!(list[0]["color"], "#FF5733");
    }
}
