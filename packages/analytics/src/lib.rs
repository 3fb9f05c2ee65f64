#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! District profiling.
//!
//! Turns per-district facility counts into feature vectors and groups the
//! districts either with standardized k-means (`linfa-clustering`) or with
//! fixed quantile rules. Both strategies label their clusters with the same centroid decision
//! tree ([`label::label_centroid`]).

pub mod features;
pub mod kmeans;
pub mod label;
pub mod rules;
pub mod scale;
pub mod silhouette;

use std::collections::BTreeSet;

use linfa_clustering::KMeansError;
use linfa_preprocessing::PreprocessingError;
use pet_map_analytics_models::{
    Centroid, ClusterSummary, ClusteringConfig, ClusteringResult, ClusteringStrategy,
    DistrictClusterAssignment, DistrictFeatureVector, LabelThresholds, RuleCategory, Vector,
};
use thiserror::Error;

pub use features::build_features;

use crate::kmeans::KMeansSettings;
use crate::label::{cluster_color, label_centroid};
use crate::scale::StandardScaler;

/// Errors from the clustering stage.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Fewer districts than requested clusters.
    #[error("Need at least {required} districts to cluster, found {available}")]
    InsufficientData {
        /// Minimum number of districts.
        required: usize,
        /// Number of districts supplied.
        available: usize,
    },
    /// A clustering parameter is out of range.
    #[error("Invalid clustering configuration: {0}")]
    InvalidConfig(String),
    /// The feature matrix could not be standardized.
    #[error(transparent)]
    Scaling(#[from] PreprocessingError),
    /// The k-means model failed to fit.
    #[error(transparent)]
    KMeans(#[from] KMeansError),
}

/// Clusters `features` with the strategy in `config`.
///
/// Every input district appears in exactly one cluster, and `assignments`
/// follows input order.
///
/// # Errors
///
/// * [`ClusterError::InsufficientData`] if there are no districts, or fewer
///   districts than `k` for k-means
/// * [`ClusterError::InvalidConfig`] if `k`, `n_init`, or `max_iter` is zero
/// * [`ClusterError::Scaling`] or [`ClusterError::KMeans`] if the k-means
///   model cannot be fitted
pub fn cluster_districts(
    features: &[DistrictFeatureVector],
    config: &ClusteringConfig,
) -> Result<ClusteringResult, ClusterError> {
    log::info!(
        "Clustering {} districts with {} strategy",
        features.len(),
        config.strategy
    );

    match config.strategy {
        ClusteringStrategy::KMeans => cluster_kmeans(features, config),
        ClusteringStrategy::RuleBased => cluster_rule_based(features, &config.thresholds),
    }
}

fn cluster_kmeans(
    features: &[DistrictFeatureVector],
    config: &ClusteringConfig,
) -> Result<ClusteringResult, ClusterError> {
    if config.k == 0 {
        return Err(ClusterError::InvalidConfig("k must be at least 1".into()));
    }

    if features.len() < config.k {
        return Err(ClusterError::InsufficientData {
            required: config.k,
            available: features.len(),
        });
    }

    let raw: Vec<Vector> = features.iter().map(|f| f.vector).collect();
    let records = scale::to_records(&raw);
    let scaler = StandardScaler::fit(&records)?;
    let scaled = scaler.transform(&records);

    let base = KMeansSettings {
        k: config.k,
        n_init: config.effective_n_init(),
        max_iter: config.max_iter,
        seed: config.seed,
    };

    let (k, silhouette) = match config.explore_max_k {
        Some(max_k) => {
            let scores = silhouette::explore_k(&scaled, max_k, base)?;
            let k = silhouette::best_k(&scores).unwrap_or_else(|| {
                log::warn!(
                    "No evaluable k in 2..={max_k}, falling back to k={}",
                    config.k
                );
                config.k
            });
            log::info!("Selected k={k} by silhouette score");
            (k, scores)
        }
        None => (config.k, Vec::new()),
    };

    let fit = KMeansSettings { k, ..base }.fit(&scaled)?;
    log::info!(
        "k-means k={k}: inertia {:.4} over {} restarts",
        fit.inertia,
        base.n_init
    );

    let centroids: Vec<Centroid> = fit
        .centroids
        .iter()
        .map(|c| Centroid::from_vector(scaler.inverse_transform(c)))
        .collect();

    let clusters = centroids
        .iter()
        .enumerate()
        .map(|(cluster_id, centroid)| {
            summarize(
                cluster_id,
                *centroid,
                members(features, &fit.labels, cluster_id),
                &config.thresholds,
                None,
            )
        })
        .filter(|summary| {
            if summary.member_count == 0 {
                log::warn!("Cluster {} ended up empty, dropping it", summary.cluster_id);
            }
            summary.member_count > 0
        })
        .collect::<Vec<_>>();

    Ok(ClusteringResult {
        strategy: ClusteringStrategy::KMeans,
        k,
        assignments: assign(features, &fit.labels, &clusters),
        clusters,
        inertia: Some(fit.inertia),
        silhouette,
        quantiles: None,
    })
}

fn cluster_rule_based(
    features: &[DistrictFeatureVector],
    thresholds: &LabelThresholds,
) -> Result<ClusteringResult, ClusterError> {
    if features.is_empty() {
        return Err(ClusterError::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    let raw: Vec<Vector> = features.iter().map(|f| f.vector).collect();
    let quantiles = rules::feature_quantiles(&raw);
    log::info!(
        "75th percentiles: hospital={:.2} cafe={:.2} park={:.2}",
        quantiles.p75.hospital,
        quantiles.p75.cafe,
        quantiles.p75.park
    );

    let labels: Vec<usize> = raw
        .iter()
        .map(|v| rules::categorize(v, &quantiles.p75).cluster_id())
        .collect();

    let clusters = RuleCategory::all()
        .iter()
        .filter_map(|&category| {
            let cluster_id = category.cluster_id();
            let codes = members(features, &labels, cluster_id);
            if codes.is_empty() {
                return None;
            }

            let centroid = rules::mean_vector(
                raw.iter()
                    .zip(&labels)
                    .filter(|(_, l)| **l == cluster_id)
                    .map(|(v, _)| v),
            );

            Some(summarize(
                cluster_id,
                Centroid::from_vector(centroid),
                codes,
                thresholds,
                Some(category),
            ))
        })
        .collect::<Vec<_>>();

    Ok(ClusteringResult {
        strategy: ClusteringStrategy::RuleBased,
        k: clusters.len(),
        assignments: assign(features, &labels, &clusters),
        clusters,
        inertia: None,
        silhouette: Vec::new(),
        quantiles: Some(quantiles),
    })
}

fn members(features: &[DistrictFeatureVector], labels: &[usize], cluster_id: usize) -> BTreeSet<String> {
    features
        .iter()
        .zip(labels)
        .filter(|(_, l)| **l == cluster_id)
        .map(|(f, _)| f.district_code.clone())
        .collect()
}

fn summarize(
    cluster_id: usize,
    centroid: Centroid,
    member_district_codes: BTreeSet<String>,
    thresholds: &LabelThresholds,
    rule_category: Option<RuleCategory>,
) -> ClusterSummary {
    ClusterSummary {
        cluster_id,
        centroid: centroid.rounded(),
        member_count: member_district_codes.len(),
        member_district_codes,
        type_label: label_centroid(&centroid, thresholds),
        color: cluster_color(cluster_id).to_string(),
        rule_category,
    }
}

fn assign(
    features: &[DistrictFeatureVector],
    labels: &[usize],
    clusters: &[ClusterSummary],
) -> Vec<DistrictClusterAssignment> {
    features
        .iter()
        .zip(labels)
        .filter_map(|(f, &cluster_id)| {
            let cluster = clusters.iter().find(|c| c.cluster_id == cluster_id)?;
            Some(DistrictClusterAssignment {
                district_code: f.district_code.clone(),
                district_name: f.district_name.clone(),
                vector: f.vector,
                cluster_id,
                type_label: cluster.type_label,
                color: cluster.color.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pet_map_analytics_models::ProfileType;

    use super::*;

    fn feature(code: &str, vector: Vector) -> DistrictFeatureVector {
        DistrictFeatureVector {
            district_code: code.to_string(),
            district_name: format!("{code}동"),
            vector,
        }
    }

    fn kmeans_config(k: usize) -> ClusteringConfig {
        ClusteringConfig {
            k,
            ..ClusteringConfig::default()
        }
    }

    fn sample() -> Vec<DistrictFeatureVector> {
        let mut out = Vec::new();
        for i in 0..6 {
            let i = f64::from(i);
            out.push(feature(&format!("H{i}"), [12.0 + i, 1.0, 2.0]));
            out.push(feature(&format!("P{i}"), [1.0, 0.0, 15.0 + i]));
            out.push(feature(&format!("B{i}"), [0.0, i % 2.0, 0.0]));
        }
        out
    }

    fn assert_partition(features: &[DistrictFeatureVector], result: &ClusteringResult) {
        let mut seen = BTreeSet::new();
        for cluster in &result.clusters {
            for code in &cluster.member_district_codes {
                assert!(seen.insert(code.clone()), "{code} in two clusters");
            }
            assert_eq!(cluster.member_count, cluster.member_district_codes.len());
        }
        let all: BTreeSet<_> = features.iter().map(|f| f.district_code.clone()).collect();
        assert_eq!(seen, all);
        assert_eq!(result.assignments.len(), features.len());
    }

    #[test]
    fn three_orthogonal_districts_form_singleton_clusters() {
        let features = vec![
            feature("A", [10.0, 0.0, 0.0]),
            feature("B", [0.0, 10.0, 0.0]),
            feature("C", [0.0, 0.0, 10.0]),
        ];
        let result = cluster_districts(&features, &kmeans_config(3)).unwrap();

        assert_eq!(result.clusters.len(), 3);
        for cluster in &result.clusters {
            assert_eq!(cluster.member_count, 1);
            let code = cluster.member_district_codes.iter().next().unwrap();
            let input = features.iter().find(|f| &f.district_code == code).unwrap();
            let centroid = cluster.centroid.to_vector();
            for d in 0..3 {
                assert!(
                    (centroid[d] - input.vector[d]).abs() < 1e-6,
                    "{code}: {centroid:?} != {:?}",
                    input.vector
                );
            }
        }
        assert_partition(&features, &result);
    }

    #[test]
    fn kmeans_is_deterministic_for_fixed_seed() {
        let features = sample();
        let a = cluster_districts(&features, &kmeans_config(3)).unwrap();
        let b = cluster_districts(&features, &kmeans_config(3)).unwrap();
        assert_eq!(a, b);
        assert_partition(&features, &a);
    }

    #[test]
    fn kmeans_labels_profiles_from_centroids() {
        let features = sample();
        let result = cluster_districts(&features, &kmeans_config(3)).unwrap();

        let hospital_cluster = result
            .assignments
            .iter()
            .find(|a| a.district_code == "H0")
            .unwrap();
        assert_eq!(hospital_cluster.type_label, ProfileType::MedicalFocused);

        let park_cluster = result
            .assignments
            .iter()
            .find(|a| a.district_code == "P0")
            .unwrap();
        assert_eq!(park_cluster.type_label, ProfileType::LeisureFocused);
    }

    #[test]
    fn identical_districts_do_not_crash() {
        let features = (0..5).map(|i| feature(&format!("D{i}"), [2.0, 2.0, 2.0])).collect::<Vec<_>>();
        let result = cluster_districts(&features, &kmeans_config(2)).unwrap();

        assert_partition(&features, &result);
        for cluster in &result.clusters {
            assert!(cluster.member_count > 0);
            assert_eq!(cluster.centroid.to_vector(), [2.0, 2.0, 2.0]);
        }
    }

    #[test]
    fn zero_variance_dimension_does_not_dominate() {
        let features = vec![
            feature("A", [0.0, 5.0, 0.0]),
            feature("B", [0.1, 5.0, 0.0]),
            feature("C", [10.0, 5.0, 0.0]),
            feature("D", [10.1, 5.0, 0.0]),
        ];
        let result = cluster_districts(&features, &kmeans_config(2)).unwrap();
        let label = |code: &str| {
            result
                .assignments
                .iter()
                .find(|a| a.district_code == code)
                .unwrap()
                .cluster_id
        };
        assert_eq!(label("A"), label("B"));
        assert_eq!(label("C"), label("D"));
        assert_ne!(label("A"), label("C"));
    }

    #[test]
    fn fewer_districts_than_k_is_insufficient() {
        let features = vec![feature("A", [1.0, 0.0, 0.0]), feature("B", [0.0, 1.0, 0.0])];
        let err = cluster_districts(&features, &kmeans_config(5)).unwrap_err();
        assert!(matches!(
            err,
            ClusterError::InsufficientData {
                required: 5,
                available: 2
            }
        ));
    }

    #[test]
    fn zero_k_is_invalid() {
        let features = vec![feature("A", [1.0, 0.0, 0.0])];
        let err = cluster_districts(&features, &kmeans_config(0)).unwrap_err();
        assert!(matches!(err, ClusterError::InvalidConfig(_)));
    }

    #[test]
    fn explore_selects_k_and_reports_scores() {
        let features = sample();
        let config = ClusteringConfig {
            explore_max_k: Some(5),
            ..kmeans_config(5)
        };
        let result = cluster_districts(&features, &config).unwrap();

        assert!(!result.silhouette.is_empty());
        assert!(result.silhouette.iter().all(|s| (2..=5).contains(&s.k)));
        assert!(result.silhouette.iter().any(|s| s.k == result.k));
        assert!((2..=5).contains(&result.k));
        assert_partition(&features, &result);
    }

    #[test]
    fn explore_falls_back_to_configured_k() {
        let features = vec![feature("A", [1.0, 0.0, 0.0]), feature("B", [0.0, 1.0, 0.0])];
        let config = ClusteringConfig {
            explore_max_k: Some(4),
            ..kmeans_config(2)
        };
        let result = cluster_districts(&features, &config).unwrap();
        assert!(result.silhouette.is_empty());
        assert_eq!(result.k, 2);
    }

    #[test]
    fn rule_based_labels_high_hospital_and_park_district_comprehensive() {
        let features = vec![
            feature("TOP", [6.0, 0.0, 8.0]),
            feature("Z1", [0.0, 0.0, 0.0]),
            feature("Z2", [0.0, 0.0, 0.0]),
            feature("Z3", [0.0, 0.0, 0.0]),
        ];
        let config = ClusteringConfig {
            strategy: ClusteringStrategy::RuleBased,
            ..ClusteringConfig::default()
        };
        let result = cluster_districts(&features, &config).unwrap();

        let top = result
            .clusters
            .iter()
            .find(|c| c.member_district_codes.contains("TOP"))
            .unwrap();
        assert_eq!(top.rule_category, Some(RuleCategory::Comprehensive));
        assert_eq!(top.type_label, ProfileType::Comprehensive);
        assert_eq!(top.centroid.to_vector(), [6.0, 0.0, 8.0]);

        // A zero café p75 means every district meets the café rule.
        let rest = result
            .clusters
            .iter()
            .find(|c| c.member_district_codes.contains("Z1"))
            .unwrap();
        assert_eq!(rest.rule_category, Some(RuleCategory::Cafe));
        assert_eq!(rest.type_label, ProfileType::Basic);
        assert_eq!(rest.member_count, 3);

        assert_eq!(result.k, 2);
        assert_partition(&features, &result);
    }

    #[test]
    fn rule_based_labels_centroid_above_label_thresholds_comprehensive() {
        let features = vec![
            feature("TOP", [6.0, 0.0, 8.0]),
            feature("EDGE", [5.0, 1.0, 7.0]),
            feature("CAFE", [0.0, 2.0, 0.0]),
            feature("Z1", [0.0, 0.0, 0.0]),
            feature("Z2", [0.0, 0.0, 0.0]),
        ];
        let config = ClusteringConfig {
            strategy: ClusteringStrategy::RuleBased,
            ..ClusteringConfig::default()
        };
        let result = cluster_districts(&features, &config).unwrap();

        let p75 = result.quantiles.as_ref().unwrap().p75;
        assert_eq!(p75.to_vector(), [5.0, 1.0, 7.0]);

        let top = result
            .assignments
            .iter()
            .find(|a| a.district_code == "TOP")
            .unwrap();
        assert_eq!(top.type_label, ProfileType::Comprehensive);

        // TOP misses the café p75, so the rules file it as medical, but its
        // cluster centroid still clears both label thresholds.
        let cluster = result
            .clusters
            .iter()
            .find(|c| c.cluster_id == top.cluster_id)
            .unwrap();
        assert_eq!(cluster.rule_category, Some(RuleCategory::Medical));
        assert_eq!(cluster.centroid.to_vector(), [6.0, 0.0, 8.0]);

        // Sitting exactly on every p75 meets the >= rule.
        let edge = result
            .clusters
            .iter()
            .find(|c| c.member_district_codes.contains("EDGE"))
            .unwrap();
        assert_eq!(edge.rule_category, Some(RuleCategory::Comprehensive));
        assert_eq!(edge.type_label, ProfileType::Basic);

        assert_partition(&features, &result);
    }

    #[test]
    fn rule_based_uses_fixed_ids_and_colors() {
        let features = sample();
        let config = ClusteringConfig {
            strategy: ClusteringStrategy::RuleBased,
            ..ClusteringConfig::default()
        };
        let result = cluster_districts(&features, &config).unwrap();

        for cluster in &result.clusters {
            let category = cluster.rule_category.unwrap();
            assert_eq!(cluster.cluster_id, category.cluster_id());
            assert_eq!(cluster.color, cluster_color(cluster.cluster_id));
        }
        assert!(result.quantiles.is_some());
        assert_partition(&features, &result);
    }

    #[test]
    fn rule_based_rejects_empty_input() {
        let config = ClusteringConfig {
            strategy: ClusteringStrategy::RuleBased,
            ..ClusteringConfig::default()
        };
        let err = cluster_districts(&[], &config).unwrap_err();
        assert!(matches!(err, ClusterError::InsufficientData { .. }));
    }
}
