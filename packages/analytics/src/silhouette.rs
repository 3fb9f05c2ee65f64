//! Silhouette scoring and silhouette-driven `k` selection.

use std::collections::BTreeSet;

use linfa::Dataset;
use linfa::metrics::SilhouetteScore as _;
use ndarray::{Array1, Array2};
use pet_map_analytics_models::SilhouetteScore;

use crate::ClusterError;
use crate::kmeans::KMeansSettings;

/// Mean silhouette coefficient of a labeling, using Euclidean distance.
///
/// Returns `None` unless there are between 2 and `n - 1` distinct labels,
/// or when the score is not a finite number.
#[must_use]
pub fn silhouette_score(records: &Array2<f64>, labels: &[usize]) -> Option<f64> {
    let populated = labels.iter().collect::<BTreeSet<_>>().len();
    if populated < 2 || populated >= records.nrows() {
        return None;
    }

    let dataset = Dataset::new(records.clone(), Array1::from(labels.to_vec()));
    dataset
        .silhouette_score()
        .ok()
        .filter(|score: &f64| score.is_finite())
}

/// Runs `base` for every `k` in `2..=max_k` (capped at `n - 1`) and scores
/// each labeling.
///
/// # Errors
///
/// Propagates [`ClusterError`] from the k-means fits.
pub fn explore_k(
    records: &Array2<f64>,
    max_k: usize,
    base: KMeansSettings,
) -> Result<Vec<SilhouetteScore>, ClusterError> {
    let upper = max_k.min(records.nrows().saturating_sub(1));
    let mut scores = Vec::new();

    for k in 2..=upper {
        let fit = KMeansSettings { k, ..base }.fit(records)?;
        if let Some(score) = silhouette_score(records, &fit.labels) {
            log::info!("k={k}: silhouette {score:.3}");
            scores.push(SilhouetteScore { k, score });
        }
    }

    Ok(scores)
}

/// Highest-scoring `k`. Ties go to the smaller `k`.
#[must_use]
pub fn best_k(scores: &[SilhouetteScore]) -> Option<usize> {
    scores
        .iter()
        .fold(None::<&SilhouetteScore>, |best, s| match best {
            Some(b) if b.score >= s.score => Some(b),
            _ => Some(s),
        })
        .map(|s| s.k)
}
