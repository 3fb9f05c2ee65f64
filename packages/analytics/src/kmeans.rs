//! Seeded k-means over standardized feature matrices, backed by
//! `linfa-clustering`.

use std::collections::BTreeSet;

use linfa::prelude::*;
use linfa_clustering::{KMeans, KMeansInit};
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2, ArrayView1};
use pet_map_analytics_models::Vector;
use rand::SeedableRng as _;
use rand::rngs::StdRng;

use crate::ClusterError;

/// k-means parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KMeansSettings {
    /// Number of clusters.
    pub k: usize,
    /// Number of k-means++ restarts. The lowest-inertia one is kept.
    pub n_init: usize,
    /// Iteration cap per restart.
    pub max_iter: usize,
    /// Seed for the restart RNG.
    pub seed: u64,
}

/// Result of a k-means fit.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// Cluster index of every input row.
    pub labels: Vec<usize>,
    /// Cluster centroids, in the same space as the input.
    pub centroids: Vec<Vector>,
    /// Within-cluster sum of squared distances.
    pub inertia: f64,
}

impl KMeansSettings {
    /// Clusters the rows of `records`.
    ///
    /// When the data has fewer distinct rows than `k`, seeding falls back to
    /// random row picks since k-means++ has no positive weights left to
    /// sample from.
    ///
    /// # Errors
    ///
    /// * [`ClusterError::InvalidConfig`] if `k`, `n_init`, or `max_iter` is
    ///   zero
    /// * [`ClusterError::InsufficientData`] if `records` has fewer than `k`
    ///   rows
    /// * [`ClusterError::KMeans`] if the model fails to fit
    pub fn fit(&self, records: &Array2<f64>) -> Result<KMeansFit, ClusterError> {
        if self.k == 0 {
            return Err(ClusterError::InvalidConfig("k must be at least 1".into()));
        }
        if self.n_init == 0 || self.max_iter == 0 {
            return Err(ClusterError::InvalidConfig(
                "n_init and max_iter must be at least 1".into(),
            ));
        }
        if records.nrows() < self.k {
            return Err(ClusterError::InsufficientData {
                required: self.k,
                available: records.nrows(),
            });
        }

        let init = if distinct_rows(records) < self.k {
            log::debug!("Fewer distinct districts than k={}, seeding randomly", self.k);
            KMeansInit::Random
        } else {
            KMeansInit::KMeansPlusPlus
        };

        let dataset = Dataset::new(records.clone(), Array1::<usize>::zeros(records.nrows()));
        let model = KMeans::params_with(self.k, StdRng::seed_from_u64(self.seed), L2Dist)
            .n_runs(self.n_init)
            .max_n_iterations(u64::try_from(self.max_iter).unwrap_or(u64::MAX))
            .init_method(init)
            .fit(&dataset)?;

        let labels: Array1<usize> = model.predict(records);
        let centroids: Vec<Vector> = model.centroids().rows().into_iter().map(to_vector).collect();

        let inertia = records
            .rows()
            .into_iter()
            .zip(&labels)
            .map(|(row, &l)| squared_distance(&to_vector(row), &centroids[l]))
            .sum();

        Ok(KMeansFit {
            labels: labels.to_vec(),
            centroids,
            inertia,
        })
    }
}

fn to_vector(row: ArrayView1<'_, f64>) -> Vector {
    std::array::from_fn(|d| row[d])
}

fn squared_distance(a: &Vector, b: &Vector) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn distinct_rows(records: &Array2<f64>) -> usize {
    records
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|v| (v + 0.0).to_bits()).collect::<Vec<_>>())
        .collect::<BTreeSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use crate::scale::to_records;

    use super::*;

    fn kmeans(k: usize) -> KMeansSettings {
        KMeansSettings {
            k,
            n_init: 10,
            max_iter: 300,
            seed: 42,
        }
    }

    fn blobs() -> Array2<f64> {
        let mut data = Vec::new();
        for (cx, cy, cz) in [(0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (0.0, 10.0, 10.0)] {
            for i in 0..5 {
                let jitter = f64::from(i) * 0.1;
                data.push([cx + jitter, cy - jitter, cz + jitter / 2.0]);
            }
        }
        to_records(&data)
    }

    #[test]
    fn separates_three_blobs() {
        let fit = kmeans(3).fit(&blobs()).unwrap();
        for group in fit.labels.chunks(5) {
            assert!(group.iter().all(|&l| l == group[0]), "{group:?}");
        }
        let distinct: BTreeSet<_> = fit.labels.iter().collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn same_seed_gives_same_result() {
        let data = blobs();
        let a = kmeans(4).fit(&data).unwrap();
        let b = kmeans(4).fit(&data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn repeated_rows_fall_back_to_random_seeding() {
        let data = to_records(&[
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
        ]);
        assert_eq!(distinct_rows(&data), 2);

        let fit = kmeans(3).fit(&data).unwrap();
        assert_eq!(fit.labels.len(), 5);
        assert!(fit.labels.iter().all(|&l| l < 3));
        assert!(fit.labels[..4].iter().all(|&l| l == fit.labels[0]));
    }

    #[test]
    fn k_equal_to_n_gives_singletons() {
        let data = to_records(&[[10.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]]);
        let fit = kmeans(3).fit(&data).unwrap();
        let distinct: BTreeSet<_> = fit.labels.iter().collect();
        assert_eq!(distinct.len(), 3);
        assert!(fit.inertia.abs() < 1e-12);
    }

    #[test]
    fn rejects_too_few_points() {
        let err = kmeans(3).fit(&to_records(&[[1.0, 2.0, 3.0]])).unwrap_err();
        assert!(matches!(
            err,
            ClusterError::InsufficientData {
                required: 3,
                available: 1
            }
        ));
    }

    #[test]
    fn rejects_zero_k_and_zero_restarts() {
        let data = to_records(&[[1.0, 2.0, 3.0]]);
        let err = kmeans(0).fit(&data).unwrap_err();
        assert!(matches!(err, ClusterError::InvalidConfig(_)));

        let err = KMeansSettings {
            n_init: 0,
            ..kmeans(1)
        }
        .fit(&data)
        .unwrap_err();
        assert!(matches!(err, ClusterError::InvalidConfig(_)));
    }

    #[test]
    fn more_restarts_never_increase_inertia() {
        let data = blobs();
        let one = KMeansSettings {
            n_init: 1,
            ..kmeans(4)
        }
        .fit(&data)
        .unwrap();
        let many = kmeans(4).fit(&data).unwrap();
        assert!(many.inertia <= one.inertia + 1e-9);
    }
}
