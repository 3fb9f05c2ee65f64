//! Per-dimension standardization on top of `linfa-preprocessing`.

use linfa::prelude::*;
use linfa_preprocessing::linear_scaling::LinearScaler;
use ndarray::{Array1, Array2, Axis};
use pet_map_analytics_models::{DIMENSIONS, Vector};

use crate::ClusterError;

/// Spreads at or below this are treated as constant.
const ZERO_SPREAD: f64 = 1e-12;

/// Stacks feature vectors into an `n x DIMENSIONS` matrix.
#[must_use]
pub fn to_records(data: &[Vector]) -> Array2<f64> {
    Array2::from_shape_fn((data.len(), DIMENSIONS), |(i, d)| data[i][d])
}

/// Zero-mean, unit-variance scaling fitted on a data set.
///
/// Uses the population standard deviation. A dimension with zero spread
/// standardizes to exactly `0` for every value, so it contributes nothing
/// to distances.
pub struct StandardScaler {
    inner: LinearScaler<f64>,
    constant: [bool; DIMENSIONS],
}

impl StandardScaler {
    /// Fits the scaler on the rows of `records`.
    ///
    /// # Errors
    ///
    /// * [`ClusterError::Scaling`] if `records` has no rows
    pub fn fit(records: &Array2<f64>) -> Result<Self, ClusterError> {
        let dataset = Dataset::new(records.clone(), Array1::<usize>::zeros(records.nrows()));
        let inner = LinearScaler::standard().fit(&dataset)?;

        let spread = records.std_axis(Axis(0), 0.0);
        let constant = std::array::from_fn(|d| spread[d] <= ZERO_SPREAD);

        Ok(Self { inner, constant })
    }

    /// Standardizes every row.
    #[must_use]
    pub fn transform(&self, records: &Array2<f64>) -> Array2<f64> {
        let mut scaled = self.inner.transform(records.clone());
        for (d, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            if self.constant[d] {
                column.fill(0.0);
            }
        }
        scaled
    }

    /// Maps a standardized vector back to count units.
    #[must_use]
    pub fn inverse_transform(&self, v: &Vector) -> Vector {
        let offsets = self.inner.offsets();
        let scales = self.inner.scales();
        std::array::from_fn(|d| {
            if self.constant[d] {
                offsets[d]
            } else {
                v[d] / scales[d] + offsets[d]
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaler(data: &[Vector]) -> (StandardScaler, Array2<f64>) {
        let records = to_records(data);
        let scaler = StandardScaler::fit(&records).unwrap();
        let scaled = scaler.transform(&records);
        (scaler, scaled)
    }

    #[test]
    fn standardizes_to_zero_mean_unit_variance() {
        let (_, scaled) = scaler(&[[1.0, 10.0, 0.0], [3.0, 20.0, 4.0], [5.0, 30.0, 8.0]]);

        for column in scaled.axis_iter(Axis(1)) {
            let mean = column.mean().unwrap();
            let std = column.std(0.0);
            assert!(mean.abs() < 1e-9, "mean {mean}");
            assert!((std - 1.0).abs() < 1e-9, "std {std}");
        }
    }

    #[test]
    fn constant_dimension_maps_to_zero() {
        let (scaler, scaled) = scaler(&[[0.1, 7.0, 1.0], [0.1, 7.0, 2.0], [0.1, 7.0, 3.0]]);

        for row in scaled.rows() {
            assert!(row[0].abs() < f64::EPSILON);
            assert!(row[1].abs() < f64::EPSILON);
        }

        let back = scaler.inverse_transform(&[0.0, 0.0, 0.0]);
        assert!((back[0] - 0.1).abs() < 1e-12);
        assert!((back[1] - 7.0).abs() < 1e-12);
        assert!((back[2] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn inverse_transform_recovers_rows() {
        let data = [[2.0, 0.0, 9.0], [4.0, 1.0, 3.0], [9.0, 5.0, 6.0]];
        let (scaler, scaled) = scaler(&data);

        for (row, original) in scaled.rows().into_iter().zip(&data) {
            let back = scaler.inverse_transform(&[row[0], row[1], row[2]]);
            for d in 0..DIMENSIONS {
                assert!((back[d] - original[d]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn empty_records_are_rejected() {
        let err = StandardScaler::fit(&to_records(&[])).err().unwrap();
        assert!(matches!(err, ClusterError::Scaling(_)));
    }
}
