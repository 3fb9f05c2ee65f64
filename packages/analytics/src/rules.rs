//! Quantile-threshold categorization.

use pet_map_analytics_models::{Centroid, DIMENSIONS, FeatureQuantiles, RuleCategory, Vector};

/// Linear-interpolation quantile of `values` (position `(n - 1) * q` in
/// sorted order). Returns `0` for an empty slice.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - position.floor();

    fraction.mul_add(sorted[upper] - sorted[lower], sorted[lower])
}

/// p50/p75/p90 of every dimension.
#[must_use]
pub fn feature_quantiles(data: &[Vector]) -> FeatureQuantiles {
    let at = |q: f64| -> Centroid {
        let v: Vector = std::array::from_fn(|d| {
            let column: Vec<f64> = data.iter().map(|v| v[d]).collect();
            quantile(&column, q)
        });
        Centroid::from_vector(v)
    };

    FeatureQuantiles {
        p50: at(0.5),
        p75: at(0.75),
        p90: at(0.9),
    }
}

/// Category of one vector against the 75th-percentile thresholds. Rules use
/// `>=` and are checked in [`RuleCategory::all`] order.
#[must_use]
pub fn categorize(v: &Vector, p75: &Centroid) -> RuleCategory {
    let [hospital, cafe, park] = *v;

    if hospital >= p75.hospital && cafe >= p75.cafe && park >= p75.park {
        RuleCategory::Comprehensive
    } else if hospital >= p75.hospital {
        RuleCategory::Medical
    } else if park >= p75.park {
        RuleCategory::Leisure
    } else if cafe >= p75.cafe {
        RuleCategory::Cafe
    } else {
        RuleCategory::Basic
    }
}

/// Mean of the given vectors. Returns the zero vector for an empty set.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_vector<'a>(vectors: impl IntoIterator<Item = &'a Vector>) -> Vector {
    let mut sum = [0.0; DIMENSIONS];
    let mut n = 0usize;
    for v in vectors {
        n += 1;
        for d in 0..DIMENSIONS {
            sum[d] += v[d];
        }
    }

    if n == 0 {
        sum
    } else {
        sum.map(|s| s / n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_interpolates_linearly() {
        let values = [0.0, 0.0, 0.0, 6.0];
        assert!((quantile(&values, 0.75) - 1.5).abs() < 1e-12);
        assert!((quantile(&values, 0.5) - 0.0).abs() < 1e-12);

        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((quantile(&values, 0.9) - 4.6).abs() < 1e-12);
        assert!((quantile(&values, 0.5) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn quantile_ignores_input_order() {
        assert!((quantile(&[5.0, 1.0, 3.0], 0.5) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn first_matching_rule_wins() {
        let p75 = Centroid::from_vector([5.0, 1.0, 7.0]);
        assert_eq!(categorize(&[6.0, 1.0, 8.0], &p75), RuleCategory::Comprehensive);
        assert_eq!(categorize(&[6.0, 0.0, 8.0], &p75), RuleCategory::Medical);
        assert_eq!(categorize(&[4.0, 3.0, 8.0], &p75), RuleCategory::Leisure);
        assert_eq!(categorize(&[4.0, 3.0, 2.0], &p75), RuleCategory::Cafe);
        assert_eq!(categorize(&[4.0, 0.0, 2.0], &p75), RuleCategory::Basic);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let p75 = Centroid::from_vector([5.0, 1.0, 7.0]);
        assert_eq!(categorize(&[5.0, 0.0, 0.0], &p75), RuleCategory::Medical);
    }

    #[test]
    fn mean_of_vectors() {
        let m = mean_vector(&[[2.0, 0.0, 4.0], [4.0, 1.0, 0.0]]);
        assert_eq!(m, [3.0, 0.5, 2.0]);
        assert_eq!(mean_vector(&[]), [0.0; DIMENSIONS]);
    }
}
