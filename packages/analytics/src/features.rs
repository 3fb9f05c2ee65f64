use pet_map_analytics_models::DistrictFeatureVector;
use pet_map_geography_models::DistrictFacilityCounts;

/// Builds one raw `(hospital, cafe, park)` vector per district, in input
/// order. No scaling is applied.
#[must_use]
pub fn build_features(counts: &[DistrictFacilityCounts]) -> Vec<DistrictFeatureVector> {
    counts
        .iter()
        .map(|d| DistrictFeatureVector {
            district_code: d.district_code.clone(),
            district_name: d.district_name.clone(),
            vector: d.counts.to_vector(),
        })
        .collect()
}
