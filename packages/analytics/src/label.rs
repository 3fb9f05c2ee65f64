use pet_map_analytics_models::{Centroid, LabelThresholds, ProfileType};

/// Display colors, cycled by cluster id.
pub const PALETTE: &[&str] = &[
    "#FF5733", "#33FF57", "#3357FF", "#FF33A8", "#FFD700", "#33CFFF", "#E533FF",
];

/// Color for a cluster id.
#[must_use]
pub fn cluster_color(cluster_id: usize) -> &'static str {
    PALETTE[cluster_id % PALETTE.len()]
}

/// Labels a centroid. Rules are checked top to bottom; the first match
/// wins.
#[must_use]
pub fn label_centroid(centroid: &Centroid, thresholds: &LabelThresholds) -> ProfileType {
    let many_hospitals = centroid.hospital > thresholds.hospital_high;
    let many_parks = centroid.park > thresholds.park_high;

    if many_hospitals && many_parks {
        ProfileType::Comprehensive
    } else if many_hospitals {
        ProfileType::MedicalFocused
    } else if many_parks {
        ProfileType::LeisureFocused
    } else if centroid.cafe > thresholds.cafe_low {
        ProfileType::CafeCulture
    } else {
        ProfileType::Basic
    }
}
