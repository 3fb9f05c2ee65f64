#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ingestion source definitions and result types.
//!
//! A [`SourceDefinition`] describes one input file: where it is, how it is
//! encoded, which facility type every record in it has, and which columns
//! hold each canonical field. Column lookup is an ordered candidate list
//! resolved once per file.

use std::path::PathBuf;

use pet_map_facility_models::FacilityType;
use pet_map_geography_models::Crs;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// On-disk encoding of a source file.
#[derive(
    Debug,
    Clone,
    Copy,
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
pub enum SourceFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// A JSON array of objects, or an object with a `documents` array
    /// (Kakao local search responses).
    Json,
}

/// Accepted source column names per canonical field, tried in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    /// Record identifier. When no candidate matches, ids are synthesized
    /// as `"<type>-<row>"`.
    pub id: Vec<String>,
    /// Display name.
    pub name: Vec<String>,
    /// Longitude, or easting for projected sources.
    pub x: Vec<String>,
    /// Latitude, or northing for projected sources.
    pub y: Vec<String>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(ToString::to_string).collect();
        Self {
            id: owned(&["id", "ID", "관리번호"]),
            name: owned(&["place_name", "name", "사업장명", "공원명"]),
            x: owned(&["x", "경도", "longitude", "lon", "lng", "X좌표"]),
            y: owned(&["y", "위도", "latitude", "lat", "Y좌표"]),
        }
    }
}

/// One input file of facility records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// File path.
    pub path: PathBuf,
    /// File encoding.
    pub format: SourceFormat,
    /// Type assigned to every record in the file.
    pub facility_type: FacilityType,
    /// CRS of the `x`/`y` columns.
    #[serde(default)]
    pub crs: Crs,
    /// Column candidates.
    #[serde(default)]
    pub fields: FieldMapping,
}

impl SourceDefinition {
    /// Short label for log messages.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.facility_type, self.path.display())
    }
}

/// Column names picked for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFields {
    /// Identifier column, if any candidate was present.
    pub id: Option<String>,
    /// Name column, if any candidate was present.
    pub name: Option<String>,
    /// Longitude/easting column.
    pub x: String,
    /// Latitude/northing column.
    pub y: String,
}

/// Per-reason counts of records that did not become points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRecords {
    /// Coordinate column empty or absent.
    pub missing_coordinate: u64,
    /// Coordinate present but not a number.
    pub unparseable_coordinate: u64,
    /// Coordinate rejected by the transformer.
    pub invalid_coordinate: u64,
    /// Transformed point outside the configured bounding box.
    pub out_of_bounds: u64,
}

impl SkippedRecords {
    /// Sum over every reason.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.missing_coordinate
            + self.unparseable_coordinate
            + self.invalid_coordinate
            + self.out_of_bounds
    }
}

impl std::ops::AddAssign for SkippedRecords {
    fn add_assign(&mut self, rhs: Self) {
        self.missing_coordinate += rhs.missing_coordinate;
        self.unparseable_coordinate += rhs.unparseable_coordinate;
        self.invalid_coordinate += rhs.invalid_coordinate;
        self.out_of_bounds += rhs.out_of_bounds;
    }
}

/// Outcome of reading one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    /// File path.
    pub path: PathBuf,
    /// Facility type of the file.
    pub facility_type: FacilityType,
    /// Columns used.
    pub fields: ResolvedFields,
    /// Records read from the file.
    pub records_read: u64,
    /// Records turned into points.
    pub points: u64,
    /// Records skipped, by reason.
    pub skipped: SkippedRecords,
}

/// Outcome of reading every configured source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// One entry per source, in configuration order.
    pub sources: Vec<SourceReport>,
}

impl IngestReport {
    /// Skipped records summed over every source.
    #[must_use]
    pub fn skipped(&self) -> SkippedRecords {
        let mut total = SkippedRecords::default();
        for source in &self.sources {
            total += source.skipped;
        }
        total
    }

    /// Records read summed over every source.
    #[must_use]
    pub fn records_read(&self) -> u64 {
        self.sources.iter().map(|s| s.records_read).sum()
    }

    /// Points produced summed over every source.
    #[must_use]
    pub fn points(&self) -> u64 {
        self.sources.iter().map(|s| s.points).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_definition_from_toml() {
        let def: SourceDefinition = toml::from_str(
            r#"
            path = "data/vet_hospitals_busan.csv"
            format = "csv"
            facility_type = "hospital"
            crs = "EPSG:5174"

            [fields]
            name = ["사업장명"]
            x = ["좌표정보x(epsg5174)"]
            y = ["좌표정보y(epsg5174)"]
            "#,
        )
        .unwrap();

        assert_eq!(def.format, SourceFormat::Csv);
        assert_eq!(def.facility_type, FacilityType::Hospital);
        assert_eq!(def.crs, Crs::Epsg5174);
        assert_eq!(def.fields.x, vec!["좌표정보x(epsg5174)".to_string()]);
        // Unlisted fields keep their defaults.
        assert!(def.fields.id.contains(&"id".to_string()));
    }

    #[test]
    fn source_definition_defaults_to_wgs84_and_kakao_fields() {
        let def: SourceDefinition = toml::from_str(
            r#"
            path = "data/busan_parks_all.json"
            format = "json"
            facility_type = "park"
            "#,
        )
        .unwrap();

        assert_eq!(def.crs, Crs::Wgs84);
        assert_eq!(def.fields.name[0], "place_name");
        assert_eq!(def.fields.x[0], "x");
    }

    #[test]
    fn skipped_totals_add_up() {
        let report = IngestReport {
            sources: vec![
                SourceReport {
                    path: "a.csv".into(),
                    facility_type: FacilityType::Hospital,
                    fields: ResolvedFields {
                        id: None,
                        name: None,
                        x: "x".into(),
                        y: "y".into(),
                    },
                    records_read: 10,
                    points: 7,
                    skipped: SkippedRecords {
                        missing_coordinate: 2,
                        out_of_bounds: 1,
                        ..SkippedRecords::default()
                    },
                },
                SourceReport {
                    path: "b.json".into(),
                    facility_type: FacilityType::Park,
                    fields: ResolvedFields {
                        id: Some("id".into()),
                        name: Some("place_name".into()),
                        x: "x".into(),
                        y: "y".into(),
                    },
                    records_read: 5,
                    points: 4,
                    skipped: SkippedRecords {
                        invalid_coordinate: 1,
                        ..SkippedRecords::default()
                    },
                },
            ],
        };

        assert_eq!(report.records_read(), 15);
        assert_eq!(report.points(), 11);
        assert_eq!(report.skipped().total(), 4);
        assert_eq!(report.skipped().missing_coordinate, 2);
    }
}
