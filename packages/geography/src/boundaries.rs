//! Reads administrative district polygons from `GeoJSON`.
//!
//! Each feature contributes one district keyed by its code property.
//! Features that repeat a code with the same name (islands published as
//! separate features) are merged into one multi-part district. Boundaries in
//! a projected CRS are reprojected to WGS84 vertex by vertex.

use std::collections::BTreeMap;

use geo::{Contains, MapCoords, MultiPolygon};
use geojson::{Feature, GeoJson};
use pet_map_geography_models::{BoundarySource, Crs, District};

use crate::transform::CoordinateTransformer;
use crate::BoundaryLoadError;

/// A district with its polygon in WGS84 longitude/latitude.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictBoundary {
    /// Unique district code.
    pub code: String,
    /// District display name.
    pub name: String,
    /// Possibly multi-part boundary.
    pub polygon: MultiPolygon<f64>,
}

impl DistrictBoundary {
    /// The district's identity without geometry.
    #[must_use]
    pub fn district(&self) -> District {
        District {
            code: self.code.clone(),
            name: self.name.clone(),
        }
    }

    /// Returns `true` if the point lies strictly inside the boundary.
    /// Points on an edge are not contained.
    #[must_use]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.polygon.contains(&geo::Point::new(lon, lat))
    }
}

/// Reads and parses the boundary file described by `source`.
///
/// # Errors
///
/// Returns [`BoundaryLoadError`] if the file cannot be read, is not a
/// `FeatureCollection` of polygons, has duplicate conflicting codes, or
/// yields no districts.
pub fn load_boundaries(source: &BoundarySource) -> Result<Vec<DistrictBoundary>, BoundaryLoadError> {
    let content = std::fs::read_to_string(&source.path).map_err(|e| BoundaryLoadError::Io {
        path: source.path.clone(),
        source: e,
    })?;

    let boundaries = parse_boundaries(&content, source)?;
    log::info!(
        "Loaded {} district boundaries from {}",
        boundaries.len(),
        source.path.display()
    );
    Ok(boundaries)
}

/// Parses a `GeoJSON` `FeatureCollection` into district boundaries, in
/// feature order. `source.path` is not read.
///
/// # Errors
///
/// See [`load_boundaries`].
pub fn parse_boundaries(
    geojson_str: &str,
    source: &BoundarySource,
) -> Result<Vec<DistrictBoundary>, BoundaryLoadError> {
    let geojson: GeoJson = geojson_str.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(BoundaryLoadError::NotFeatureCollection);
    };

    let transformer = if source.crs == Crs::Wgs84 {
        None
    } else {
        let transformer = CoordinateTransformer::new(source.crs.clone(), Crs::Wgs84).map_err(|e| {
            BoundaryLoadError::Transform {
                code: String::new(),
                source: e,
            }
        })?;
        log::info!("Reprojecting district boundaries from {}", source.crs);
        Some(transformer)
    };

    let mut boundaries: Vec<DistrictBoundary> = Vec::new();
    let mut by_code: BTreeMap<String, usize> = BTreeMap::new();
    let mut filtered = 0_usize;

    for (index, feature) in collection.features.into_iter().enumerate() {
        let code = property_string(&feature, &source.code_field).ok_or_else(|| {
            BoundaryLoadError::MissingProperty {
                index,
                field: source.code_field.clone(),
            }
        })?;

        if let Some(prefix) = &source.code_prefix
            && !code.starts_with(prefix.as_str())
        {
            filtered += 1;
            continue;
        }

        let name = property_string(&feature, &source.name_field).unwrap_or_else(|| {
            log::warn!(
                "District {code} has no '{}' property, using its code as the name",
                source.name_field
            );
            code.clone()
        });

        let polygon = feature_multipolygon(feature, &code)?;
        let polygon = match &transformer {
            Some(transformer) => reproject(&polygon, transformer, &code)?,
            None => polygon,
        };

        if let Some(&existing) = by_code.get(&code) {
            let boundary = &mut boundaries[existing];
            if boundary.name != name {
                return Err(BoundaryLoadError::DuplicateCode {
                    code,
                    first_name: boundary.name.clone(),
                    second_name: name,
                });
            }
            log::debug!("Merging additional part into district {code}");
            boundary.polygon.0.extend(polygon.0);
            continue;
        }

        by_code.insert(code.clone(), boundaries.len());
        boundaries.push(DistrictBoundary {
            code,
            name,
            polygon,
        });
    }

    if filtered > 0 {
        log::debug!("Skipped {filtered} features outside the configured code prefix");
    }

    if boundaries.is_empty() {
        return Err(BoundaryLoadError::Empty);
    }

    Ok(boundaries)
}

/// Reads a property as a string. Numeric codes are common in government
/// shapefile exports and are rendered without a fractional part.
fn property_string(feature: &Feature, field: &str) -> Option<String> {
    match feature.property(field)? {
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Converts a feature's geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn feature_multipolygon(feature: Feature, code: &str) -> Result<MultiPolygon<f64>, BoundaryLoadError> {
    let Some(geometry) = feature.geometry else {
        return Err(BoundaryLoadError::UnsupportedGeometry {
            code: code.to_string(),
            kind: "none".to_string(),
        });
    };

    let kind = geometry_kind(&geometry.value);
    let geo_geom: geo::Geometry<f64> = geometry.try_into()?;

    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Ok(mp),
        geo::Geometry::Polygon(p) => Ok(MultiPolygon(vec![p])),
        _ => Err(BoundaryLoadError::UnsupportedGeometry {
            code: code.to_string(),
            kind: kind.to_string(),
        }),
    }
}

const fn geometry_kind(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn reproject(
    polygon: &MultiPolygon<f64>,
    transformer: &CoordinateTransformer,
    code: &str,
) -> Result<MultiPolygon<f64>, BoundaryLoadError> {
    polygon
        .try_map_coords(|coord| {
            transformer
                .transform(coord.x, coord.y)
                .map(|(x, y)| geo::Coord { x, y })
        })
        .map_err(|e| BoundaryLoadError::Transform {
            code: code.to_string(),
            source: e,
        })
}
