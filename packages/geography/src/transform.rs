//! Conversion between projected coordinates and WGS84 longitude/latitude.
//!
//! Wraps `proj4rs`. Geographic systems are handled in degrees at the API
//! boundary and converted to radians for `proj4rs`, which expects (and
//! returns) angular coordinates in radians.

use pet_map_geography_models::Crs;
use proj4rs::proj::Proj;

use crate::TransformError;

/// A reusable transformer between two coordinate systems.
///
/// Parses both projection definitions once; each [`transform`](Self::transform)
/// call is then a pure function of its inputs.
pub struct CoordinateTransformer {
    source: Crs,
    target: Crs,
    source_proj: Proj,
    target_proj: Proj,
}

impl std::fmt::Debug for CoordinateTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateTransformer")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl CoordinateTransformer {
    /// Builds a transformer from `source` to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Projection`] if either definition cannot
    /// be parsed.
    pub fn new(source: Crs, target: Crs) -> Result<Self, TransformError> {
        let source_proj = build_proj(&source)?;
        let target_proj = build_proj(&target)?;

        Ok(Self {
            source,
            target,
            source_proj,
            target_proj,
        })
    }

    /// Transforms one coordinate pair. Geographic coordinates are
    /// `(longitude, latitude)` in degrees.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::InvalidCoordinate`] if the input is
    /// non-finite, outside the longitude/latitude range of a geographic
    /// source, or cannot be projected to a valid target coordinate. A
    /// conversion between a geographic and a projected system also fails
    /// when the geographic side falls outside the projected system's
    /// [area of use](Crs::area_of_use).
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), TransformError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(self.invalid(x, y, "coordinate is not finite"));
        }

        if self.source.is_geographic() && !is_valid_lon_lat(x, y) {
            return Err(self.invalid(x, y, "longitude/latitude out of range"));
        }

        if self.source == self.target {
            return Ok((x, y));
        }

        if self.source.is_geographic() && !within_area(&self.target, x, y) {
            return Err(self.invalid(x, y, "outside the area of use of the target projection"));
        }

        let mut point = if self.source.is_geographic() {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        proj4rs::transform::transform(&self.source_proj, &self.target_proj, &mut point)
            .map_err(|e| self.invalid(x, y, &e.to_string()))?;

        let (out_x, out_y) = if self.target.is_geographic() {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !out_x.is_finite() || !out_y.is_finite() {
            return Err(self.invalid(x, y, "projection produced a non-finite result"));
        }

        if self.target.is_geographic()
            && (!is_valid_lon_lat(out_x, out_y) || !within_area(&self.source, out_x, out_y))
        {
            return Err(self.invalid(x, y, "outside the area of use of the source projection"));
        }

        Ok((out_x, out_y))
    }

    fn invalid(&self, x: f64, y: f64, reason: &str) -> TransformError {
        TransformError::InvalidCoordinate {
            x,
            y,
            crs: self.source.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// One-shot transform from `source` to `target`.
///
/// Prefer [`CoordinateTransformer`] when converting many points, since this
/// parses both projection definitions on every call.
///
/// # Errors
///
/// See [`CoordinateTransformer::new`] and [`CoordinateTransformer::transform`].
pub fn transform(x: f64, y: f64, source: &Crs, target: &Crs) -> Result<(f64, f64), TransformError> {
    CoordinateTransformer::new(source.clone(), target.clone())?.transform(x, y)
}

fn build_proj(crs: &Crs) -> Result<Proj, TransformError> {
    let definition = crs.proj_string();
    Proj::from_proj_string(definition).map_err(|e| TransformError::Projection {
        definition: definition.to_string(),
        message: e.to_string(),
    })
}

fn is_valid_lon_lat(lon: f64, lat: f64) -> bool {
    (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat)
}

fn within_area(crs: &Crs, lon: f64, lat: f64) -> bool {
    crs.area_of_use().is_none_or(|area| area.contains(lon, lat))
}
