#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate transformation and district boundary loading.
//!
//! Converts projected Korean coordinates (EPSG:5174 and friends) to WGS84
//! longitude/latitude, and reads administrative district polygons from
//! `GeoJSON` so they can be indexed for point-in-polygon attribution.

pub mod boundaries;
pub mod transform;

use std::path::PathBuf;

use thiserror::Error;

pub use boundaries::{DistrictBoundary, load_boundaries, parse_boundaries};
pub use transform::{CoordinateTransformer, transform};

/// Errors raised by the coordinate transformer.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The coordinate is non-finite or outside the valid domain of the
    /// source (or target) system. Affects only the offending point.
    #[error("Invalid coordinate ({x}, {y}) in {crs}: {reason}")]
    InvalidCoordinate {
        /// First coordinate component (easting or longitude).
        x: f64,
        /// Second coordinate component (northing or latitude).
        y: f64,
        /// Display form of the CRS the coordinate was given in.
        crs: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A projection definition could not be parsed.
    #[error("Unsupported projection '{definition}': {message}")]
    Projection {
        /// The PROJ.4 string that failed.
        definition: String,
        /// Parser message.
        message: String,
    },
}

/// Errors raised while loading district boundaries. All of them are fatal
/// for the run.
#[derive(Debug, Error)]
pub enum BoundaryLoadError {
    /// The boundary file could not be read.
    #[error("Failed to read boundary file {}: {source}", .path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The content is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The document parsed but is not a `FeatureCollection`.
    #[error("Boundary source must be a GeoJSON FeatureCollection")]
    NotFeatureCollection,

    /// A feature is missing its district code property.
    #[error("Feature #{index} is missing property '{field}'")]
    MissingProperty {
        /// Position of the feature in the collection.
        index: usize,
        /// Property that was expected.
        field: String,
    },

    /// A feature has no geometry or a non-polygonal one.
    #[error("District {code} has unsupported geometry: {kind}")]
    UnsupportedGeometry {
        /// District code.
        code: String,
        /// Geometry type that was found.
        kind: String,
    },

    /// Two features share a code but disagree on the name.
    #[error("Duplicate district code {code} ('{first_name}' vs '{second_name}')")]
    DuplicateCode {
        /// Repeated code.
        code: String,
        /// Name of the first feature with this code.
        first_name: String,
        /// Name of the conflicting feature.
        second_name: String,
    },

    /// Reprojecting a boundary vertex failed.
    #[error("Failed to reproject district {code}: {source}")]
    Transform {
        /// District code.
        code: String,
        /// Transformer error.
        source: TransformError,
    },

    /// No districts were left after parsing and filtering.
    #[error("Boundary source contains no districts")]
    Empty,
}
