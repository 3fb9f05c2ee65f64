//! Coordinate reference systems used by the Korean municipal data sets.
//!
//! Government spreadsheets publish coordinates in one of the Korean
//! transverse Mercator systems while the map search API and the district
//! boundaries used for the spatial join are in WGS84 longitude/latitude.

use serde::{Deserialize, Serialize};

/// A coordinate reference system, written in configuration files as
/// `"EPSG:<code>"` or as a raw `"+proj=..."` PROJ.4 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    /// WGS84 longitude/latitude (EPSG:4326).
    #[default]
    Wgs84,
    /// Korean 1985 / Modified Central Belt (EPSG:5174), Bessel ellipsoid.
    Epsg5174,
    /// Korea 2000 / Central Belt 2010 (EPSG:5186).
    Epsg5186,
    /// Korea 2000 / Unified CS, a.k.a. UTM-K (EPSG:5179).
    Epsg5179,
    /// Any other system, given as a PROJ.4 definition.
    Proj(String),
}

/// Longitude/latitude box, in degrees, where a projected system gives
/// meaningful coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaOfUse {
    /// Western longitude bound.
    pub west: f64,
    /// Southern latitude bound.
    pub south: f64,
    /// Eastern longitude bound.
    pub east: f64,
    /// Northern latitude bound.
    pub north: f64,
}

impl AreaOfUse {
    /// Whether `(lon, lat)` lies inside the box, edges included.
    #[must_use]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        (self.west..=self.east).contains(&lon) && (self.south..=self.north).contains(&lat)
    }
}

/// The Korean peninsula and surrounding waters, padded to cover the
/// published extents of every Korean belt.
const KOREA: AreaOfUse = AreaOfUse {
    west: 122.0,
    south: 32.0,
    east: 134.0,
    north: 44.0,
};

impl Crs {
    /// PROJ.4 definition for this system.
    #[must_use]
    pub fn proj_string(&self) -> &str {
        match self {
            Self::Wgs84 => "+proj=longlat +datum=WGS84 +no_defs",
            Self::Epsg5174 => {
                "+proj=tmerc +lat_0=38 +lon_0=127.002890277778 +k=1 +x_0=200000 +y_0=500000 \
                 +ellps=bessel +towgs84=-145.907,505.034,685.756,-1.162,2.347,1.592,6.342 \
                 +units=m +no_defs"
            }
            Self::Epsg5186 => {
                "+proj=tmerc +lat_0=38 +lon_0=127 +k=1 +x_0=200000 +y_0=600000 \
                 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs"
            }
            Self::Epsg5179 => {
                "+proj=tmerc +lat_0=38 +lon_0=127.5 +k=0.9996 +x_0=1000000 +y_0=2000000 \
                 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs"
            }
            Self::Proj(definition) => definition,
        }
    }

    /// Region in which this system is defined. `None` for WGS84 and custom
    /// PROJ.4 definitions, which are not range-checked beyond valid
    /// longitude/latitude.
    #[must_use]
    pub const fn area_of_use(&self) -> Option<AreaOfUse> {
        match self {
            Self::Epsg5174 | Self::Epsg5186 | Self::Epsg5179 => Some(KOREA),
            Self::Wgs84 | Self::Proj(_) => None,
        }
    }

    /// Whether coordinates in this system are longitude/latitude degrees.
    #[must_use]
    pub fn is_geographic(&self) -> bool {
        match self {
            Self::Wgs84 => true,
            Self::Epsg5174 | Self::Epsg5186 | Self::Epsg5179 => false,
            Self::Proj(definition) => definition
                .split_whitespace()
                .any(|token| matches!(token, "+proj=longlat" | "+proj=latlong" | "+proj=lonlat")),
        }
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wgs84 => write!(f, "EPSG:4326"),
            Self::Epsg5174 => write!(f, "EPSG:5174"),
            Self::Epsg5186 => write!(f, "EPSG:5186"),
            Self::Epsg5179 => write!(f, "EPSG:5179"),
            Self::Proj(definition) => write!(f, "{definition}"),
        }
    }
}

/// Error returned when a CRS string is neither a supported EPSG code nor a
/// PROJ.4 definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCrsError {
    /// The rejected input.
    pub value: String,
}

impl std::fmt::Display for UnknownCrsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown CRS '{}': expected EPSG:4326, EPSG:5174, EPSG:5186, EPSG:5179 or a +proj string",
            self.value
        )
    }
}

impl std::error::Error for UnknownCrsError {}

impl std::str::FromStr for Crs {
    type Err = UnknownCrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.starts_with("+proj=") {
            return Ok(Self::Proj(trimmed.to_string()));
        }

        let code = trimmed
            .strip_prefix("EPSG:")
            .or_else(|| trimmed.strip_prefix("epsg:"))
            .unwrap_or(trimmed);

        match code {
            "4326" => Ok(Self::Wgs84),
            "5174" => Ok(Self::Epsg5174),
            "5186" => Ok(Self::Epsg5186),
            "5179" => Ok(Self::Epsg5179),
            _ => Err(UnknownCrsError {
                value: trimmed.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Crs {
    type Error = UnknownCrsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.to_string()
    }
}
