//! Geographic point type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`GeoPoint`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum GeoPointError {
    /// Latitude outside [-90, 90].
    #[error("latitude must be between -90 and 90, got {0}")]
    LatitudeOutOfRange(f64),
    /// Longitude outside [-180, 180].
    #[error("longitude must be between -180 and 180, got {0}")]
    LongitudeOutOfRange(f64),
    /// Coordinate was NaN or infinite.
    #[error("coordinates must be finite numbers")]
    NotFinite,
}

/// A WGS 84 geographic point (latitude, longitude).
///
/// Construction validates the coordinate ranges; the boundary values
/// (lat ±90, lng ±180) are accepted. Stored in Postgres as
/// `geography(Point, 4326)` via the EWKT encoding from [`Self::to_ewkt`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint", into = "RawPoint")]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

/// Unvalidated wire form of a point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    /// Create a point, validating coordinate bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if either coordinate is non-finite or out of range.
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeoPointError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(GeoPointError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(GeoPointError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(GeoPointError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }

    /// Encode as EWKT for the PostGIS geography column.
    ///
    /// Note the `POINT(lng lat)` axis order: WKT is x/y.
    #[must_use]
    pub fn to_ewkt(&self) -> String {
        format!("SRID=4326;POINT({} {})", self.lng, self.lat)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = GeoPointError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lng)
    }
}

impl From<GeoPoint> for RawPoint {
    fn from(p: GeoPoint) -> Self {
        Self {
            lat: p.lat,
            lng: p.lng,
        }
    }
}
