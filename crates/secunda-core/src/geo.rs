//! # Geo Query Geometry
//!
//! Pure geometry behind the two proximity searches:
//!
//! - **Box search** is a plain rectangle test on raw coordinates, inclusive
//!   on all four bounds. No great-circle correction.
//! - **Radius search** uses the haversine great-circle distance over the
//!   mean Earth radius. Stores narrow candidates with
//!   [`RadiusQuery::bounding_box`] first and then apply the exact test
//!   [`RadiusQuery::contains`] to each candidate.
//!
//! The prefilter rectangle always contains the whole search circle, so the
//! two-step evaluation returns exactly the points within the radius.

use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;

/// Mean Earth radius (IUGG), in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Padding added to every side of a prefilter rectangle, in degrees
/// (about 1 cm). Absorbs rounding at the circle's extreme points.
const PREFILTER_PAD_DEG: f64 = 1e-7;

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(lat: f64, lon: f64) -> Result<Self, DirectoryError> {
        Self::validate_latitude(lat)?;
        Self::validate_longitude(lon)?;
        Ok(Self { lat, lon })
    }

    pub fn validate_latitude(lat: f64) -> Result<(), DirectoryError> {
        if lat.is_finite() && (-90.0..=90.0).contains(&lat) {
            Ok(())
        } else {
            Err(DirectoryError::Validation(format!(
                "latitude must be within [-90, 90], got {lat}"
            )))
        }
    }

    pub fn validate_longitude(lon: f64) -> Result<(), DirectoryError> {
        if lon.is_finite() && (-180.0..=180.0).contains(&lon) {
            Ok(())
        } else {
            Err(DirectoryError::Validation(format!(
                "longitude must be within [-180, 180], got {lon}"
            )))
        }
    }

    /// Great-circle distance to `other`, in meters.
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        haversine_m(*self, *other)
    }
}

/// Haversine great-circle distance between two points, in meters.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lon - a.lon).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h marginally outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// A latitude/longitude rectangle, inclusive on every bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Build a rectangle from caller-supplied bounds.
    ///
    /// Bounds must be finite and ordered (`min <= max`). Bounds outside the
    /// coordinate ranges are accepted; they simply match nothing extra.
    pub fn new(
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
    ) -> Result<Self, DirectoryError> {
        let all_finite = [lat_min, lat_max, lon_min, lon_max]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(DirectoryError::Validation(
                "bounding box coordinates must be finite".into(),
            ));
        }
        if lat_min > lat_max {
            return Err(DirectoryError::Validation(format!(
                "lat_min ({lat_min}) must not exceed lat_max ({lat_max})"
            )));
        }
        if lon_min > lon_max {
            return Err(DirectoryError::Validation(format!(
                "lon_min ({lon_min}) must not exceed lon_max ({lon_max})"
            )));
        }
        Ok(Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        })
    }

    /// Whether `point` lies inside the rectangle, bounds included.
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.lat_min
            && point.lat <= self.lat_max
            && point.lon >= self.lon_min
            && point.lon <= self.lon_max
    }
}

/// A great-circle radius search around a center point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusQuery {
    pub center: GeoPoint,
    pub radius_m: f64,
}

impl RadiusQuery {
    pub fn new(center: GeoPoint, radius_m: f64) -> Result<Self, DirectoryError> {
        if !radius_m.is_finite() || radius_m < 0.0 {
            return Err(DirectoryError::Validation(format!(
                "radius must be a finite, non-negative number of meters, got {radius_m}"
            )));
        }
        Ok(Self { center, radius_m })
    }

    /// Exact test: great-circle distance from the center is within the radius.
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.center.distance_m(&point) <= self.radius_m
    }

    /// Smallest rectangle guaranteed to contain the whole search circle.
    ///
    /// The longitude span collapses to the full range when the circle
    /// reaches a pole or crosses the antimeridian, since a single
    /// `[lon_min, lon_max]` interval cannot describe a wrapped span.
    pub fn bounding_box(&self) -> BoundingBox {
        let angular = self.radius_m / EARTH_RADIUS_M;
        let d_lat = angular.to_degrees();

        let lat_min = self.center.lat - d_lat - PREFILTER_PAD_DEG;
        let lat_max = self.center.lat + d_lat + PREFILTER_PAD_DEG;

        let full_lon = BoundingBox {
            lat_min: lat_min.max(-90.0),
            lat_max: lat_max.min(90.0),
            lon_min: -180.0,
            lon_max: 180.0,
        };

        if lat_min <= -90.0 || lat_max >= 90.0 {
            return full_lon;
        }

        let ratio = angular.sin() / self.center.lat.to_radians().cos();
        if angular >= std::f64::consts::FRAC_PI_2 || !(0.0..1.0).contains(&ratio) {
            return full_lon;
        }
        let d_lon = ratio.asin().to_degrees();

        let lon_min = self.center.lon - d_lon - PREFILTER_PAD_DEG;
        let lon_max = self.center.lon + d_lon + PREFILTER_PAD_DEG;
        if lon_min < -180.0 || lon_max > 180.0 {
            return full_lon;
        }

        BoundingBox {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }
}
