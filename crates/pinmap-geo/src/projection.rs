#![forbid(unsafe_code)]

//! Web-mercator projection and great-circle distance.
//!
//! World space is the unit square `[0,1]²`: x grows east from the
//! antimeridian, y grows south from the north mercator limit. Screen
//! scaling uses a 256px tile base, so the world is `256 · 2^zoom` pixels
//! wide at a given integer zoom.
//!
//! # Invariants
//!
//! 1. `world_x`/`world_y` are total over finite inputs: latitude is clamped
//!    to the mercator limit (±85.051129°) instead of diverging.
//! 2. `world_x(x_to_lng(v)) == v` (and the y counterpart) within float
//!    tolerance for v in (0, 1).

use crate::geometry::LngLat;

/// Pixel size of one world tile at zoom 0.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude beyond which the mercator projection is clamped.
pub const MAX_MERCATOR_LAT: f64 = 85.051_129;

/// Mean Earth radius in miles, for haversine distances.
const EARTH_RADIUS_MILES: f64 = 3_958.8;

/// Width of the world in pixels at an integer zoom level.
#[inline]
#[must_use]
pub fn world_size(zoom: u8) -> f64 {
    TILE_SIZE * f64::from(1_u32 << zoom.min(31))
}

/// Project a longitude into world-space x in `[0, 1]`.
#[inline]
#[must_use]
pub fn world_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Project a latitude into world-space y in `[0, 1]`, clamped at the poles.
#[must_use]
pub fn world_y(lat: f64) -> f64 {
    let clamped = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let sin = clamped.to_radians().sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / std::f64::consts::PI;
    y.clamp(0.0, 1.0)
}

/// Inverse of [`world_x`].
#[inline]
#[must_use]
pub fn x_to_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

/// Inverse of [`world_y`].
#[must_use]
pub fn y_to_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0).to_radians();
    360.0 / std::f64::consts::PI * y2.exp().atan() - 90.0
}

/// Project a point into world space `(x, y)`.
#[inline]
#[must_use]
pub fn project(point: LngLat) -> (f64, f64) {
    (world_x(point.lng), world_y(point.lat))
}

/// Invert a world-space position back to a geographic point.
#[inline]
#[must_use]
pub fn unproject(x: f64, y: f64) -> LngLat {
    LngLat::new(x_to_lng(x), y_to_lat(y))
}

/// Great-circle distance between two points, in miles.
#[must_use]
pub fn haversine_miles(a: LngLat, b: LngLat) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}
