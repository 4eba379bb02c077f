#![forbid(unsafe_code)]

//! Geometric primitives.

/// A WGS84 point, longitude first to match GeoJSON ordering.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LngLat {
    /// Longitude in degrees, nominally in [-180, 180].
    pub lng: f64,
    /// Latitude in degrees, nominally in [-90, 90].
    pub lat: f64,
}

impl LngLat {
    /// Create a new point.
    #[inline]
    #[must_use]
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Whether both components are finite and within the valid WGS84 range.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lng.is_finite()
            && self.lat.is_finite()
            && self.lng.abs() <= 180.0
            && self.lat.abs() <= 90.0
    }
}

/// A geographic bounding box `[west, south, east, north]` in degrees.
///
/// `west > east` denotes a box spanning the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    /// Western edge (min longitude, unless spanning the antimeridian).
    pub west: f64,
    /// Southern edge (min latitude).
    pub south: f64,
    /// Eastern edge (max longitude).
    pub east: f64,
    /// Northern edge (max latitude).
    pub north: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    #[inline]
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Whether the box spans the antimeridian (west edge east of east edge).
    #[inline]
    #[must_use]
    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Whether a point lies inside the box (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: LngLat) -> bool {
        if point.lat < self.south || point.lat > self.north {
            return false;
        }
        if self.crosses_antimeridian() {
            point.lng >= self.west || point.lng <= self.east
        } else {
            point.lng >= self.west && point.lng <= self.east
        }
    }
}

/// A screen-space position in CSS pixels, origin at the viewport's top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    /// Horizontal offset from the left edge.
    pub x: f64,
    /// Vertical offset from the top edge.
    pub y: f64,
}

impl ScreenPoint {
    /// Create a new screen point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another screen point, in pixels.
    #[must_use]
    pub fn distance_to(&self, other: ScreenPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}
