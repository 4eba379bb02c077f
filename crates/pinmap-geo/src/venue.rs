#![forbid(unsafe_code)]

//! The venue record model.
//!
//! Venue records arrive from an external list fetch; this module only
//! consumes the result. Records are tolerant by construction: every field
//! the map side cares about is optional except the id, and a record whose
//! location cannot be resolved still participates fully in the list.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::geometry::LngLat;
use crate::normalize::{normalize_location, validated};
use crate::projection::haversine_miles;

/// Opaque venue identifier.
///
/// Upstream ids are strings in some tenants and numbers in others; both
/// deserialize into the same owned string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VenueId(pub String);

impl VenueId {
    /// Create an id from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VenueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for VenueId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(s) => Ok(Self(s)),
            Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "venue id must be a string or number, got {other}"
            ))),
        }
    }
}

/// A bookable service offered by a venue.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Service {
    /// Display name of the service.
    pub name: String,
    /// Price in the tenant's currency.
    #[serde(default)]
    pub price: Option<f64>,
    /// Duration of the appointment slot.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

/// A venue record as fetched from the list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Venue {
    /// Opaque venue id.
    pub id: VenueId,
    /// Display name.
    pub name: String,
    /// Aggregate rating, when the tenant exposes one.
    #[serde(default)]
    pub rating: Option<f64>,
    /// Bookable services.
    #[serde(default)]
    pub services: Vec<Service>,
    /// Heterogeneous location payload; resolved via [`Venue::coordinate`].
    #[serde(default)]
    pub location: Option<Value>,
    /// Flat latitude, the fourth accepted encoding.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Flat longitude, the fourth accepted encoding.
    #[serde(default)]
    pub lng: Option<f64>,
    /// Haversine miles from the user location; derived, not fetched.
    #[serde(skip)]
    pub distance_miles: Option<f64>,
}

impl Venue {
    /// Resolve the venue's coordinate, if any encoding matches.
    ///
    /// Precedence: the `location` payload shapes (GeoJSON array, then
    /// `{lat,lng}`, then `{latitude,longitude}`), then flat `lat`/`lng`
    /// fields on the record itself. First match wins.
    #[must_use]
    pub fn coordinate(&self) -> Option<LngLat> {
        if let Some(point) = self.location.as_ref().and_then(normalize_location) {
            return Some(point);
        }
        if let (Some(lat), Some(lng)) = (self.lat, self.lng) {
            return validated(lng, lat);
        }
        None
    }
}

/// Derive `distance_miles` for every venue with a resolvable coordinate.
pub fn assign_distances(venues: &mut [Venue], origin: LngLat) {
    for venue in venues.iter_mut() {
        venue.distance_miles = venue
            .coordinate()
            .map(|point| haversine_miles(origin, point));
    }
}

/// Sort venues by derived distance, nearest first.
///
/// Venues without a distance (no resolvable coordinate) sort last; the sort
/// is stable, so their relative order is preserved.
pub fn sort_by_distance(venues: &mut [Venue]) {
    venues.sort_by(|a, b| match (a.distance_miles, b.distance_miles) {
        (Some(da), Some(db)) => da.total_cmp(&db),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
