#![forbid(unsafe_code)]

//! Location normalization for heterogeneous venue records.
//!
//! Upstream venue payloads encode their position in one of four shapes:
//!
//! 1. GeoJSON-style: `{"coordinates": [lng, lat]}`
//! 2. Short keys: `{"lat": …, "lng": …}`
//! 3. Long keys: `{"latitude": …, "longitude": …}`
//! 4. Flat `lat`/`lng` fields on the record itself (handled by
//!    [`Venue::coordinate`](crate::venue::Venue::coordinate), which falls
//!    back to this order after the `location` field).
//!
//! The first matching shape wins; all others are ignored. Anything that
//! fails to resolve yields `None` — a venue without a resolvable coordinate
//! is excluded from the spatial index, never an error.
//!
//! # Invariants
//!
//! 1. All four shapes produce the identical [`LngLat`] for the same logical
//!    location.
//! 2. Out-of-range (|lat| > 90, |lng| > 180) or non-finite components are
//!    rejected, not clamped.

use serde_json::Value;

use crate::geometry::LngLat;

/// Resolve a location value into a normalized point, or `None` when no
/// accepted shape matches.
#[must_use]
pub fn normalize_location(value: &Value) -> Option<LngLat> {
    let obj = value.as_object()?;

    // GeoJSON coordinates take precedence over key pairs.
    if let Some(coords) = obj.get("coordinates").and_then(Value::as_array)
        && coords.len() >= 2
        && let (Some(lng), Some(lat)) = (as_f64(&coords[0]), as_f64(&coords[1]))
    {
        return validated(lng, lat);
    }

    if let (Some(lat), Some(lng)) = (field(obj, "lat"), field(obj, "lng")) {
        return validated(lng, lat);
    }

    if let (Some(lat), Some(lng)) = (field(obj, "latitude"), field(obj, "longitude")) {
        return validated(lng, lat);
    }

    None
}

/// Validate a raw lng/lat pair into a point.
#[must_use]
pub(crate) fn validated(lng: f64, lat: f64) -> Option<LngLat> {
    let point = LngLat::new(lng, lat);
    point.is_valid().then_some(point)
}

fn field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(as_f64)
}

/// Accept JSON numbers and numeric strings; some upstream feeds stringify.
fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
