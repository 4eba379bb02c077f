#![forbid(unsafe_code)]

//! Geographic primitives and the venue data model.
//!
//! # Role in pinmap
//! `pinmap-geo` is the data layer. It owns the coordinate types everything
//! else speaks in, the web-mercator math used by the cluster index and the
//! marker projector, and the ingestion path that turns heterogeneous venue
//! records into normalized points.
//!
//! # Primary responsibilities
//! - **Geometry**: [`LngLat`], [`BoundingBox`], [`ScreenPoint`].
//! - **Projection**: lng/lat ⇄ world-space `[0,1]²`, pixel scaling per zoom.
//! - **Normalization**: one function resolving the four accepted location
//!   encodings into `Option<LngLat>`, applied once at ingestion.
//! - **Venue model**: serde records, haversine distances, distance sorting.
//!
//! # How it fits in the system
//! `pinmap-cluster` projects venues through this crate once at index build;
//! `pinmap-view` uses the same projection scale when it reasons about
//! on-screen distances. Venues that fail normalization are excluded from the
//! spatial side but stay in the list — exclusion is not an error.

pub mod geometry;
pub mod normalize;
pub mod projection;
pub mod venue;

pub use geometry::{BoundingBox, LngLat, ScreenPoint};
pub use normalize::normalize_location;
pub use venue::{Service, Venue, VenueId};
