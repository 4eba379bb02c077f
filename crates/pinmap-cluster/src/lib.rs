#![forbid(unsafe_code)]

//! Spatial clustering index and viewport query engine.
//!
//! # Role in pinmap
//! `pinmap-cluster` turns a venue list into an immutable multi-level
//! clustering index and answers viewport queries against it. The overlay
//! manager re-queries it on every map-idle event; the index itself is built
//! once per venue set and never rebuilt on pan/zoom.
//!
//! # Primary responsibilities
//! - **[`ClusterIndex`]**: one clustered level per integer zoom, built
//!   greedily from `max_zoom` down; entries within the pixel radius of a
//!   seed merge into a cluster at their weighted centroid.
//! - **[`ClusterIndex::query`]**: visible features for a bbox and rounded
//!   integer zoom.
//! - **[`ClusterIndex::expansion_zoom`]**: the minimum zoom at which a
//!   cluster splits, clamped to `max_zoom`.
//! - **[`composition_key`]**: an order-insensitive fingerprint of a query
//!   result, the primary defense against redundant downstream DOM work.
//!
//! # Invariants
//!
//! 1. The index is immutable once built; venue-set changes replace it
//!    wholesale.
//! 2. Queries are deterministic: the same venue set, bbox, and zoom always
//!    produce the same composition key.
//! 3. Result ordering is *not* part of the contract; consumers key features
//!    by identity (cluster id or venue id), never by array position.

pub mod feature;
pub mod index;

pub use feature::{ClusterId, Feature, composition_key};
pub use index::{ClusterIndex, ClusterParams, source_key};
