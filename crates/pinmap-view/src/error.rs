#![forbid(unsafe_code)]

//! Error taxonomy for the map view.
//!
//! Failures are bucketed by how the view degrades, not by where they were
//! thrown:
//!
//! - [`MapViewError::Configuration`] — the map cannot exist at all (bad
//!   engine setup); the list UI stays usable without it.
//! - [`MapViewError::Data`] — a malformed venue record; excluded silently.
//! - [`MapViewError::Network`] — upstream fetch or geocoding failure; the
//!   host surfaces a retry affordance.
//! - [`MapViewError::Render`] — a single marker failed; isolated per
//!   marker, never fatal to the pass.

use thiserror::Error;

use crate::engine::OverlayId;

/// The map's screen projection is not available yet.
///
/// Engines report this until their first full render; callers skip
/// positioning work rather than treating it as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("map projection not yet available")]
pub struct ProjectError;

/// A failure inside a [`MapEngine`](crate::engine::MapEngine) primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Screen projection unavailable; overlay placement impossible.
    #[error(transparent)]
    Projection(#[from] ProjectError),
    /// An overlay handle the engine no longer knows about.
    #[error("unknown overlay {0:?}")]
    UnknownOverlay(OverlayId),
    /// An opaque backend failure (DOM, GL context, …).
    #[error("engine backend: {0}")]
    Backend(String),
}

/// Top-level failure taxonomy for the view core.
#[derive(Debug, Error)]
pub enum MapViewError {
    /// The map cannot be set up; the view runs list-only.
    #[error("map configuration: {0}")]
    Configuration(String),
    /// A venue record that cannot be used; it is excluded from the map.
    #[error("venue data: {0}")]
    Data(String),
    /// Fetch or geocoding failure; retriable upstream.
    #[error("network: {0}")]
    Network(String),
    /// A marker-level render failure.
    #[error("render: {0}")]
    Render(#[from] EngineError),
}
