#![forbid(unsafe_code)]

//! The pluggable map engine seam.
//!
//! Everything the view core needs from a concrete map widget goes through
//! [`MapEngine`]: camera state, screen projection, and two overlay tiers —
//! rich custom overlays (the normal path) and lower-fidelity native
//! markers (the degraded fallback). The core never touches the host's DOM
//! or widget types directly.

use pinmap_geo::{BoundingBox, LngLat, ScreenPoint};

use crate::error::{EngineError, ProjectError};

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Opaque handle to a custom overlay the engine materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(pub u64);

/// Opaque handle to a native fallback marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeMarkerId(pub u64);

/// Visible screen area in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Declarative marker appearance; the engine decides how to draw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerVisual {
    /// Circular badge showing how many venues collapsed into the cluster.
    ClusterBadge { count: u32 },
    /// Individual venue pin; larger and accented while highlighted.
    Pin { highlighted: bool },
}

// ---------------------------------------------------------------------------
// Engine trait
// ---------------------------------------------------------------------------

/// The contract a concrete map widget fulfills for the view core.
///
/// Camera mutations are infallible (a widget that cannot pan is not a map);
/// everything touching projection or overlay materialization returns a
/// [`Result`] so a single bad marker can be isolated.
pub trait MapEngine {
    /// Geographic bounds of the current viewport.
    fn bounds(&self) -> BoundingBox;

    /// Current zoom level (fractional; callers round for tier lookups).
    fn zoom(&self) -> f64;

    /// Visible screen area, for popover clamping.
    fn viewport(&self) -> Viewport;

    /// Pan and zoom the camera in one jump.
    fn jump_to(&mut self, center: LngLat, zoom: f64);

    /// Whether [`project`](Self::project) can succeed yet.
    fn projection_ready(&self) -> bool;

    /// Project a coordinate into viewport-relative screen pixels.
    fn project(&self, lnglat: LngLat) -> Result<ScreenPoint, ProjectError>;

    /// Materialize a custom overlay at a screen position.
    fn add_overlay(
        &mut self,
        visual: MarkerVisual,
        at: ScreenPoint,
    ) -> Result<OverlayId, EngineError>;

    /// Reposition an existing overlay.
    fn move_overlay(&mut self, id: OverlayId, to: ScreenPoint) -> Result<(), EngineError>;

    /// Swap an overlay's appearance in place.
    fn update_overlay_visual(
        &mut self,
        id: OverlayId,
        visual: MarkerVisual,
    ) -> Result<(), EngineError>;

    /// Detach and discard an overlay.
    fn remove_overlay(&mut self, id: OverlayId) -> Result<(), EngineError>;

    /// Add a lower-fidelity native marker (degraded fallback path).
    fn add_native_marker(&mut self, at: LngLat) -> Result<NativeMarkerId, EngineError>;

    /// Remove a native fallback marker.
    fn remove_native_marker(&mut self, id: NativeMarkerId) -> Result<(), EngineError>;
}
