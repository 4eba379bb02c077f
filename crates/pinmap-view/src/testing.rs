#![forbid(unsafe_code)]

//! An in-memory [`MapEngine`] double.
//!
//! [`FakeMap`] records every camera jump and overlay mutation so tests can
//! assert on what the view core asked the engine to do, and offers failure
//! injection for the per-marker isolation paths. Hosts embedding the view
//! core can use it to exercise their glue without a real map widget.

use ahash::AHashMap;
use pinmap_geo::{BoundingBox, LngLat, ScreenPoint, projection};

use crate::engine::{MapEngine, MarkerVisual, NativeMarkerId, OverlayId, Viewport};
use crate::error::{EngineError, ProjectError};

/// Scripted, fully observable map engine.
#[derive(Debug)]
pub struct FakeMap {
    bounds: BoundingBox,
    zoom: f64,
    viewport: Viewport,
    projection_ready: bool,
    overlays: AHashMap<OverlayId, (MarkerVisual, ScreenPoint)>,
    natives: AHashMap<NativeMarkerId, LngLat>,
    next_id: u64,
    fail_next_adds: usize,
    fail_next_removes: usize,
    jumps: Vec<(LngLat, f64)>,
}

impl Default for FakeMap {
    fn default() -> Self {
        Self {
            // Central London at city scale; tests override as needed.
            bounds: BoundingBox {
                west: -0.4,
                south: 51.3,
                east: 0.2,
                north: 51.7,
            },
            zoom: 12.0,
            viewport: Viewport::new(1024.0, 768.0),
            projection_ready: true,
            overlays: AHashMap::new(),
            natives: AHashMap::new(),
            next_id: 1,
            fail_next_adds: 0,
            fail_next_removes: 0,
            jumps: Vec::new(),
        }
    }
}

impl FakeMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bounds(&mut self, bounds: BoundingBox) {
        self.bounds = bounds;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_projection_ready(&mut self, ready: bool) {
        self.projection_ready = ready;
    }

    /// Make the next `n` overlay adds fail with a backend error.
    pub fn fail_next_adds(&mut self, n: usize) {
        self.fail_next_adds = n;
    }

    /// Make the next `n` overlay removals fail with a backend error.
    pub fn fail_next_removes(&mut self, n: usize) {
        self.fail_next_removes = n;
    }

    #[must_use]
    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    #[must_use]
    pub fn native_count(&self) -> usize {
        self.natives.len()
    }

    #[must_use]
    pub fn overlay_visual(&self, id: OverlayId) -> Option<MarkerVisual> {
        self.overlays.get(&id).map(|(visual, _)| *visual)
    }

    /// Every `jump_to` the view core requested, in order.
    #[must_use]
    pub fn jumps(&self) -> &[(LngLat, f64)] {
        &self.jumps
    }

    fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl MapEngine for FakeMap {
    fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn jump_to(&mut self, center: LngLat, zoom: f64) {
        self.jumps.push((center, zoom));
        self.zoom = zoom;
    }

    fn projection_ready(&self) -> bool {
        self.projection_ready
    }

    fn project(&self, lnglat: LngLat) -> Result<ScreenPoint, ProjectError> {
        if !self.projection_ready {
            return Err(ProjectError);
        }
        // Linear placement of the world position into the viewport; exact
        // pixel values are irrelevant, determinism is what matters.
        let (wx, wy) = projection::project(lnglat);
        Ok(ScreenPoint {
            x: wx * self.viewport.width,
            y: wy * self.viewport.height,
        })
    }

    fn add_overlay(
        &mut self,
        visual: MarkerVisual,
        at: ScreenPoint,
    ) -> Result<OverlayId, EngineError> {
        if self.fail_next_adds > 0 {
            self.fail_next_adds -= 1;
            return Err(EngineError::Backend("injected add failure".into()));
        }
        let id = OverlayId(self.fresh_id());
        self.overlays.insert(id, (visual, at));
        Ok(id)
    }

    fn move_overlay(&mut self, id: OverlayId, to: ScreenPoint) -> Result<(), EngineError> {
        match self.overlays.get_mut(&id) {
            Some(slot) => {
                slot.1 = to;
                Ok(())
            }
            None => Err(EngineError::UnknownOverlay(id)),
        }
    }

    fn update_overlay_visual(
        &mut self,
        id: OverlayId,
        visual: MarkerVisual,
    ) -> Result<(), EngineError> {
        match self.overlays.get_mut(&id) {
            Some(slot) => {
                slot.0 = visual;
                Ok(())
            }
            None => Err(EngineError::UnknownOverlay(id)),
        }
    }

    fn remove_overlay(&mut self, id: OverlayId) -> Result<(), EngineError> {
        if self.fail_next_removes > 0 {
            self.fail_next_removes -= 1;
            return Err(EngineError::Backend("injected remove failure".into()));
        }
        self.overlays
            .remove(&id)
            .map(|_| ())
            .ok_or(EngineError::UnknownOverlay(id))
    }

    fn add_native_marker(&mut self, at: LngLat) -> Result<NativeMarkerId, EngineError> {
        let id = NativeMarkerId(self.fresh_id());
        self.natives.insert(id, at);
        Ok(id)
    }

    fn remove_native_marker(&mut self, id: NativeMarkerId) -> Result<(), EngineError> {
        self.natives
            .remove(&id)
            .map(|_| ())
            .ok_or(EngineError::Backend(format!("unknown native {id:?}")))
    }
}
