#![forbid(unsafe_code)]

//! The event-driven view controller.
//!
//! Host callbacks come in ([`on_map_idle`](MapViewController::on_map_idle),
//! [`on_marker_click`](MapViewController::on_marker_click), card hovers),
//! [`ViewEffect`]s go out. The controller owns the engine, the memoized
//! cluster index, the overlay manager, and the selection; nothing else in
//! the crate holds mutable state across callbacks.
//!
//! # Invariants
//!
//! 1. The cluster index is rebuilt only when the venue source key changes;
//!    it is immutable between rebuilds and replaced wholesale.
//! 2. An idle pass whose composition key matches the previous one touches
//!    neither the engine nor the registry.
//! 3. Callbacks run synchronously to completion, so a later idle result
//!    supersedes an earlier one by construction.

use pinmap_cluster::{ClusterIndex, ClusterParams, Feature, composition_key, source_key};
use pinmap_geo::{LngLat, Venue, VenueId};

use crate::engine::MapEngine;
use crate::marker::{MarkerKey, OverlayManager, ReconcileStats};
use crate::popover::{PopoverLayout, PopoverPosition, position_popover};
use crate::selection::Selection;

/// Instructions for the host; the controller's only output channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEffect {
    /// Scroll the list card for this venue into view.
    ScrollCardIntoView(VenueId),
    /// The selected venue's popover moved (or appeared) here.
    PopoverMoved(PopoverPosition),
    /// No popover should be showing.
    PopoverHidden,
}

/// Owns the map view's state and dispatches host callbacks.
#[derive(Debug)]
pub struct MapViewController<E: MapEngine> {
    engine: E,
    params: ClusterParams,
    venues: Vec<Venue>,
    index: Option<ClusterIndex>,
    venue_key: Option<u64>,
    last_composition: Option<String>,
    overlays: OverlayManager,
    selection: Selection,
    popover_layout: Option<PopoverLayout>,
}

impl<E: MapEngine> MapViewController<E> {
    #[must_use]
    pub fn new(engine: E, params: ClusterParams) -> Self {
        Self {
            engine,
            params,
            venues: Vec::new(),
            index: None,
            venue_key: None,
            last_composition: None,
            overlays: OverlayManager::new(),
            selection: Selection::new(),
            popover_layout: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[inline]
    #[must_use]
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    #[inline]
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[inline]
    #[must_use]
    pub fn overlays(&self) -> &OverlayManager {
        &self.overlays
    }

    /// The popover's measured size and header context, from the host's
    /// layout pass. Positioning is skipped until this is known.
    pub fn set_popover_layout(&mut self, layout: PopoverLayout) {
        self.popover_layout = Some(layout);
    }

    /// Replace the venue set. The index is rebuilt only when the venues
    /// actually changed; a refetch returning identical records is free.
    pub fn set_venues(&mut self, venues: Vec<Venue>) {
        let key = source_key(&venues);
        if self.venue_key == Some(key) {
            return;
        }
        tracing::info!(venues = venues.len(), "rebuilding cluster index");
        self.index = Some(ClusterIndex::build(&venues, self.params));
        self.venues = venues;
        self.venue_key = Some(key);
        // Force the next idle pass to reconcile against the new index.
        self.last_composition = None;
    }

    /// The map settled after a pan/zoom. Re-query the visible tier and
    /// reconcile, unless the visible feature set is unchanged.
    pub fn on_map_idle(&mut self) -> Vec<ViewEffect> {
        let Some(index) = self.index.as_ref() else {
            return Vec::new();
        };
        if !self.engine.projection_ready() {
            return Vec::new();
        }

        let zoom = self.engine.zoom().round() as i64;
        let features = index.query(self.engine.bounds(), zoom);
        let key = composition_key(&features);
        if self.last_composition.as_deref() == Some(key.as_str()) {
            tracing::trace!(zoom, "composition unchanged; skipping reconcile");
            return Vec::new();
        }

        let stats = self.reconcile_pass(&features);
        tracing::debug!(zoom, features = features.len(), ?stats, "idle pass");
        self.last_composition = Some(key);

        vec![self.popover_effect()]
    }

    /// A marker was clicked. Clusters drill down (no selection change);
    /// venue pins select.
    pub fn on_marker_click(&mut self, key: &MarkerKey) -> Vec<ViewEffect> {
        match key {
            MarkerKey::Cluster(cluster_id) => {
                let Some(index) = self.index.as_ref() else {
                    return Vec::new();
                };
                let Some(record) = self.overlays.registry().get(key) else {
                    return Vec::new();
                };
                let Some(zoom) = index.expansion_zoom(*cluster_id) else {
                    return Vec::new();
                };
                let centroid = record.feature.lnglat();
                tracing::debug!(cluster = cluster_id, zoom, "expanding cluster");
                self.engine.jump_to(centroid, f64::from(zoom));
                // The camera jump fires a real idle from the host next.
                Vec::new()
            }
            MarkerKey::Venue(venue_id) => {
                self.selection.pick(venue_id.clone());
                self.overlays
                    .refresh_highlights(&mut self.engine, Some(venue_id));
                vec![
                    ViewEffect::ScrollCardIntoView(venue_id.clone()),
                    self.popover_effect(),
                ]
            }
        }
    }

    /// List-side hover moved onto (or off) a card.
    pub fn on_card_hover(&mut self, venue: Option<VenueId>) {
        if self.selection.set_active(venue) {
            let active = self.selection.active_venue().cloned();
            self.overlays
                .refresh_highlights(&mut self.engine, active.as_ref());
        }
    }

    /// A card was explicitly picked from the list.
    pub fn on_card_select(&mut self, venue: VenueId) -> Vec<ViewEffect> {
        self.selection.pick(venue.clone());
        self.overlays
            .refresh_highlights(&mut self.engine, Some(&venue));
        vec![self.popover_effect()]
    }

    /// The map redrew mid-gesture; keep markers glued to their coordinates.
    pub fn on_map_redraw(&mut self) -> Vec<ViewEffect> {
        self.overlays.reposition_all(&mut self.engine);
        vec![self.popover_effect()]
    }

    /// Remove everything from the engine; the view is going away.
    pub fn teardown(&mut self) {
        self.overlays.teardown(&mut self.engine);
        self.selection.clear();
        self.last_composition = None;
    }

    fn reconcile_pass(&mut self, features: &[Feature]) -> ReconcileStats {
        let active = self.selection.active_venue().cloned();
        let stats = self
            .overlays
            .reconcile(&mut self.engine, features, active.as_ref());
        self.overlays.sync_fallback(&mut self.engine, &self.venues);
        stats
    }

    /// Current popover instruction for the selected venue, if placeable.
    fn popover_effect(&self) -> ViewEffect {
        let Some(selected) = self.selection.selected_venue() else {
            return ViewEffect::PopoverHidden;
        };
        let Some(layout) = self.popover_layout.as_ref() else {
            return ViewEffect::PopoverHidden;
        };
        if !self.engine.projection_ready() {
            return ViewEffect::PopoverHidden;
        }
        let Some(anchor) = self
            .anchor_for(selected)
            .and_then(|lnglat| self.engine.project(lnglat).ok())
        else {
            return ViewEffect::PopoverHidden;
        };
        ViewEffect::PopoverMoved(position_popover(anchor, self.engine.viewport(), layout))
    }

    /// The selected venue's coordinate: live marker first, then the raw
    /// venue record (the pin may currently be folded into a cluster).
    fn anchor_for(&self, venue_id: &VenueId) -> Option<LngLat> {
        if let Some(record) = self
            .overlays
            .registry()
            .get(&MarkerKey::Venue(venue_id.clone()))
        {
            return Some(record.feature.lnglat());
        }
        self.venues
            .iter()
            .find(|venue| &venue.id == venue_id)
            .and_then(Venue::coordinate)
    }
}

#[cfg(test)]
mod tests {
    use pinmap_geo::BoundingBox;

    use super::*;
    use crate::testing::FakeMap;

    fn venues() -> Vec<Venue> {
        serde_json::from_value(serde_json::json!([
            { "id": "v1", "name": "Soho Nails", "lat": 51.50, "lng": -0.10 },
            { "id": "v2", "name": "Soho Hair", "lat": 51.501, "lng": -0.101 },
            { "id": "v3", "name": "Camden Spa", "lat": 51.54, "lng": -0.14 },
        ]))
        .unwrap()
    }

    fn controller_at(zoom: f64) -> MapViewController<FakeMap> {
        let mut map = FakeMap::new();
        map.set_zoom(zoom);
        map.set_bounds(BoundingBox {
            west: -0.3,
            south: 51.4,
            east: 0.1,
            north: 51.6,
        });
        let mut controller = MapViewController::new(map, ClusterParams::default());
        controller.set_venues(venues());
        controller
    }

    #[test]
    fn idle_populates_markers() {
        let mut controller = controller_at(16.0);
        let effects = controller.on_map_idle();
        assert_eq!(effects, vec![ViewEffect::PopoverHidden]);
        // At zoom 16 the two Soho venues are far enough apart in pixels to
        // stay separate: three point markers.
        assert_eq!(controller.overlays().registry().len(), 3);
    }

    #[test]
    fn unchanged_composition_skips_the_pass() {
        let mut controller = controller_at(16.0);
        controller.on_map_idle();
        let before = controller.engine().overlay_count();

        let effects = controller.on_map_idle();
        assert!(effects.is_empty());
        assert_eq!(controller.engine().overlay_count(), before);
    }

    #[test]
    fn zooming_out_clusters_the_close_pair() {
        let mut controller = controller_at(16.0);
        controller.on_map_idle();

        controller.engine_mut().set_zoom(12.0);
        controller.on_map_idle();
        let clusters = controller
            .overlays()
            .registry()
            .iter()
            .filter(|(_, record)| record.feature.is_cluster())
            .count();
        assert!(clusters >= 1, "the Soho pair collapses at city zoom");
    }

    #[test]
    fn refetching_identical_venues_keeps_the_index() {
        let mut controller = controller_at(16.0);
        controller.on_map_idle();
        controller.set_venues(venues());
        // The memoized key is unchanged, so the next idle is a no-op.
        assert!(controller.on_map_idle().is_empty());
    }

    #[test]
    fn changed_venues_force_a_fresh_pass() {
        let mut controller = controller_at(16.0);
        controller.on_map_idle();

        let mut fewer = venues();
        fewer.pop();
        controller.set_venues(fewer);
        let effects = controller.on_map_idle();
        assert!(!effects.is_empty());
        assert_eq!(controller.overlays().registry().len(), 2);
    }

    #[test]
    fn cluster_click_jumps_without_selecting() {
        let mut controller = controller_at(12.0);
        controller.on_map_idle();
        let cluster_key = controller
            .overlays()
            .registry()
            .iter()
            .find(|(_, record)| record.feature.is_cluster())
            .map(|(key, _)| key.clone())
            .expect("a cluster at zoom 12");

        let effects = controller.on_marker_click(&cluster_key);
        assert!(effects.is_empty());
        assert_eq!(controller.engine().jumps().len(), 1);
        let (_, zoom) = controller.engine().jumps()[0];
        assert!(zoom <= 18.0);
        assert!(zoom > 12.0);
        assert_eq!(controller.selection().selected_venue(), None);
    }

    #[test]
    fn venue_click_selects_and_scrolls() {
        let mut controller = controller_at(16.0);
        controller.on_map_idle();
        controller.set_popover_layout(PopoverLayout::new(300.0, 180.0, 64.0));

        let key = MarkerKey::Venue(VenueId::new("v1"));
        let effects = controller.on_marker_click(&key);
        assert_eq!(
            effects[0],
            ViewEffect::ScrollCardIntoView(VenueId::new("v1"))
        );
        assert!(matches!(effects[1], ViewEffect::PopoverMoved(_)));
        assert_eq!(
            controller.selection().selected_venue(),
            Some(&VenueId::new("v1"))
        );
        assert_eq!(
            controller.selection().active_venue(),
            Some(&VenueId::new("v1"))
        );
        assert_eq!(controller.engine().jumps().len(), 0);
    }

    #[test]
    fn hover_moves_the_highlight() {
        let mut controller = controller_at(16.0);
        controller.on_map_idle();

        controller.on_card_hover(Some(VenueId::new("v2")));
        let record = controller
            .overlays()
            .registry()
            .get(&MarkerKey::Venue(VenueId::new("v2")))
            .unwrap();
        assert_eq!(
            record.visual,
            crate::engine::MarkerVisual::Pin { highlighted: true }
        );

        controller.on_card_hover(None);
        let record = controller
            .overlays()
            .registry()
            .get(&MarkerKey::Venue(VenueId::new("v2")))
            .unwrap();
        assert_eq!(
            record.visual,
            crate::engine::MarkerVisual::Pin { highlighted: false }
        );
    }

    #[test]
    fn card_select_positions_the_popover() {
        let mut controller = controller_at(16.0);
        controller.on_map_idle();
        controller.set_popover_layout(PopoverLayout::new(300.0, 180.0, 64.0));

        let effects = controller.on_card_select(VenueId::new("v3"));
        assert!(matches!(effects[0], ViewEffect::PopoverMoved(_)));
    }

    #[test]
    fn no_popover_without_measured_layout() {
        let mut controller = controller_at(16.0);
        controller.on_map_idle();
        let effects = controller.on_card_select(VenueId::new("v1"));
        assert_eq!(effects, vec![ViewEffect::PopoverHidden]);
    }

    #[test]
    fn no_popover_while_projection_unready() {
        let mut controller = controller_at(16.0);
        controller.on_map_idle();
        controller.set_popover_layout(PopoverLayout::new(300.0, 180.0, 64.0));
        controller.engine_mut().set_projection_ready(false);

        let effects = controller.on_card_select(VenueId::new("v1"));
        assert_eq!(effects, vec![ViewEffect::PopoverHidden]);
    }

    #[test]
    fn idle_before_venues_is_a_noop() {
        let map = FakeMap::new();
        let mut controller = MapViewController::new(map, ClusterParams::default());
        assert!(controller.on_map_idle().is_empty());
    }

    #[test]
    fn idle_while_projection_unready_is_a_noop() {
        let mut controller = controller_at(16.0);
        controller.engine_mut().set_projection_ready(false);
        assert!(controller.on_map_idle().is_empty());
        assert!(controller.overlays().registry().is_empty());
    }

    #[test]
    fn teardown_leaves_a_clean_engine() {
        let mut controller = controller_at(16.0);
        controller.on_map_idle();
        assert!(controller.engine().overlay_count() > 0);

        controller.teardown();
        assert_eq!(controller.engine().overlay_count(), 0);
        assert_eq!(controller.selection().selected_venue(), None);
    }

    #[test]
    fn redraw_keeps_markers_tracking() {
        let mut controller = controller_at(16.0);
        controller.on_map_idle();
        // A redraw with no camera change is harmless; with a selection it
        // re-emits the popover instruction.
        let effects = controller.on_map_redraw();
        assert_eq!(effects, vec![ViewEffect::PopoverHidden]);
    }
}
