//! End-to-end flow through the view controller: venues in, idle passes,
//! drill-down, selection, popover, teardown.

use pinmap_cluster::ClusterParams;
use pinmap_geo::{BoundingBox, Venue, VenueId};
use pinmap_view::testing::FakeMap;
use pinmap_view::{MapViewController, MarkerKey, PopoverLayout, ViewEffect, Viewport};

fn london_venues() -> Vec<Venue> {
    serde_json::from_value(serde_json::json!([
        {
            "id": "soho-nails",
            "name": "Soho Nails",
            "rating": 4.8,
            "location": { "coordinates": [-0.10, 51.50] }
        },
        {
            "id": "soho-hair",
            "name": "Soho Hair",
            "location": { "lat": 51.501, "lng": -0.101 }
        },
        {
            "id": "camden-spa",
            "name": "Camden Spa",
            "location": { "latitude": 51.54, "longitude": -0.14 }
        },
        {
            "id": "no-location",
            "name": "Mystery Venue"
        }
    ]))
    .unwrap()
}

fn city_bounds() -> BoundingBox {
    BoundingBox {
        west: -0.3,
        south: 51.4,
        east: 0.1,
        north: 51.6,
    }
}

fn controller_at(zoom: f64) -> MapViewController<FakeMap> {
    let mut map = FakeMap::new();
    map.set_zoom(zoom);
    map.set_bounds(city_bounds());
    map.set_viewport(Viewport::new(1024.0, 768.0));
    let mut controller = MapViewController::new(map, ClusterParams::default());
    controller.set_venues(london_venues());
    controller
}

#[test]
fn zoom_out_merges_and_drilldown_splits() {
    // Street level: the close Soho pair renders as two separate pins.
    let mut controller = controller_at(16.0);
    controller.on_map_idle();
    assert_eq!(controller.overlays().registry().len(), 3);
    assert!(
        controller
            .overlays()
            .registry()
            .iter()
            .all(|(_, record)| !record.feature.is_cluster())
    );

    // City level: the pair merges into one cluster of two.
    controller.engine_mut().set_zoom(12.0);
    controller.on_map_idle();
    let cluster_key = controller
        .overlays()
        .registry()
        .iter()
        .find(|(_, record)| record.feature.is_cluster())
        .map(|(key, _)| key.clone())
        .expect("cluster at city zoom");
    assert_eq!(controller.overlays().registry().len(), 2);

    // Clicking the cluster jumps to its expansion zoom, where the pair
    // separates again on the next idle.
    controller.on_marker_click(&cluster_key);
    let (_, jumped_zoom) = controller.engine().jumps()[0];
    assert!(jumped_zoom > 12.0 && jumped_zoom <= 18.0);
    controller.on_map_idle();
    assert_eq!(controller.overlays().registry().len(), 3);
}

#[test]
fn venue_without_location_never_reaches_the_map() {
    let mut controller = controller_at(16.0);
    controller.on_map_idle();
    assert!(
        controller
            .overlays()
            .registry()
            .get(&MarkerKey::Venue(VenueId::new("no-location")))
            .is_none()
    );
}

#[test]
fn selection_flows_from_map_to_list_and_back() {
    let mut controller = controller_at(16.0);
    controller.on_map_idle();
    controller.set_popover_layout(PopoverLayout::new(300.0, 180.0, 64.0));

    // Map side: clicking a pin selects and asks for a card scroll.
    let effects = controller.on_marker_click(&MarkerKey::Venue(VenueId::new("soho-nails")));
    assert_eq!(
        effects[0],
        ViewEffect::ScrollCardIntoView(VenueId::new("soho-nails"))
    );
    assert!(matches!(effects[1], ViewEffect::PopoverMoved(_)));

    // List side: hovering another card moves the highlight without
    // disturbing the explicit selection.
    controller.on_card_hover(Some(VenueId::new("soho-hair")));
    assert_eq!(
        controller.selection().selected_venue(),
        Some(&VenueId::new("soho-nails"))
    );
    assert_eq!(
        controller.selection().active_venue(),
        Some(&VenueId::new("soho-hair"))
    );
}

#[test]
fn popover_tracks_the_selected_venue_across_idles() {
    let mut controller = controller_at(16.0);
    controller.on_map_idle();
    controller.set_popover_layout(PopoverLayout::new(300.0, 180.0, 64.0));
    controller.on_card_select(VenueId::new("camden-spa"));

    // A pan that changes the visible set re-emits a popover position.
    controller.engine_mut().set_bounds(BoundingBox {
        west: -0.25,
        south: 51.45,
        east: 0.05,
        north: 51.65,
    });
    controller.engine_mut().set_zoom(13.0);
    let effects = controller.on_map_idle();
    assert!(
        effects
            .iter()
            .any(|effect| matches!(effect, ViewEffect::PopoverMoved(_)))
    );
}

#[test]
fn degraded_fallback_round_trip() {
    // Projection never comes up: overlays cannot be placed, so every
    // coordinate-bearing venue gets a plain native marker instead.
    let mut map = FakeMap::new();
    map.set_zoom(16.0);
    map.set_bounds(city_bounds());
    let mut controller = MapViewController::new(map, ClusterParams::default());
    controller.set_venues(london_venues());

    controller.engine_mut().set_projection_ready(false);
    assert!(controller.on_map_idle().is_empty());
    assert_eq!(controller.engine().native_count(), 0);

    // Projection comes up but every overlay add fails.
    controller.engine_mut().set_projection_ready(true);
    controller.engine_mut().fail_next_adds(3);
    controller.on_map_idle();
    assert!(controller.overlays().fallback_active());
    assert_eq!(controller.engine().native_count(), 3);

    // Next venue change retries; overlays succeed and the fallback goes.
    let mut venues = london_venues();
    venues.pop();
    controller.set_venues(venues);
    controller.on_map_idle();
    assert!(!controller.overlays().fallback_active());
    assert_eq!(controller.engine().native_count(), 0);
    assert_eq!(controller.overlays().registry().len(), 3);
}

#[test]
fn teardown_removes_every_engine_artifact() {
    let mut controller = controller_at(12.0);
    controller.on_map_idle();
    assert!(controller.engine().overlay_count() > 0);

    controller.teardown();
    assert_eq!(controller.engine().overlay_count(), 0);
    assert_eq!(controller.engine().native_count(), 0);
}
