#![forbid(unsafe_code)]

//! Marker registry and the overlay reconciliation pass.
//!
//! The registry is a keyed arena: every live marker is one
//! [`MarkerRecord`] owned here and nowhere else. Reconciliation diffs a
//! fresh query result against it — update in place, create what is
//! missing, remove what was not touched — so engine churn per pass is
//! proportional to what actually changed.
//!
//! # Invariants
//!
//! 1. Registry and engine agree: every record holds a live [`OverlayId`]
//!    and every overlay the manager created has a record (or a removal was
//!    attempted and logged).
//! 2. Per-marker engine failures are isolated. A marker that cannot be
//!    placed or updated is dropped from the registry, counted in
//!    [`ReconcileStats::failed`], and logged at `warn`; the pass continues.
//! 3. The native fallback tier is all-or-nothing: it exists only while the
//!    overlay registry is empty despite placeable venues.

use std::fmt;

use ahash::{AHashMap, AHashSet};
use pinmap_cluster::{ClusterId, Feature};
use pinmap_geo::{Venue, VenueId};

use crate::engine::{MapEngine, MarkerVisual, NativeMarkerId, OverlayId};

// ---------------------------------------------------------------------------
// Keys and records
// ---------------------------------------------------------------------------

/// Stable identity of a marker across reconciliation passes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkerKey {
    Cluster(ClusterId),
    Venue(VenueId),
}

impl MarkerKey {
    /// Derive the key from a query-result feature.
    #[must_use]
    pub fn for_feature(feature: &Feature) -> Self {
        match feature {
            Feature::Point { venue_id, .. } => Self::Venue(venue_id.clone()),
            Feature::Cluster { cluster_id, .. } => Self::Cluster(*cluster_id),
        }
    }
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cluster(id) => write!(f, "cluster:{id}"),
            Self::Venue(id) => write!(f, "venue:{id}"),
        }
    }
}

/// One live marker: the overlay handle, its current appearance, and the
/// feature it was built from.
#[derive(Debug, Clone)]
pub struct MarkerRecord {
    pub overlay: OverlayId,
    pub visual: MarkerVisual,
    pub feature: Feature,
}

/// Keyed arena of live markers.
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    records: AHashMap<MarkerKey, MarkerRecord>,
}

impl MarkerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &MarkerKey) -> Option<&MarkerRecord> {
        self.records.get(key)
    }

    /// Iterate all live records.
    pub fn iter(&self) -> impl Iterator<Item = (&MarkerKey, &MarkerRecord)> {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Outcome counts for one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub failed: usize,
}

/// Owns the registry and both overlay tiers, and runs the diff passes.
#[derive(Debug, Default)]
pub struct OverlayManager {
    registry: MarkerRegistry,
    fallback: Vec<NativeMarkerId>,
}

impl OverlayManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    /// Whether the degraded native tier is currently showing.
    #[inline]
    #[must_use]
    pub fn fallback_active(&self) -> bool {
        !self.fallback.is_empty()
    }

    /// Diff `features` against the registry and apply the delta to the
    /// engine.
    ///
    /// Present keys are updated in place: feature refreshed, element
    /// repositioned from a fresh projection, and point visuals re-derived
    /// from `active_venue`. Absent keys get a new overlay. Registry
    /// entries not touched by this pass are detached and dropped.
    pub fn reconcile<E: MapEngine>(
        &mut self,
        engine: &mut E,
        features: &[Feature],
        active_venue: Option<&VenueId>,
    ) -> ReconcileStats {
        let mut stats = ReconcileStats::default();
        let mut touched: AHashSet<MarkerKey> = AHashSet::with_capacity(features.len());

        for feature in features {
            let key = MarkerKey::for_feature(feature);
            touched.insert(key.clone());
            let visual = visual_for(feature, active_venue);

            if let Some(record) = self.registry.records.get_mut(&key) {
                record.feature = feature.clone();
                let mut ok = match engine.project(feature.lnglat()) {
                    Ok(at) => engine.move_overlay(record.overlay, at).is_ok(),
                    Err(_) => false,
                };
                if ok && record.visual != visual {
                    ok = engine.update_overlay_visual(record.overlay, visual).is_ok();
                    if ok {
                        record.visual = visual;
                    }
                }
                if ok {
                    stats.updated += 1;
                } else {
                    tracing::warn!(marker = %key, "marker update failed; dropping");
                    let overlay = record.overlay;
                    self.registry.records.remove(&key);
                    let _ = engine.remove_overlay(overlay);
                    stats.failed += 1;
                }
            } else {
                match engine
                    .project(feature.lnglat())
                    .map_err(Into::into)
                    .and_then(|at| engine.add_overlay(visual, at))
                {
                    Ok(overlay) => {
                        self.registry.records.insert(
                            key,
                            MarkerRecord {
                                overlay,
                                visual,
                                feature: feature.clone(),
                            },
                        );
                        stats.created += 1;
                    }
                    Err(err) => {
                        tracing::warn!(marker = %key, %err, "marker create failed; skipping");
                        stats.failed += 1;
                    }
                }
            }
        }

        // Sweep: anything this pass did not touch leaves the map.
        let stale: Vec<MarkerKey> = self
            .registry
            .records
            .keys()
            .filter(|key| !touched.contains(*key))
            .cloned()
            .collect();
        for key in stale {
            if let Some(record) = self.registry.records.remove(&key) {
                if let Err(err) = engine.remove_overlay(record.overlay) {
                    tracing::warn!(marker = %key, %err, "overlay removal failed");
                }
                stats.removed += 1;
            }
        }

        tracing::debug!(
            created = stats.created,
            updated = stats.updated,
            removed = stats.removed,
            failed = stats.failed,
            live = self.registry.len(),
            "reconcile pass"
        );
        stats
    }

    /// Re-project every live marker, fresh from its feature's coordinate.
    /// Called on every map redraw so markers track the camera exactly.
    pub fn reposition_all<E: MapEngine>(&mut self, engine: &mut E) {
        for (key, record) in &self.registry.records {
            let moved = engine
                .project(record.feature.lnglat())
                .map_err(Into::into)
                .and_then(|at| engine.move_overlay(record.overlay, at));
            if let Err(err) = moved {
                tracing::warn!(marker = %key, %err, "reposition failed");
            }
        }
    }

    /// Re-derive point-marker visuals from the active venue. Clusters are
    /// untouched.
    pub fn refresh_highlights<E: MapEngine>(
        &mut self,
        engine: &mut E,
        active_venue: Option<&VenueId>,
    ) {
        for (key, record) in &mut self.registry.records {
            let visual = visual_for(&record.feature, active_venue);
            if record.visual == visual {
                continue;
            }
            match engine.update_overlay_visual(record.overlay, visual) {
                Ok(()) => record.visual = visual,
                Err(err) => tracing::warn!(marker = %key, %err, "visual refresh failed"),
            }
        }
    }

    /// Keep the degraded native tier in sync with the overlay registry.
    ///
    /// When the registry came out of a reconcile attempt empty while
    /// coordinate-bearing venues exist, each such venue gets one plain
    /// native marker (no clustering). The tier is torn down as soon as the
    /// registry holds overlays again.
    pub fn sync_fallback<E: MapEngine>(&mut self, engine: &mut E, venues: &[Venue]) {
        let placeable = venues.iter().filter_map(Venue::coordinate);
        let needs_fallback = self.registry.is_empty() && placeable.clone().next().is_some();

        if !needs_fallback {
            if !self.fallback.is_empty() {
                tracing::info!(count = self.fallback.len(), "tearing down native fallback");
                self.clear_fallback(engine);
            }
            return;
        }
        if !self.fallback.is_empty() {
            // Venue set may have changed under us; rebuild the tier.
            self.clear_fallback(engine);
        }
        for lnglat in placeable {
            match engine.add_native_marker(lnglat) {
                Ok(id) => self.fallback.push(id),
                Err(err) => tracing::warn!(%err, "native marker placement failed"),
            }
        }
        tracing::info!(count = self.fallback.len(), "native fallback active");
    }

    /// Remove everything this manager placed on the engine.
    pub fn teardown<E: MapEngine>(&mut self, engine: &mut E) {
        let stale: Vec<MarkerKey> = self.registry.records.keys().cloned().collect();
        for key in stale {
            if let Some(record) = self.registry.records.remove(&key) {
                if let Err(err) = engine.remove_overlay(record.overlay) {
                    tracing::warn!(marker = %key, %err, "overlay removal failed");
                }
            }
        }
        self.clear_fallback(engine);
    }

    fn clear_fallback<E: MapEngine>(&mut self, engine: &mut E) {
        for id in self.fallback.drain(..) {
            let _ = engine.remove_native_marker(id);
        }
    }
}

/// The appearance a feature should have right now.
fn visual_for(feature: &Feature, active_venue: Option<&VenueId>) -> MarkerVisual {
    match feature {
        Feature::Cluster { point_count, .. } => MarkerVisual::ClusterBadge {
            count: *point_count,
        },
        Feature::Point { venue_id, .. } => MarkerVisual::Pin {
            highlighted: active_venue == Some(venue_id),
        },
    }
}
