#![forbid(unsafe_code)]

//! The clustering index: build and query.
//!
//! # Scheme
//!
//! Indexing follows the classic hierarchical greedy scheme: level
//! `max_zoom + 1` holds the raw normalized points, and each level `z` from
//! `max_zoom` down to `min_zoom` is produced by clustering the level above
//! it. An entry within `radius_px / world_size(z)` world units of a seed is
//! absorbed into a cluster positioned at the members' count-weighted
//! centroid. Entries that absorb nothing are carried through unchanged, so
//! a cluster keeps its id across every zoom level at which it survives.
//!
//! Neighbor lookup uses a spatial hash with cell size equal to the cluster
//! radius, so all candidates live in the seed's 3×3 cell neighborhood.
//!
//! # Failure Modes
//!
//! - Venues without a resolvable coordinate are skipped at build time —
//!   silently, by contract.
//! - A bbox spanning the antimeridian is split into two longitude ranges;
//!   a degenerate bbox simply matches nothing.

use ahash::AHashMap;
use std::hash::{Hash, Hasher};

use pinmap_geo::projection::{project, unproject, world_size};
use pinmap_geo::{BoundingBox, LngLat, Venue, VenueId};

use crate::feature::{ClusterId, Feature};

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Tunable parameters for index construction.
#[derive(Debug, Clone, Copy)]
pub struct ClusterParams {
    /// Clustering radius in screen pixels (default: 60).
    pub radius_px: f64,
    /// Lowest zoom level with a clustered tier (default: 0).
    pub min_zoom: u8,
    /// Highest zoom level with a clustered tier (default: 18). Expansion
    /// zooms are clamped here.
    pub max_zoom: u8,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            radius_px: 60.0,
            min_zoom: 0,
            max_zoom: 18,
        }
    }
}

impl ClusterParams {
    /// Set the clustering radius in pixels (builder pattern).
    #[must_use]
    pub fn with_radius_px(mut self, radius_px: f64) -> Self {
        self.radius_px = radius_px.max(1.0);
        self
    }

    /// Set the zoom range (builder pattern). `max` is clamped to 24 and
    /// raised to at least `min`.
    #[must_use]
    pub fn with_zoom_range(mut self, min: u8, max: u8) -> Self {
        self.min_zoom = min.min(24);
        self.max_zoom = max.clamp(self.min_zoom, 24);
        self
    }
}

// ---------------------------------------------------------------------------
// Internal storage
// ---------------------------------------------------------------------------

/// A normalized venue point, projected once at build time.
#[derive(Debug, Clone)]
struct PointSlot {
    venue_id: VenueId,
    lnglat: LngLat,
}

/// What a level entry stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    /// Index into the point slots.
    Point(u32),
    /// A cluster node id.
    Cluster(ClusterId),
}

/// One entry of one zoom level, in world coordinates.
#[derive(Debug, Clone, Copy)]
struct Entry {
    x: f64,
    y: f64,
    count: u32,
    kind: EntryKind,
}

/// Bookkeeping for a cluster: the zoom it formed at and the level-above
/// entries it absorbed.
#[derive(Debug, Clone)]
struct ClusterNode {
    zoom: u8,
    children: Vec<Entry>,
}

// ---------------------------------------------------------------------------
// ClusterIndex
// ---------------------------------------------------------------------------

/// An immutable multi-level clustering index over a venue set.
///
/// Build once per venue set (memoize via [`source_key`]); query on every
/// map-idle event. Never rebuilt on pan/zoom.
#[derive(Debug)]
pub struct ClusterIndex {
    params: ClusterParams,
    points: Vec<PointSlot>,
    /// `levels[z]` holds the entries visible at integer zoom `z`;
    /// `levels[max_zoom + 1]` is the raw-point tier.
    levels: Vec<Vec<Entry>>,
    clusters: Vec<ClusterNode>,
}

impl ClusterIndex {
    /// Build an index from venue records.
    ///
    /// Venues whose location cannot be normalized are excluded — they stay
    /// in the host's list but never reach the map.
    #[must_use]
    pub fn build(venues: &[Venue], params: ClusterParams) -> Self {
        let points = venues
            .iter()
            .filter_map(|venue| {
                venue.coordinate().map(|lnglat| PointSlot {
                    venue_id: venue.id.clone(),
                    lnglat,
                })
            })
            .collect();
        Self::from_slots(points, params)
    }

    /// Build an index from already-normalized points.
    #[must_use]
    pub fn from_points(points: Vec<(VenueId, LngLat)>, params: ClusterParams) -> Self {
        let slots = points
            .into_iter()
            .map(|(venue_id, lnglat)| PointSlot { venue_id, lnglat })
            .collect();
        Self::from_slots(slots, params)
    }

    fn from_slots(points: Vec<PointSlot>, params: ClusterParams) -> Self {
        let raw_tier = usize::from(params.max_zoom) + 1;
        let mut levels = vec![Vec::new(); raw_tier + 1];
        levels[raw_tier] = points
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                let (x, y) = project(slot.lnglat);
                Entry {
                    x,
                    y,
                    count: 1,
                    kind: EntryKind::Point(i as u32),
                }
            })
            .collect();

        let mut clusters = Vec::new();
        for z in (params.min_zoom..=params.max_zoom).rev() {
            let clustered = cluster_level(
                &levels[usize::from(z) + 1],
                z,
                params.radius_px,
                &mut clusters,
            );
            levels[usize::from(z)] = clustered;
        }

        Self {
            params,
            points,
            levels,
            clusters,
        }
    }

    /// Number of points that made it into the index.
    #[inline]
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// The parameters this index was built with.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &ClusterParams {
        &self.params
    }

    /// Visible features for a viewport.
    ///
    /// `zoom` is the *rounded* integer of the continuous map zoom; it is
    /// clamped to `[min_zoom, max_zoom + 1]`, where the top tier returns
    /// raw points only.
    #[must_use]
    pub fn query(&self, bbox: BoundingBox, zoom: i64) -> Vec<Feature> {
        let tier = zoom.clamp(
            i64::from(self.params.min_zoom),
            i64::from(self.params.max_zoom) + 1,
        );
        // Clamp keeps the value within usize range.
        let level = &self.levels[tier as usize];

        let min_x = pinmap_geo::projection::world_x(bbox.west);
        let max_x = pinmap_geo::projection::world_x(bbox.east);
        // North latitude is the smaller world y.
        let min_y = pinmap_geo::projection::world_y(bbox.north);
        let max_y = pinmap_geo::projection::world_y(bbox.south);

        level
            .iter()
            .filter(|entry| {
                if entry.y < min_y || entry.y > max_y {
                    return false;
                }
                if bbox.crosses_antimeridian() {
                    entry.x >= min_x || entry.x <= max_x
                } else {
                    entry.x >= min_x && entry.x <= max_x
                }
            })
            .map(|entry| self.feature_of(entry))
            .collect()
    }

    /// The minimum zoom at which a cluster splits into more than one
    /// feature, clamped to `max_zoom`. `None` for an unknown id.
    ///
    /// A node records the zoom it formed at, and it only forms when at
    /// least two entries merge, so one level deeper its children are
    /// separate again.
    #[must_use]
    pub fn expansion_zoom(&self, cluster_id: ClusterId) -> Option<u8> {
        let node = self.cluster_node(cluster_id)?;
        Some((node.zoom + 1).min(self.params.max_zoom))
    }

    /// The direct children a cluster splits into one zoom level deeper.
    #[must_use]
    pub fn cluster_children(&self, cluster_id: ClusterId) -> Option<Vec<Feature>> {
        let node = self.cluster_node(cluster_id)?;
        Some(node.children.iter().map(|e| self.feature_of(e)).collect())
    }

    /// Every individual point aggregated under a cluster.
    #[must_use]
    pub fn cluster_leaves(&self, cluster_id: ClusterId) -> Option<Vec<Feature>> {
        let node = self.cluster_node(cluster_id)?;
        let mut leaves = Vec::with_capacity(node.children.len());
        let mut stack: Vec<&Entry> = node.children.iter().collect();
        while let Some(entry) = stack.pop() {
            match entry.kind {
                EntryKind::Point(_) => leaves.push(self.feature_of(entry)),
                EntryKind::Cluster(id) => {
                    if let Some(child) = self.cluster_node(id) {
                        stack.extend(child.children.iter());
                    }
                }
            }
        }
        Some(leaves)
    }

    fn cluster_node(&self, cluster_id: ClusterId) -> Option<&ClusterNode> {
        usize::try_from(cluster_id)
            .ok()
            .and_then(|i| self.clusters.get(i))
    }

    fn feature_of(&self, entry: &Entry) -> Feature {
        match entry.kind {
            EntryKind::Point(i) => {
                let slot = &self.points[i as usize];
                Feature::Point {
                    venue_id: slot.venue_id.clone(),
                    lnglat: slot.lnglat,
                }
            }
            EntryKind::Cluster(cluster_id) => Feature::Cluster {
                cluster_id,
                lnglat: unproject(entry.x, entry.y),
                point_count: entry.count,
            },
        }
    }
}

/// Fingerprint of a venue set, for rebuild memoization.
///
/// The index is rebuilt only when this key changes — never on pan/zoom.
#[must_use]
pub fn source_key(venues: &[Venue]) -> u64 {
    let mut hasher = ahash::AHasher::default();
    venues.len().hash(&mut hasher);
    for venue in venues {
        venue.id.hash(&mut hasher);
        match venue.coordinate() {
            Some(point) => {
                point.lng.to_bits().hash(&mut hasher);
                point.lat.to_bits().hash(&mut hasher);
            }
            None => u64::MAX.hash(&mut hasher),
        }
    }
    hasher.finish()
}

// ---------------------------------------------------------------------------
// Level clustering
// ---------------------------------------------------------------------------

/// Cluster one level into the next-lower zoom tier.
fn cluster_level(
    prev: &[Entry],
    zoom: u8,
    radius_px: f64,
    clusters: &mut Vec<ClusterNode>,
) -> Vec<Entry> {
    let radius = radius_px / world_size(zoom);
    let radius_sq = radius * radius;

    // Spatial hash with cell size == radius: every neighbor within the
    // radius of a seed lives in its 3×3 cell neighborhood.
    let mut grid: AHashMap<(i64, i64), Vec<u32>> = AHashMap::with_capacity(prev.len());
    for (i, entry) in prev.iter().enumerate() {
        grid.entry(cell_of(entry.x, entry.y, radius))
            .or_default()
            .push(i as u32);
    }

    let mut used = vec![false; prev.len()];
    let mut out = Vec::with_capacity(prev.len());

    for i in 0..prev.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let seed = prev[i];

        let mut members = vec![i];
        let (cell_x, cell_y) = cell_of(seed.x, seed.y, radius);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = grid.get(&(cell_x + dx, cell_y + dy)) else {
                    continue;
                };
                for &j in bucket {
                    let j = j as usize;
                    if used[j] {
                        continue;
                    }
                    let other = prev[j];
                    let ddx = other.x - seed.x;
                    let ddy = other.y - seed.y;
                    if ddx * ddx + ddy * ddy <= radius_sq {
                        used[j] = true;
                        members.push(j);
                    }
                }
            }
        }

        if members.len() == 1 {
            // Nothing absorbed: the entry survives to this tier unchanged,
            // keeping its id stable across zoom levels.
            out.push(seed);
            continue;
        }

        let mut total: u32 = 0;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut children = Vec::with_capacity(members.len());
        for &m in &members {
            let entry = prev[m];
            total += entry.count;
            let weight = f64::from(entry.count);
            sum_x += entry.x * weight;
            sum_y += entry.y * weight;
            children.push(entry);
        }

        let cluster_id = clusters.len() as ClusterId;
        clusters.push(ClusterNode { zoom, children });
        out.push(Entry {
            x: sum_x / f64::from(total),
            y: sum_y / f64::from(total),
            count: total,
            kind: EntryKind::Cluster(cluster_id),
        });
    }

    out
}

#[inline]
fn cell_of(x: f64, y: f64, cell_size: f64) -> (i64, i64) {
    ((x / cell_size).floor() as i64, (y / cell_size).floor() as i64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
