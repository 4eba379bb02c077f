#![forbid(unsafe_code)]

//! Query-result features and the composition key.

use pinmap_geo::{LngLat, VenueId};

/// Stable numeric cluster id, unique within one index build.
pub type ClusterId = u64;

/// A visible feature returned by a viewport query: either an individual
/// venue point or an aggregate cluster.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    /// A single venue.
    Point {
        /// The venue this point represents.
        venue_id: VenueId,
        /// The venue's normalized coordinate.
        lnglat: LngLat,
    },
    /// An aggregate of nearby points.
    Cluster {
        /// Stable id for this build; keys the marker registry and drives
        /// expansion-zoom lookups.
        cluster_id: ClusterId,
        /// Weighted centroid of the constituent points.
        lnglat: LngLat,
        /// Number of venues aggregated under this cluster.
        point_count: u32,
    },
}

impl Feature {
    /// Geographic position of the feature.
    #[inline]
    #[must_use]
    pub fn lnglat(&self) -> LngLat {
        match self {
            Self::Point { lnglat, .. } | Self::Cluster { lnglat, .. } => *lnglat,
        }
    }

    /// Whether this feature is a cluster.
    #[inline]
    #[must_use]
    pub fn is_cluster(&self) -> bool {
        matches!(self, Self::Cluster { .. })
    }

    /// Composition-key fragment: `c:<id>:<count>` / `p:<venueId>`.
    #[must_use]
    pub fn composition_fragment(&self) -> String {
        match self {
            Self::Point { venue_id, .. } => format!("p:{venue_id}"),
            Self::Cluster {
                cluster_id,
                point_count,
                ..
            } => format!("c:{cluster_id}:{point_count}"),
        }
    }
}

/// Fingerprint of a query result.
///
/// Fragments are sorted before joining so the key is insensitive to the
/// engine's unguaranteed result ordering. An unchanged key means the
/// visible feature set did not change and all downstream reconciliation
/// work can be skipped.
#[must_use]
pub fn composition_key(features: &[Feature]) -> String {
    let mut fragments: Vec<String> = features.iter().map(Feature::composition_fragment).collect();
    fragments.sort_unstable();
    fragments.join("|")
}
