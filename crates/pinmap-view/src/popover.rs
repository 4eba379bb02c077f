#![forbid(unsafe_code)]

//! Popover placement for the selected venue.
//!
//! Pure geometry: given the marker's screen anchor, the viewport, and the
//! popover's measured size, compute where the card goes. Horizontal is a
//! straight clamp inside the margins; vertical prefers "above the marker",
//! flips below when the sticky header would occlude it, and pins beneath
//! the header when "below" itself leaves the viewport.
//!
//! Callers skip positioning entirely while the map's projection is
//! unavailable; this module never sees an anchor it should distrust.

use pinmap_geo::ScreenPoint;

use crate::engine::Viewport;

/// Default gap kept between the popover and either viewport edge.
pub const EDGE_MARGIN_PX: f64 = 12.0;

/// Measured popover box plus the layout context it must respect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopoverLayout {
    /// Rendered popover width in pixels.
    pub width: f64,
    /// Rendered popover height in pixels.
    pub height: f64,
    /// Minimum gap to either viewport edge.
    pub margin: f64,
    /// Y of the sticky header's bottom edge; nothing may render above it.
    pub header_bottom: f64,
}

impl PopoverLayout {
    #[must_use]
    pub const fn new(width: f64, height: f64, header_bottom: f64) -> Self {
        Self {
            width,
            height,
            margin: EDGE_MARGIN_PX,
            header_bottom,
        }
    }
}

/// Which vertical strategy won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Above the anchor, the preferred placement.
    Above,
    /// Below the anchor; chosen when "above" would cross the header.
    Below,
    /// Pinned directly beneath the header; the marker is not followed.
    PinnedBelowHeader,
}

/// Resolved top-left corner for the popover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopoverPosition {
    pub x: f64,
    pub y: f64,
    pub placement: Placement,
}

/// Compute the popover's top-left corner for a marker at `anchor`.
#[must_use]
pub fn position_popover(
    anchor: ScreenPoint,
    viewport: Viewport,
    layout: &PopoverLayout,
) -> PopoverPosition {
    // Centered on the anchor, then clamped inside the margins. A viewport
    // narrower than popover + margins degenerates to the left margin.
    let max_x = (viewport.width - layout.width - layout.margin).max(layout.margin);
    let x = (anchor.x - layout.width / 2.0).clamp(layout.margin, max_x);

    let above = anchor.y - layout.height;
    if above >= layout.header_bottom {
        return PopoverPosition {
            x,
            y: above,
            placement: Placement::Above,
        };
    }

    let below = anchor.y;
    if below + layout.height <= viewport.height {
        return PopoverPosition {
            x,
            y: below,
            placement: Placement::Below,
        };
    }

    PopoverPosition {
        x,
        y: layout.header_bottom,
        placement: Placement::PinnedBelowHeader,
    }
}
