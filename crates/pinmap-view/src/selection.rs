#![forbid(unsafe_code)]

//! Selection state shared by the map and the card list.
//!
//! Two independent, nullable ids: `active_venue` is the hover/scroll
//! highlight, `selected_venue` is the explicit pick that drives the
//! popover. Clearing one never touches the other.

use pinmap_geo::VenueId;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    active_venue: Option<VenueId>,
    selected_venue: Option<VenueId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn active_venue(&self) -> Option<&VenueId> {
        self.active_venue.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn selected_venue(&self) -> Option<&VenueId> {
        self.selected_venue.as_ref()
    }

    /// Set the hover highlight. Returns whether it changed.
    pub fn set_active(&mut self, venue: Option<VenueId>) -> bool {
        if self.active_venue == venue {
            return false;
        }
        self.active_venue = venue;
        true
    }

    /// Set the explicit pick. Returns whether it changed.
    pub fn set_selected(&mut self, venue: Option<VenueId>) -> bool {
        if self.selected_venue == venue {
            return false;
        }
        self.selected_venue = venue;
        true
    }

    /// A marker or card click: both ids move to the venue at once.
    pub fn pick(&mut self, venue: VenueId) {
        self.active_venue = Some(venue.clone());
        self.selected_venue = Some(venue);
    }

    pub fn clear(&mut self) {
        self.active_venue = None;
        self.selected_venue = None;
    }
}
