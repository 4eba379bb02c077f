#![forbid(unsafe_code)]

//! Map view core: engine abstraction, marker overlay manager, popover
//! positioner, and the event-driven view controller.
//!
//! The host (whatever owns the real map widget) implements [`MapEngine`]
//! and forwards its callbacks — map idle, marker clicks, card hovers —
//! into a [`MapViewController`]. The controller answers with
//! [`ViewEffect`]s the host applies; it never calls back into the host
//! except through the engine trait.
//!
//! # Invariants
//!
//! 1. [`MarkerRegistry`] is the single source of truth for live markers;
//!    it is mutated only by the overlay manager.
//! 2. All mutation is synchronous inside one host callback. There are no
//!    await points and no interior mutability in this crate.
//! 3. Per-marker engine failures are isolated: one bad marker is dropped
//!    and logged, the rest of the pass proceeds.

pub mod controller;
pub mod engine;
pub mod error;
pub mod marker;
pub mod popover;
pub mod selection;
pub mod testing;

pub use controller::{MapViewController, ViewEffect};
pub use engine::{MapEngine, MarkerVisual, NativeMarkerId, OverlayId, Viewport};
pub use error::{EngineError, MapViewError, ProjectError};
pub use marker::{MarkerKey, MarkerRecord, MarkerRegistry, OverlayManager, ReconcileStats};
pub use popover::{Placement, PopoverLayout, PopoverPosition, position_popover};
pub use selection::Selection;
