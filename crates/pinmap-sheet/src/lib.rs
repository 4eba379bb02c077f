#![forbid(unsafe_code)]

//! Gesture-driven bottom sheet: a three-snap height state machine.
//!
//! # Role in pinmap
//! The bottom sheet coexists with an internally-scrolling venue list on top
//! of the map. This crate owns the gesture state machine, the velocity
//! sampling, and the spring physics; the host forwards raw touch events
//! (with their own timestamps) and applies the heights this crate reports.
//!
//! # Primary responsibilities
//! - **[`BottomSheet`]**: drag eligibility, 1:1 height tracking, release
//!   resolution (fling vs. nearest snap), scroll coordination.
//! - **[`VelocityTracker`]**: rolling ~100ms sample window in px/ms.
//! - **[`Spring`]**: damped harmonic oscillator settling the sheet onto a
//!   snap point, seeded with the release velocity.
//!
//! # Invariants
//!
//! 1. The viewport height used for snap geometry is frozen at construction
//!    and never recalculated; the on-screen-keyboard inset is purely
//!    additive padding.
//! 2. While a drag is active, the drag is authoritative: external height
//!    writes (`snap_to`) are rejected until release.
//! 3. A touch that is not drag-eligible changes no state at all — it is
//!    left entirely to native scrolling.

pub mod sheet;
pub mod spring;
pub mod velocity;

pub use sheet::{BottomSheet, DrawerState, SheetConfig, SnapPoint, TouchOrigin};
pub use spring::Spring;
pub use velocity::VelocityTracker;
