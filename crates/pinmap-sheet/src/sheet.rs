#![forbid(unsafe_code)]

//! The bottom sheet state machine.
//!
//! # State Machine
//!
//! Three snap points — collapsed (25%), mid (60%), expanded (95%) of the
//! *frozen* viewport height — with a continuous height during drags:
//!
//! - **Idle**: height equals the current snap height (or a spring is
//!   settling toward it).
//! - **Dragging**: a touch claimed the sheet; height tracks the finger 1:1
//!   (clamped to the collapsed..expanded range) and the inner content's
//!   scroll is reported locked.
//! - **Settling**: on release, a fling advances one snap step in the swipe
//!   direction; otherwise the sheet settles on the nearest snap height. A
//!   spring seeded with the release velocity carries the motion through.
//!
//! # Invariants
//!
//! 1. The frozen viewport height never changes after construction; the
//!    keyboard inset is additive bottom padding only.
//! 2. While `dragging`, the drag owns the height: [`BottomSheet::snap_to`]
//!    is rejected until release.
//! 3. An ineligible touch ([`BottomSheet::touch_start`] returning `false`)
//!    mutates nothing — native scrolling keeps the gesture.
//!
//! # Failure Modes
//!
//! - `touch_move`/`touch_end` without a preceding eligible `touch_start`
//!   are no-ops; the browser can deliver orphaned events after a cancel.

use std::time::Duration;

use crate::spring::Spring;
use crate::velocity::VelocityTracker;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds and physics for the sheet gesture module.
///
/// One configurable module parameterizes every call site; embedded variants
/// construct their own config instead of duplicating the physics.
#[derive(Debug, Clone, Copy)]
pub struct SheetConfig {
    /// Height of the drag-handle region at the top of the sheet (default: 60px).
    pub handle_height_px: f64,
    /// Content counts as "scrolled to top" below this scroll offset (default: 5px).
    pub scroll_top_slack_px: f64,
    /// Release speed beyond which a drag is a fling (default: 0.5 px/ms).
    pub fling_velocity_px_ms: f64,
    /// Minimum total drag distance for a fling (default: 50px).
    pub min_fling_distance_px: f64,
    /// Velocity sample retention window (default: 100ms).
    pub velocity_window_ms: f64,
    /// Viewport shrinkage beyond this is treated as the on-screen keyboard
    /// (default: 150px).
    pub keyboard_threshold_px: f64,
    /// Snap heights as fractions of the frozen viewport (default: 25/60/95%).
    pub snap_fractions: [f64; 3],
    /// Spring stiffness (default: 300).
    pub spring_stiffness: f64,
    /// Spring damping (default: 30).
    pub spring_damping: f64,
    /// Spring mass (default: 0.8).
    pub spring_mass: f64,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            handle_height_px: 60.0,
            scroll_top_slack_px: 5.0,
            fling_velocity_px_ms: 0.5,
            min_fling_distance_px: 50.0,
            velocity_window_ms: 100.0,
            keyboard_threshold_px: 150.0,
            snap_fractions: [0.25, 0.60, 0.95],
            spring_stiffness: 300.0,
            spring_damping: 30.0,
            spring_mass: 0.8,
        }
    }
}

impl SheetConfig {
    /// Set the handle region height (builder pattern).
    #[must_use]
    pub fn with_handle_height(mut self, px: f64) -> Self {
        self.handle_height_px = px.max(0.0);
        self
    }

    /// Set the fling thresholds (builder pattern).
    #[must_use]
    pub fn with_fling_thresholds(mut self, velocity_px_ms: f64, min_distance_px: f64) -> Self {
        self.fling_velocity_px_ms = velocity_px_ms.max(0.0);
        self.min_fling_distance_px = min_distance_px.max(0.0);
        self
    }

    /// Set the snap fractions, each clamped to (0, 1] (builder pattern).
    #[must_use]
    pub fn with_snap_fractions(mut self, fractions: [f64; 3]) -> Self {
        self.snap_fractions = fractions.map(|f| f.clamp(0.01, 1.0));
        self
    }
}

// ---------------------------------------------------------------------------
// Snap points
// ---------------------------------------------------------------------------

/// One of the three discrete resting heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SnapPoint {
    /// Peeking above the map (25% of the frozen viewport by default).
    Collapsed,
    /// Half-open (60%).
    Mid,
    /// Nearly full-screen (95%).
    Expanded,
}

impl SnapPoint {
    const ALL: [Self; 3] = [Self::Collapsed, Self::Mid, Self::Expanded];

    /// The next-larger snap point, clamped at the top.
    #[must_use]
    pub fn step_up(self) -> Self {
        match self {
            Self::Collapsed => Self::Mid,
            Self::Mid | Self::Expanded => Self::Expanded,
        }
    }

    /// The next-smaller snap point, clamped at the bottom.
    #[must_use]
    pub fn step_down(self) -> Self {
        match self {
            Self::Expanded => Self::Mid,
            Self::Mid | Self::Collapsed => Self::Collapsed,
        }
    }

    fn fraction(self, config: &SheetConfig) -> f64 {
        match self {
            Self::Collapsed => config.snap_fractions[0],
            Self::Mid => config.snap_fractions[1],
            Self::Expanded => config.snap_fractions[2],
        }
    }
}

/// Where a touch sequence began.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchOrigin {
    /// Inside the handle region at the top of the sheet.
    Handle,
    /// Inside the scrollable content, at the given scroll offset.
    Content {
        /// The content's `scrollTop` when the touch began.
        scroll_top: f64,
    },
}

/// Observable drawer state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawerState {
    /// The snap point the sheet is at (or settling toward).
    pub snap: SnapPoint,
    /// Current height in pixels; continuous during drags.
    pub height_px: f64,
    /// Whether a drag currently owns the height.
    pub dragging: bool,
}

// ---------------------------------------------------------------------------
// BottomSheet
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct DragState {
    start_y: f64,
    start_height: f64,
    last_y: f64,
    tracker: VelocityTracker,
}

/// The gesture-driven bottom sheet.
///
/// Constructed per view instance; callers needing the imperative API
/// ([`snap_to`](Self::snap_to), [`current_snap`](Self::current_snap)) hold
/// a reference to this object for the view's lifetime — there is no
/// process-global sheet.
#[derive(Debug)]
pub struct BottomSheet {
    config: SheetConfig,
    /// Viewport height frozen at mount; snap geometry never drifts.
    viewport_px: f64,
    snap: SnapPoint,
    height_px: f64,
    keyboard_inset_px: f64,
    drag: Option<DragState>,
    spring: Option<Spring>,
}

impl BottomSheet {
    /// Create a sheet for a viewport of `viewport_px`, resting at `initial`.
    #[must_use]
    pub fn new(config: SheetConfig, viewport_px: f64, initial: SnapPoint) -> Self {
        let mut sheet = Self {
            config,
            viewport_px: viewport_px.max(1.0),
            snap: initial,
            height_px: 0.0,
            keyboard_inset_px: 0.0,
            drag: None,
            spring: None,
        };
        sheet.height_px = sheet.snap_height(initial);
        sheet
    }

    /// Pixel height of a snap point against the frozen viewport.
    #[must_use]
    pub fn snap_height(&self, snap: SnapPoint) -> f64 {
        snap.fraction(&self.config) * self.viewport_px
    }

    /// Current sheet height in pixels.
    #[inline]
    #[must_use]
    pub fn height_px(&self) -> f64 {
        self.height_px
    }

    /// The snap point the sheet rests at or is settling toward.
    #[inline]
    #[must_use]
    pub fn current_snap(&self) -> SnapPoint {
        self.snap
    }

    /// Whether a drag currently owns the height.
    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Whether a settle animation is in flight.
    #[inline]
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.spring.as_ref().is_some_and(|s| !s.is_at_rest())
    }

    /// Whether the inner content may scroll; locked while dragging.
    #[inline]
    #[must_use]
    pub fn content_scroll_enabled(&self) -> bool {
        self.drag.is_none()
    }

    /// Additive bottom padding compensating for the on-screen keyboard.
    #[inline]
    #[must_use]
    pub fn keyboard_inset_px(&self) -> f64 {
        self.keyboard_inset_px
    }

    /// Snapshot of the observable state.
    #[must_use]
    pub fn state(&self) -> DrawerState {
        DrawerState {
            snap: self.snap,
            height_px: self.height_px,
            dragging: self.drag.is_some(),
        }
    }

    /// Report viewport measurements. Shrinkage beyond the keyboard
    /// threshold becomes additive bottom padding; snap geometry is never
    /// recalculated.
    pub fn set_viewport_metrics(&mut self, window_height: f64, visual_viewport_height: f64) {
        let shrinkage = window_height - visual_viewport_height;
        self.keyboard_inset_px = if shrinkage > self.config.keyboard_threshold_px {
            shrinkage
        } else {
            0.0
        };
    }

    /// Classify where a touch landed, measured from the sheet's top edge.
    ///
    /// Touches within the handle region are always drag-eligible; deeper
    /// touches belong to the content and carry its scroll offset into the
    /// [`touch_start`](Self::touch_start) eligibility check.
    #[must_use]
    pub fn classify_touch(&self, y_from_sheet_top: f64, scroll_top: f64) -> TouchOrigin {
        if y_from_sheet_top <= self.config.handle_height_px {
            TouchOrigin::Handle
        } else {
            TouchOrigin::Content { scroll_top }
        }
    }

    /// Begin a touch sequence. Returns whether the sheet claimed the drag.
    ///
    /// Eligibility: the touch starts in the handle region, or the inner
    /// content is scrolled to its top. An ineligible touch leaves all state
    /// untouched and the gesture to native scrolling.
    pub fn touch_start(&mut self, y: f64, t_ms: f64, origin: TouchOrigin) -> bool {
        let eligible = match origin {
            TouchOrigin::Handle => true,
            TouchOrigin::Content { scroll_top } => scroll_top <= self.config.scroll_top_slack_px,
        };
        if !eligible {
            return false;
        }

        // A new drag supersedes a settle in flight.
        self.spring = None;
        let mut tracker = VelocityTracker::new(self.config.velocity_window_ms);
        tracker.push(t_ms, y);
        self.drag = Some(DragState {
            start_y: y,
            start_height: self.height_px,
            last_y: y,
            tracker,
        });
        true
    }

    /// Track a touch move. Height follows the finger 1:1, clamped to the
    /// collapsed..expanded range. Returns the new height while dragging.
    pub fn touch_move(&mut self, y: f64, t_ms: f64) -> Option<f64> {
        let collapsed = self.snap_height(SnapPoint::Collapsed);
        let expanded = self.snap_height(SnapPoint::Expanded);
        let drag = self.drag.as_mut()?;

        drag.last_y = y;
        drag.tracker.push(t_ms, y);
        self.height_px = (drag.start_height + (drag.start_y - y)).clamp(collapsed, expanded);
        Some(self.height_px)
    }

    /// End the touch sequence and resolve the release.
    ///
    /// A fling (speed above the velocity threshold *and* travel above the
    /// minimum distance) advances one snap step in the swipe direction;
    /// anything else settles on the snap height nearest the release height.
    pub fn touch_end(&mut self, _t_ms: f64) -> SnapPoint {
        let Some(drag) = self.drag.take() else {
            return self.snap;
        };

        let velocity = drag.tracker.velocity(); // px/ms; positive = finger moving down
        let distance = (drag.last_y - drag.start_y).abs();

        let is_fling = velocity.abs() > self.config.fling_velocity_px_ms
            && distance > self.config.min_fling_distance_px;
        let target = if is_fling {
            if velocity < 0.0 {
                self.snap.step_up()
            } else {
                self.snap.step_down()
            }
        } else {
            self.nearest_snap(self.height_px)
        };

        tracing::debug!(
            from = ?self.snap,
            to = ?target,
            velocity_px_ms = velocity,
            distance_px = distance,
            fling = is_fling,
            "sheet release"
        );

        // Sheet height grows as the finger moves up, so the spring seed is
        // the sample velocity with its sign inverted (and scaled to px/s).
        self.settle(target, -velocity * 1000.0);
        target
    }

    /// Abort the drag; the content scroll claimed the gesture. The sheet
    /// springs back to the snap point it started from.
    pub fn cancel_drag(&mut self) {
        if self.drag.take().is_some() {
            tracing::debug!(snap = ?self.snap, "sheet drag cancelled");
            self.settle(self.snap, 0.0);
        }
    }

    /// Programmatically move to a snap point (backdrop tap, recenter
    /// button, …). Rejected while a drag is active — the drag is
    /// authoritative until release. Returns whether the write was accepted.
    pub fn snap_to(&mut self, snap: SnapPoint) -> bool {
        if self.drag.is_some() {
            return false;
        }
        self.settle(snap, 0.0);
        true
    }

    /// Advance the settle animation. Returns the current height.
    pub fn tick(&mut self, dt: Duration) -> f64 {
        if let Some(spring) = self.spring.as_mut() {
            spring.advance(dt);
            self.height_px = spring.position();
            if spring.is_at_rest() {
                self.spring = None;
            }
        }
        self.height_px
    }

    fn nearest_snap(&self, height: f64) -> SnapPoint {
        SnapPoint::ALL
            .into_iter()
            .min_by(|a, b| {
                let da = (self.snap_height(*a) - height).abs();
                let db = (self.snap_height(*b) - height).abs();
                da.total_cmp(&db)
            })
            .unwrap_or(self.snap)
    }

    /// Stop any in-flight spring and settle toward a snap point.
    fn settle(&mut self, target: SnapPoint, seed_velocity_px_s: f64) {
        self.snap = target;
        let target_px = self.snap_height(target);
        if (self.height_px - target_px).abs() < 0.5 && seed_velocity_px_s.abs() < 1.0 {
            self.height_px = target_px;
            self.spring = None;
            return;
        }
        self.spring = Some(
            Spring::new(self.height_px, target_px)
                .with_stiffness(self.config.spring_stiffness)
                .with_damping(self.config.spring_damping)
                .with_mass(self.config.spring_mass)
                .with_velocity(seed_velocity_px_s),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
