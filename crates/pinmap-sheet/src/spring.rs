#![forbid(unsafe_code)]

//! Damped harmonic oscillator for sheet-height transitions.
//!
//! Classical damped spring with a mass term:
//!
//!   F = -stiffness × (position - target) - damping × velocity
//!   a = F / mass
//!
//! Positions are pixel heights, velocities px/s. Integration is
//! semi-implicit Euler with dt subdivision for stability; the sheet config
//! (stiffness 300, damping 30, mass 0.8) is close to critically damped, so
//! the settle continues the release motion without visible oscillation.
//!
//! # Invariants
//!
//! 1. A spring at rest stays at rest until retargeted or given velocity.
//! 2. Stiffness and mass are clamped to small positive minimums; damping
//!    to zero.
//!
//! # Failure Modes
//!
//! - Very large dt is subdivided into ≤4ms steps, so a long frame gap
//!   cannot make the integration explode.

use std::time::Duration;

/// Maximum dt per integration step (4ms); larger deltas are subdivided.
const MAX_STEP_SECS: f64 = 0.004;

/// Position delta below which the spring is considered at rest (px).
const REST_THRESHOLD_PX: f64 = 0.1;

/// Velocity below which (combined with the position threshold) the spring
/// is at rest (px/s).
const REST_VELOCITY_PX_S: f64 = 1.0;

const MIN_STIFFNESS: f64 = 0.1;
const MIN_MASS: f64 = 0.001;

/// A damped spring animating a pixel height toward a target.
#[derive(Debug, Clone)]
pub struct Spring {
    position: f64,
    velocity: f64,
    target: f64,
    stiffness: f64,
    damping: f64,
    mass: f64,
    at_rest: bool,
}

impl Spring {
    /// Create a spring starting at `position` and targeting `target`.
    #[must_use]
    pub fn new(position: f64, target: f64) -> Self {
        Self {
            position,
            velocity: 0.0,
            target,
            stiffness: 300.0,
            damping: 30.0,
            mass: 0.8,
            at_rest: false,
        }
    }

    /// Set stiffness (builder pattern). Clamped to a positive minimum.
    #[must_use]
    pub fn with_stiffness(mut self, k: f64) -> Self {
        self.stiffness = k.max(MIN_STIFFNESS);
        self
    }

    /// Set damping (builder pattern). Clamped to minimum 0.
    #[must_use]
    pub fn with_damping(mut self, c: f64) -> Self {
        self.damping = c.max(0.0);
        self
    }

    /// Set mass (builder pattern). Clamped to a positive minimum.
    #[must_use]
    pub fn with_mass(mut self, m: f64) -> Self {
        self.mass = m.max(MIN_MASS);
        self
    }

    /// Seed the spring with an initial velocity in px/s (builder pattern).
    #[must_use]
    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = velocity;
        self.at_rest = false;
        self
    }

    /// Current position in pixels.
    #[inline]
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Current velocity in px/s.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Current target in pixels.
    #[inline]
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Whether the spring has settled on the target.
    #[inline]
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.at_rest
    }

    /// Change the target, waking the spring if it moved meaningfully.
    pub fn retarget(&mut self, target: f64) {
        if (self.target - target).abs() > REST_THRESHOLD_PX {
            self.target = target;
            self.at_rest = false;
        }
    }

    fn step(&mut self, dt: f64) {
        let displacement = self.position - self.target;
        let force = -self.stiffness * displacement - self.damping * self.velocity;
        let acceleration = force / self.mass;
        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
    }

    /// Advance the spring by `dt`, subdividing for stability.
    pub fn advance(&mut self, dt: Duration) {
        if self.at_rest {
            return;
        }
        let total = dt.as_secs_f64();
        if total <= 0.0 {
            return;
        }

        let mut remaining = total;
        while remaining > 0.0 {
            let step_dt = remaining.min(MAX_STEP_SECS);
            self.step(step_dt);
            remaining -= step_dt;
        }

        if (self.position - self.target).abs() < REST_THRESHOLD_PX
            && self.velocity.abs() < REST_VELOCITY_PX_S
        {
            self.position = self.target;
            self.velocity = 0.0;
            self.at_rest = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_16: Duration = Duration::from_millis(16);

    fn simulate(spring: &mut Spring, frames: usize) {
        for _ in 0..frames {
            spring.advance(MS_16);
        }
    }

    #[test]
    fn reaches_target() {
        let mut spring = Spring::new(600.0, 250.0);
        simulate(&mut spring, 300);
        assert!(spring.is_at_rest());
        assert!((spring.position() - 250.0).abs() < 0.2);
    }

    #[test]
    fn sheet_parameters_do_not_overshoot_visibly() {
        let mut spring = Spring::new(600.0, 950.0);
        let mut max_pos: f64 = 600.0;
        for _ in 0..600 {
            spring.advance(MS_16);
            max_pos = max_pos.max(spring.position());
        }
        assert!(spring.is_at_rest());
        assert!(
            max_pos < 955.0,
            "sheet spring should settle with negligible overshoot, peaked at {max_pos}"
        );
    }

    #[test]
    fn seeded_velocity_continues_motion() {
        // Release velocity pushes toward the target before stiffness alone
        // would have moved it far.
        let seeded = {
            let mut s = Spring::new(480.0, 250.0).with_velocity(-800.0);
            s.advance(Duration::from_millis(32));
            s.position()
        };
        let unseeded = {
            let mut s = Spring::new(480.0, 250.0);
            s.advance(Duration::from_millis(32));
            s.position()
        };
        assert!(
            seeded < unseeded,
            "seeded {seeded} should run ahead of unseeded {unseeded}"
        );
    }

    #[test]
    fn at_rest_spring_ignores_advance() {
        let mut spring = Spring::new(250.0, 250.0);
        spring.advance(MS_16);
        assert!(spring.is_at_rest());
        let pos = spring.position();
        spring.advance(Duration::from_secs(2));
        assert!((spring.position() - pos).abs() < f64::EPSILON);
    }

    #[test]
    fn retarget_wakes() {
        let mut spring = Spring::new(250.0, 250.0);
        spring.advance(MS_16);
        assert!(spring.is_at_rest());
        spring.retarget(600.0);
        assert!(!spring.is_at_rest());
        simulate(&mut spring, 300);
        assert!((spring.position() - 600.0).abs() < 0.2);
    }

    #[test]
    fn retarget_within_threshold_stays_at_rest() {
        let mut spring = Spring::new(250.0, 250.0);
        spring.advance(MS_16);
        spring.retarget(250.05);
        assert!(spring.is_at_rest());
    }

    #[test]
    fn large_dt_subdivided() {
        let mut spring = Spring::new(950.0, 250.0);
        spring.advance(Duration::from_secs(5));
        assert!((spring.position() - 250.0).abs() < 0.2);
    }

    #[test]
    fn zero_dt_noop() {
        let mut spring = Spring::new(600.0, 250.0);
        spring.advance(Duration::ZERO);
        assert!((spring.position() - 600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn builder_clamps_degenerate_parameters() {
        let spring = Spring::new(0.0, 1.0)
            .with_stiffness(-10.0)
            .with_damping(-5.0)
            .with_mass(0.0);
        assert!(spring.stiffness >= MIN_STIFFNESS);
        assert!(spring.damping >= 0.0);
        assert!(spring.mass >= MIN_MASS);
    }

    #[test]
    fn deterministic_across_runs() {
        let run = || {
            let mut spring = Spring::new(600.0, 250.0).with_velocity(-500.0);
            let mut positions = Vec::new();
            for _ in 0..60 {
                spring.advance(MS_16);
                positions.push(spring.position());
            }
            positions
        };
        assert_eq!(run(), run());
    }
}
