#![forbid(unsafe_code)]

//! Rolling velocity sampling for release-gesture resolution.
//!
//! The tracker retains roughly the last 100ms of touch samples (host event
//! timestamps, in milliseconds) and reports velocity as
//! `(last.y − first.y) / (last.t − first.t)` over the retained window, in
//! px/ms. Positive velocity means the finger is moving down the screen.

use std::collections::VecDeque;

/// Default sample retention window in milliseconds.
pub const DEFAULT_WINDOW_MS: f64 = 100.0;

#[derive(Debug, Clone, Copy)]
struct Sample {
    t_ms: f64,
    y: f64,
}

/// Rolling sample history for velocity computation.
#[derive(Debug, Clone)]
pub struct VelocityTracker {
    window_ms: f64,
    samples: VecDeque<Sample>,
}

impl Default for VelocityTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS)
    }
}

impl VelocityTracker {
    /// Create a tracker retaining `window_ms` of samples.
    #[must_use]
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms: window_ms.max(1.0),
            samples: VecDeque::with_capacity(16),
        }
    }

    /// Record a touch position. Samples older than the window (relative to
    /// this sample) are pruned.
    pub fn push(&mut self, t_ms: f64, y: f64) {
        // Out-of-order timestamps reset the history; they mean the gesture
        // stream restarted.
        if self.samples.back().is_some_and(|last| t_ms < last.t_ms) {
            self.samples.clear();
        }
        self.samples.push_back(Sample { t_ms, y });
        let cutoff = t_ms - self.window_ms;
        while self.samples.front().is_some_and(|s| s.t_ms < cutoff) {
            self.samples.pop_front();
        }
    }

    /// Velocity in px/ms over the retained samples, or 0 when there is not
    /// enough history.
    #[must_use]
    pub fn velocity(&self) -> f64 {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        let dt = last.t_ms - first.t_ms;
        if dt <= 0.0 {
            return 0.0;
        }
        (last.y - first.y) / dt
    }

    /// Number of retained samples.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the tracker has no samples.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drop all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_downward_motion() {
        let mut tracker = VelocityTracker::default();
        for i in 0..5 {
            let t = f64::from(i) * 16.0;
            tracker.push(t, 100.0 + t); // 1 px/ms downward
        }
        assert!((tracker.velocity() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn upward_motion_is_negative() {
        let mut tracker = VelocityTracker::default();
        tracker.push(0.0, 500.0);
        tracker.push(50.0, 400.0);
        assert!((tracker.velocity() - -2.0).abs() < 1e-9);
    }

    #[test]
    fn stale_samples_pruned() {
        let mut tracker = VelocityTracker::new(100.0);
        // Fast early motion that should age out of the window.
        tracker.push(0.0, 0.0);
        tracker.push(10.0, 200.0);
        // Stationary afterwards.
        for i in 0..10 {
            tracker.push(120.0 + f64::from(i) * 16.0, 200.0);
        }
        assert!(
            tracker.velocity().abs() < 1e-9,
            "velocity should reflect only the retained window"
        );
    }

    #[test]
    fn single_sample_is_zero() {
        let mut tracker = VelocityTracker::default();
        tracker.push(0.0, 42.0);
        assert!(tracker.velocity().abs() < f64::EPSILON);
    }

    #[test]
    fn empty_is_zero() {
        let tracker = VelocityTracker::default();
        assert!(tracker.velocity().abs() < f64::EPSILON);
        assert!(tracker.is_empty());
    }

    #[test]
    fn identical_timestamps_are_safe() {
        let mut tracker = VelocityTracker::default();
        tracker.push(10.0, 0.0);
        tracker.push(10.0, 500.0);
        assert!(tracker.velocity().abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_order_timestamps_reset() {
        let mut tracker = VelocityTracker::default();
        tracker.push(100.0, 0.0);
        tracker.push(50.0, 300.0);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn clear_drops_history() {
        let mut tracker = VelocityTracker::default();
        tracker.push(0.0, 0.0);
        tracker.push(16.0, 10.0);
        tracker.clear();
        assert!(tracker.is_empty());
        assert!(tracker.velocity().abs() < f64::EPSILON);
    }
}
