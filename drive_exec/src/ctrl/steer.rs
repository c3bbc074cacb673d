//! # Steering controller
//!
//! PID controller converting the lateral offset of the target (in pixels) into a normalised
//! steering demand.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use serde::Serialize;
use std::time::Instant;
use util::maths::clamp;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default scaling between the raw PID output and the steering demand.
///
/// Units: pixels
pub const DEFAULT_NORMALISATION: f64 = 100.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct PidController {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Dervative gain
    pub k_d: f64,

    /// The raw output is divided by this value before the offset is applied
    pub normalisation: f64,

    /// Trim added to the normalised output, compensating for a steering bias in the vehicle
    pub angle_offset: f64,
}

/// Memory of the steering controller between cycles.
///
/// Only reset on an explicit restart of the control loop.
#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq)]
pub struct ControllerState {
    /// Error passed in on the previous update
    pub previous_error: f64,

    /// The integral accumulation
    pub integral: f64,

    /// Instant of the previous update, or `None` before the first one
    #[serde(skip)]
    pub previous_timestamp: Option<Instant>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains, no offset and the default normalisation.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            normalisation: DEFAULT_NORMALISATION,
            angle_offset: 0.0,
        }
    }

    /// Get the steering demand for the given error.
    ///
    /// `error` is the column of the target minus the centre column of the image, so a positive
    /// error steers right. The result is clamped to [-1, 1], the integral is not limited.
    ///
    /// If `dt` is not positive the derivative is taken as zero and the integral is not
    /// accumulated.
    pub fn compute(&self, error: f64, dt: f64, state: &mut ControllerState) -> f64 {
        let p = self.k_p * error;

        let deriv = if dt > 0.0 {
            state.integral += error * dt;
            (error - state.previous_error) / dt
        } else {
            0.0
        };

        let i = self.k_i * state.integral;
        let d = self.k_d * deriv;

        state.previous_error = error;

        let out = (p + i + d) / self.normalisation + self.angle_offset;

        trace!(
            "Steer PID: e = {:.3}, p = {:.4}, i = {:.4}, d = {:.4}, out = {:.4}",
            error,
            p,
            i,
            d,
            out
        );

        clamp(&out, &-1.0, &1.0)
    }
}

impl ControllerState {
    /// Record the time of the current update, returning the time elapsed since the previous one.
    ///
    /// Call this only when the controller is actually evaluated, so that `dt` spans the same
    /// interval as `previous_error`. Returns zero on the first update.
    ///
    /// Units: seconds
    pub fn advance_clock(&mut self, now: Instant) -> f64 {
        let dt = match self.previous_timestamp {
            Some(t0) => now.saturating_duration_since(t0).as_secs_f64(),
            None => 0.0,
        };

        self.previous_timestamp = Some(now);

        dt
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_p_only() {
        let pid = PidController::new(0.08, 0.0, 0.0);
        let mut state = ControllerState::default();

        // Target 40 px left of the centre of a 320 px wide frame
        let angle = pid.compute(120.0 - 160.0, 0.05, &mut state);
        assert!((angle - -0.032).abs() < 1e-12);

        for e in [-5000.0, -100.0, 0.0, 37.0, 2000.0].iter() {
            let mut state = ControllerState::default();
            let expected = clamp(&(0.08 * e / 100.0), &-1.0, &1.0);
            assert_eq!(pid.compute(*e, 0.1, &mut state), expected);
        }
    }

    #[test]
    fn test_integral_accumulates() {
        let pid = PidController::new(0.0, 1.0, 0.0);
        let mut state = ControllerState::default();

        for _ in 0..10 {
            pid.compute(4.0, 0.1, &mut state);
        }

        // n * e * dt
        assert!((state.integral - 10.0 * 4.0 * 0.1).abs() < 1e-9);
        assert_eq!(state.previous_error, 4.0);
    }

    #[test]
    fn test_integral_not_frozen_by_clamp() {
        let pid = PidController::new(1.0, 0.0, 0.0);
        let mut state = ControllerState::default();

        for _ in 0..5 {
            assert_eq!(pid.compute(1000.0, 1.0, &mut state), 1.0);
        }
        assert_eq!(state.integral, 5000.0);
    }

    #[test]
    fn test_derivative_and_bad_dt() {
        let pid = PidController::new(0.0, 0.0, 1.0);
        let mut state = ControllerState::default();

        assert_eq!(pid.compute(10.0, 0.5, &mut state), 10.0 / 0.5 / 100.0);

        // Zero or negative dt gives no derivative and no integral
        let integral = state.integral;
        assert_eq!(pid.compute(30.0, 0.0, &mut state), 0.0);
        assert_eq!(pid.compute(50.0, -0.1, &mut state), 0.0);
        assert_eq!(state.integral, integral);
        assert_eq!(state.previous_error, 50.0);
    }

    #[test]
    fn test_angle_offset() {
        let mut pid = PidController::new(0.0, 0.0, 0.0);
        pid.angle_offset = -0.1;
        let mut state = ControllerState::default();

        assert_eq!(pid.compute(0.0, 0.1, &mut state), -0.1);

        pid.angle_offset = 3.0;
        assert_eq!(pid.compute(0.0, 0.1, &mut state), 1.0);
    }

    #[test]
    fn test_advance_clock() {
        let mut state = ControllerState::default();
        let t0 = Instant::now();

        assert_eq!(state.advance_clock(t0), 0.0);
        assert_eq!(state.advance_clock(t0 + Duration::from_millis(50)), 0.05);

        // A clock going backwards gives zero rather than a negative dt
        assert_eq!(state.advance_clock(t0), 0.0);
    }
}
