//! # Drive Equipment Commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands sent to the drive actuators.
///
/// Both demands are normalised. Positive speed is forwards, positive angle steers to the right.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct DriveDems {
    /// Throttle demand between -1 (full reverse) and +1 (full forward)
    pub speed: f64,

    /// Steering demand between -1 (full left) and +1 (full right)
    pub angle: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveDems {
    /// Demands that bring the vehicle to a halt with the wheels centred.
    pub fn stop() -> Self {
        Self::default()
    }

    /// Build a new set of demands, clamping both into the normalised range.
    ///
    /// NaN demands are replaced by zero so that a bad calculation can never reach the actuators.
    pub fn new_clamped(speed: f64, angle: f64) -> Self {
        Self {
            speed: clamp_unit(speed),
            angle: clamp_unit(angle),
        }
    }

    /// Return a copy of these demands clamped into the normalised range.
    pub fn clamped(&self) -> Self {
        Self::new_clamped(self.speed, self.angle)
    }

    /// True if both demands are inside the normalised range.
    pub fn is_valid(&self) -> bool {
        (-1.0..=1.0).contains(&self.speed) && (-1.0..=1.0).contains(&self.angle)
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamping() {
        let dems = DriveDems::new_clamped(1.7, -3.0);
        assert_eq!(dems, DriveDems { speed: 1.0, angle: -1.0 });
        assert!(dems.is_valid());

        let dems = DriveDems::new_clamped(f64::NAN, 0.25);
        assert_eq!(dems, DriveDems { speed: 0.0, angle: 0.25 });

        assert!(!DriveDems { speed: 1.1, angle: 0.0 }.is_valid());
        assert_eq!(DriveDems::stop(), DriveDems { speed: 0.0, angle: 0.0 });
    }
}
