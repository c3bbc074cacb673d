//! # Safety stop controller
//!
//! Proportional brake which slows the vehicle as an obstacle ahead approaches the stand-off
//! setpoint, and reverses if the obstacle comes closer than the setpoint.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use util::maths::{clamp, lin_map};

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a sensitivity percentage into the proportional gain of the brake.
///
/// The gain is negative so that an obstacle nearer than the setpoint gives a reverse demand. At
/// 100 % sensitivity an obstacle at half the setpoint distance gives full reverse.
pub fn sensitivity_to_kp(setpoint_cm: f64, sensitivity_pc: f64) -> f64 {
    -(1.0 / setpoint_cm) * lin_map((0.0, 100.0), (0.0, 1.0), sensitivity_pc) * 2.0
}

/// Get the speed demand for the distance to the nearest obstacle ahead.
///
/// While the obstacle is nearer than twice the setpoint the speed is proportional to the distance
/// error, limited to `speed_limit` in either direction. Further away the vehicle runs at the
/// speed limit.
pub fn compute(distance_cm: f64, setpoint_cm: f64, kp: f64, speed_limit: f64) -> f64 {
    let error = setpoint_cm - distance_cm;

    if error > -setpoint_cm {
        clamp(&(kp * error), &-speed_limit, &speed_limit)
    } else {
        speed_limit
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gain() {
        assert_eq!(sensitivity_to_kp(50.0, 50.0), -0.02);
        assert_eq!(sensitivity_to_kp(50.0, 0.0), 0.0);
    }

    #[test]
    fn test_obstacle_too_close() {
        // 30 cm ahead with a 50 cm stand-off
        let kp = sensitivity_to_kp(50.0, 50.0);
        let speed = compute(30.0, 50.0, kp, 0.8);

        assert!(speed < 0.0);
        assert!(speed >= -0.8);
        assert!((speed - -0.4).abs() < 1e-12);

        // Very close saturates at the limit
        assert_eq!(compute(1.0, 50.0, sensitivity_to_kp(50.0, 100.0), 0.5), -0.5);
    }

    #[test]
    fn test_far_obstacle() {
        let kp = sensitivity_to_kp(50.0, 50.0);

        assert_eq!(compute(100.0, 50.0, kp, 0.6), 0.6);
        assert_eq!(compute(1000.0, 50.0, kp, 0.6), 0.6);

        // Slowing in between
        let speed = compute(75.0, 50.0, kp, 0.6);
        assert!((speed - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_at_setpoint() {
        let kp = sensitivity_to_kp(50.0, 50.0);
        assert_eq!(compute(50.0, 50.0, kp, 0.6), 0.0);
    }

    #[test]
    fn test_speed_bounded() {
        let kp = sensitivity_to_kp(40.0, 100.0);
        for d in (0..400).map(|d| d as f64) {
            let speed = compute(d, 40.0, kp, 0.7);
            assert!(speed.abs() <= 0.7);
        }
    }
}
