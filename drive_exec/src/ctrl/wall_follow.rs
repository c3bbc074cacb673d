//! # Wall following controller
//!
//! Proportional controller which keeps the vehicle centred between two walls using the distances
//! to the nearest returns on its left and right.
//!
//! A positive error means the right wall is further away than the left, giving a positive (right)
//! steering demand. The sign of the steering linkage should be checked on each vehicle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::lidar::LidarScan;
use log::warn;
use serde::Serialize;
use util::maths::{clamp, lin_map};

use crate::lidar::{closest_in_window, AngularWindow, WindowError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Bearing of the centre of the left window.
///
/// Units: degrees
pub const LEFT_CENTRE_DEG: f64 = 270.0;

/// Bearing of the centre of the right window.
///
/// Units: degrees
pub const RIGHT_CENTRE_DEG: f64 = 90.0;

/// Distance used in place of a side with no returns.
///
/// Units: centimeters
pub const DEFAULT_FAR_DISTANCE_CM: f64 = 1000.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The windows the wall distances are measured in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SideWindows {
    pub left: AngularWindow,
    pub right: AngularWindow,
}

/// Distances to the walls on either side of the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WallDistances {
    pub left_cm: f64,
    pub right_cm: f64,

    /// True if the left window had no returns and the far distance was used
    pub left_dropout: bool,

    /// True if the right window had no returns and the far distance was used
    pub right_dropout: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SideWindows {
    /// Build windows spanning `half_width_deg` either side of 270 (left) and 90 (right) degrees.
    pub fn new(half_width_deg: f64) -> Result<Self, WindowError> {
        Ok(Self {
            left: AngularWindow::centred(LEFT_CENTRE_DEG, half_width_deg)?,
            right: AngularWindow::centred(RIGHT_CENTRE_DEG, half_width_deg)?,
        })
    }

    /// Measure the nearest wall on each side.
    ///
    /// A side with no returns is treated as being `far_cm` away.
    pub fn measure(&self, scan: &LidarScan, far_cm: f64) -> WallDistances {
        let left = closest_in_window(scan, &self.left).map(|(_, d)| d);
        let right = closest_in_window(scan, &self.right).map(|(_, d)| d);

        if left.is_none() || right.is_none() {
            warn!(
                "No LIDAR returns from the {} wall, assuming {} cm",
                match (left, right) {
                    (None, None) => "left or right",
                    (None, _) => "left",
                    _ => "right",
                },
                far_cm
            );
        }

        WallDistances {
            left_cm: left.unwrap_or(far_cm),
            right_cm: right.unwrap_or(far_cm),
            left_dropout: left.is_none(),
            right_dropout: right.is_none(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a sensitivity percentage into the proportional gain, 100 % giving 0.02 per cm.
pub fn sensitivity_to_kp(sensitivity_pc: f64) -> f64 {
    lin_map((0.0, 100.0), (0.0, 1.0), sensitivity_pc) * 2.0 / 100.0
}

/// Get the steering demand from the distances to the left and right walls.
pub fn compute(left_distance_cm: f64, right_distance_cm: f64, kp: f64) -> f64 {
    let error = right_distance_cm - left_distance_cm;

    clamp(&(kp * error), &-1.0, &1.0)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
