//! # LIDAR Equipment Communications Module
//!
//! A scan is a full sweep of the rotating LIDAR, stored as a list of distances evenly spaced in
//! angle. Angles follow the vehicle convention: 0 degrees is straight ahead and angles increase
//! clockwise, so 90 degrees is to the right and 270 degrees is to the left.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Distance reported by the LIDAR for a bucket with no return.
pub const NO_RETURN_CM: f64 = 0.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single LIDAR sweep.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LidarScan {
    /// UTC timestamp at which the sweep completed
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Distance samples, the first at 0 degrees, evenly spaced clockwise over a full turn.
    ///
    /// Units: centimeters
    pub distances_cm: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LidarScan {
    /// Create a scan from a set of samples, timestamped now.
    pub fn new(distances_cm: Vec<f64>) -> Self {
        Self {
            timestamp: Utc::now(),
            distances_cm,
        }
    }

    /// Angular spacing between two neighbouring samples.
    ///
    /// Units: degrees
    pub fn resolution_deg(&self) -> f64 {
        if self.distances_cm.is_empty() {
            0.0
        } else {
            360.0 / self.distances_cm.len() as f64
        }
    }

    /// Iterate over the `(angle_deg, distance_cm)` pairs of the sweep, including samples with no
    /// return.
    pub fn samples(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let res = self.resolution_deg();
        self.distances_cm
            .iter()
            .enumerate()
            .map(move |(i, d)| (i as f64 * res, *d))
    }
}

/// Returns true if the distance is a real return rather than the no-return sentinel (or garbage
/// from the driver).
pub fn is_valid_return(distance_cm: f64) -> bool {
    distance_cm.is_finite() && distance_cm > NO_RETURN_CM
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
