//! # LIDAR range reduction
//!
//! Reduces a full LIDAR sweep to a single reading inside an [`AngularWindow`]. Samples without a
//! return are ignored, so a window with no valid samples gives `None` rather than a zero distance.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod window;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::lidar::{is_valid_return, LidarScan};
use ordered_float::NotNan;
use std::cmp::Reverse;

pub use window::*;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Iterate over the valid `(angle_deg, distance)` samples inside the window, in ascending angle.
fn valid_in_window<'a>(
    scan: &'a LidarScan,
    window: &'a AngularWindow,
) -> impl Iterator<Item = (f64, NotNan<f64>)> + 'a {
    scan.samples()
        .filter(move |(a, d)| window.contains(*a) && is_valid_return(*d))
        .filter_map(|(a, d)| NotNan::new(d).ok().map(|d| (a, d)))
}

/// Find the nearest return inside the window as `(angle_deg, distance_cm)`.
///
/// Ties are resolved in favour of the lowest angle.
pub fn closest_in_window(scan: &LidarScan, window: &AngularWindow) -> Option<(f64, f64)> {
    valid_in_window(scan, window)
        .min_by_key(|(_, d)| *d)
        .map(|(a, d)| (a, d.into_inner()))
}

/// Find the furthest return inside the window as `(angle_deg, distance_cm)`.
///
/// Ties are resolved in favour of the lowest angle.
pub fn farthest_in_window(scan: &LidarScan, window: &AngularWindow) -> Option<(f64, f64)> {
    valid_in_window(scan, window)
        .min_by_key(|(_, d)| Reverse(*d))
        .map(|(a, d)| (a, d.into_inner()))
}

/// Find the mean distance of the returns inside the window.
///
/// The reading is reported at the centre of the window as `(angle_deg, distance_cm)`.
pub fn average_in_window(scan: &LidarScan, window: &AngularWindow) -> Option<(f64, f64)> {
    let (sum, count) = valid_in_window(scan, window)
        .fold((0f64, 0usize), |(sum, count), (_, d)| {
            (sum + d.into_inner(), count + 1)
        });

    if count == 0 {
        None
    } else {
        Some((window.centre_deg(), sum / count as f64))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
