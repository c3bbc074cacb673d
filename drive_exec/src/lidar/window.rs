//! # Angular windows

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;
use util::maths::wrap_deg;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An inclusive range of LIDAR bearings.
///
/// Bearings follow the scan convention (0 ahead, clockwise). A window whose start is larger than
/// its end wraps through 0, so `(350, 10)` is the 20 degree window straight ahead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AngularWindow {
    start_deg: f64,
    end_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WindowError {
    #[error("The window bounds must be finite, got ({0}, {1})")]
    NonFinite(f64, f64),

    #[error("The window has zero width (both bounds are at {0} deg)")]
    ZeroWidth(f64),

    #[error("The half width of a centred window must be between 0 and 180 deg, got {0}")]
    InvalidHalfWidth(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AngularWindow {
    /// Create a new window from its start and end bearings in degrees.
    ///
    /// Bounds outside [0, 360) are wrapped into it.
    pub fn new(start_deg: f64, end_deg: f64) -> Result<Self, WindowError> {
        if !start_deg.is_finite() || !end_deg.is_finite() {
            return Err(WindowError::NonFinite(start_deg, end_deg));
        }

        let start_deg = wrap_deg(start_deg);
        let end_deg = wrap_deg(end_deg);

        if start_deg == end_deg {
            return Err(WindowError::ZeroWidth(start_deg));
        }

        Ok(Self { start_deg, end_deg })
    }

    /// Create a window spanning `half_width_deg` either side of `centre_deg`.
    pub fn centred(centre_deg: f64, half_width_deg: f64) -> Result<Self, WindowError> {
        if !(half_width_deg > 0.0 && half_width_deg < 180.0) {
            return Err(WindowError::InvalidHalfWidth(half_width_deg));
        }

        Self::new(centre_deg - half_width_deg, centre_deg + half_width_deg)
    }

    pub fn start_deg(&self) -> f64 {
        self.start_deg
    }

    pub fn end_deg(&self) -> f64 {
        self.end_deg
    }

    /// True if the window passes through 0 degrees.
    pub fn wraps(&self) -> bool {
        self.start_deg > self.end_deg
    }

    /// Angular width of the window.
    ///
    /// Units: degrees
    pub fn width_deg(&self) -> f64 {
        if self.wraps() {
            360.0 - self.start_deg + self.end_deg
        } else {
            self.end_deg - self.start_deg
        }
    }

    /// The bearing halfway through the window.
    ///
    /// Units: degrees
    pub fn centre_deg(&self) -> f64 {
        wrap_deg(self.start_deg + self.width_deg() / 2.0)
    }

    /// Returns true if the bearing lies inside the window, bounds included.
    pub fn contains(&self, angle_deg: f64) -> bool {
        let a = wrap_deg(angle_deg);

        if self.wraps() {
            a >= self.start_deg || a <= self.end_deg
        } else {
            a >= self.start_deg && a <= self.end_deg
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
