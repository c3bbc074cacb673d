//! # HSV colour space
//!
//! Colours are held in the 8-bit convention used by OpenCV, which the thresholds tuned on the
//! vehicle are expressed in: hue is half the angle in degrees (0-179), saturation and value span
//! 0-255.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::Rgb;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Largest hue value.
pub const HUE_MAX: u8 = 179;

/// Largest saturation value.
pub const SAT_MAX: u8 = 255;

/// Largest value (brightness) value.
pub const VAL_MAX: u8 = 255;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A colour in the 8-bit HSV space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// An inclusive range of HSV colours.
///
/// If `lower.h > upper.h` the hue range wraps through red, selecting hues at or above `lower.h`
/// and at or below `upper.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: Hsv,
    pub upper: Hsv,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ColorRangeError {
    #[error("Hue bound {0} is above the maximum of {}", HUE_MAX)]
    HueOutOfRange(u8),

    #[error("Saturation lower bound ({0}) is above the upper bound ({1})")]
    SatBoundsInverted(u8, u8),

    #[error("Value lower bound ({0}) is above the upper bound ({1})")]
    ValBoundsInverted(u8, u8),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

impl From<Rgb<u8>> for Hsv {
    fn from(rgb: Rgb<u8>) -> Self {
        rgb_to_hsv(rgb)
    }
}

impl ColorRange {
    /// The range containing every colour.
    pub const FULL: ColorRange = ColorRange {
        lower: Hsv::new(0, 0, 0),
        upper: Hsv::new(HUE_MAX, SAT_MAX, VAL_MAX),
    };

    pub fn new(lower: Hsv, upper: Hsv) -> Self {
        Self { lower, upper }
    }

    /// Check that the bounds describe a usable range.
    pub fn validate(&self) -> Result<(), ColorRangeError> {
        for h in [self.lower.h, self.upper.h].iter() {
            if *h > HUE_MAX {
                return Err(ColorRangeError::HueOutOfRange(*h));
            }
        }

        if self.lower.s > self.upper.s {
            return Err(ColorRangeError::SatBoundsInverted(
                self.lower.s,
                self.upper.s,
            ));
        }

        if self.lower.v > self.upper.v {
            return Err(ColorRangeError::ValBoundsInverted(
                self.lower.v,
                self.upper.v,
            ));
        }

        Ok(())
    }

    /// True if the hue range wraps through 0.
    pub fn hue_wraps(&self) -> bool {
        self.lower.h > self.upper.h
    }

    /// Returns true if the colour lies inside the range, bounds included.
    pub fn contains(&self, hsv: &Hsv) -> bool {
        let hue_ok = if self.hue_wraps() {
            hsv.h >= self.lower.h || hsv.h <= self.upper.h
        } else {
            hsv.h >= self.lower.h && hsv.h <= self.upper.h
        };

        hue_ok
            && hsv.s >= self.lower.s
            && hsv.s <= self.upper.s
            && hsv.v >= self.lower.v
            && hsv.v <= self.upper.v
    }
}

impl Default for ColorRange {
    fn default() -> Self {
        Self::FULL
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert an 8-bit RGB pixel into 8-bit HSV.
pub fn rgb_to_hsv(rgb: Rgb<u8>) -> Hsv {
    let [r, g, b] = rgb.0;
    let (r, g, b) = (r as f32, g as f32, b as f32);

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { delta * 255.0 / max } else { 0.0 };

    let mut h_deg = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h_deg < 0.0 {
        h_deg += 360.0;
    }

    // Half-degree hue, 180 rounds back round to 0
    let h = (h_deg / 2.0).round() as u32 % 180;

    Hsv {
        h: h as u8,
        s: s.round().min(255.0) as u8,
        v: max as u8,
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
