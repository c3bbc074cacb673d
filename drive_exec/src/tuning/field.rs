//! # HSV bound selection
//!
//! The operator adjusts the colour range one bound at a time. [`FieldCycler`] tracks which bound
//! is selected and applies increments to it, keeping every bound inside its channel.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use serde::Serialize;

use crate::per::{ColorRange, HUE_MAX, SAT_MAX, VAL_MAX};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// One of the six bounds of a [`ColorRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TunableField {
    HLow,
    SLow,
    VLow,
    HHigh,
    SHigh,
    VHigh,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// State machine selecting the colour bound being tuned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldCycler {
    selected: TunableField,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TunableField {
    /// The field selected after this one.
    pub fn next(self) -> Self {
        match self {
            TunableField::HLow => TunableField::SLow,
            TunableField::SLow => TunableField::VLow,
            TunableField::VLow => TunableField::HHigh,
            TunableField::HHigh => TunableField::SHigh,
            TunableField::SHigh => TunableField::VHigh,
            TunableField::VHigh => TunableField::HLow,
        }
    }

    /// Largest value the field's channel can take.
    pub fn max(self) -> u8 {
        match self {
            TunableField::HLow | TunableField::HHigh => HUE_MAX,
            TunableField::SLow | TunableField::SHigh => SAT_MAX,
            TunableField::VLow | TunableField::VHigh => VAL_MAX,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TunableField::HLow => "H_low",
            TunableField::SLow => "S_low",
            TunableField::VLow => "V_low",
            TunableField::HHigh => "H_high",
            TunableField::SHigh => "S_high",
            TunableField::VHigh => "V_high",
        }
    }

    /// Read the field from a colour range.
    pub fn get(self, range: &ColorRange) -> u8 {
        match self {
            TunableField::HLow => range.lower.h,
            TunableField::SLow => range.lower.s,
            TunableField::VLow => range.lower.v,
            TunableField::HHigh => range.upper.h,
            TunableField::SHigh => range.upper.s,
            TunableField::VHigh => range.upper.v,
        }
    }

    fn get_mut(self, range: &mut ColorRange) -> &mut u8 {
        match self {
            TunableField::HLow => &mut range.lower.h,
            TunableField::SLow => &mut range.lower.s,
            TunableField::VLow => &mut range.lower.v,
            TunableField::HHigh => &mut range.upper.h,
            TunableField::SHigh => &mut range.upper.s,
            TunableField::VHigh => &mut range.upper.v,
        }
    }

    /// Lowest and highest values allowed for this field given the rest of the range.
    ///
    /// Hue may wrap so only its channel limits it, saturation and value lower bounds may not pass
    /// their upper bounds.
    fn limits(self, range: &ColorRange) -> (u8, u8) {
        match self {
            TunableField::HLow | TunableField::HHigh => (0, HUE_MAX),
            TunableField::SLow => (0, range.upper.s),
            TunableField::VLow => (0, range.upper.v),
            TunableField::SHigh => (range.lower.s, SAT_MAX),
            TunableField::VHigh => (range.lower.v, VAL_MAX),
        }
    }
}

impl FieldCycler {
    pub fn new() -> Self {
        Self {
            selected: TunableField::HLow,
        }
    }

    pub fn selected(&self) -> TunableField {
        self.selected
    }

    /// Select the next field, returning it.
    pub fn next(&mut self) -> TunableField {
        self.selected = self.selected.next();
        self.selected
    }

    /// Increase the selected field by `step`, returning the new value.
    pub fn inc(&self, range: &mut ColorRange, step: u8) -> u8 {
        self.adjust(range, step as i16)
    }

    /// Decrease the selected field by `step`, returning the new value.
    pub fn dec(&self, range: &mut ColorRange, step: u8) -> u8 {
        self.adjust(range, -(step as i16))
    }

    /// Reset the colour range so every colour is selected.
    pub fn reset(&self, range: &mut ColorRange) {
        *range = ColorRange::FULL;
    }

    fn adjust(&self, range: &mut ColorRange, delta: i16) -> u8 {
        let field = self.selected;
        let (min, max) = field.limits(range);
        let target = field.get(range) as i16 + delta;

        let value = if target > max as i16 {
            warn!("Cannot increase {} past {}", field.name(), max);
            max
        } else if target < min as i16 {
            warn!("Cannot decrease {} past {}", field.name(), min);
            min
        } else {
            target as u8
        };

        *field.get_mut(range) = value;
        value
    }
}

impl Default for FieldCycler {
    fn default() -> Self {
        Self::new()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::per::Hsv;

    #[test]
    fn test_cycle_order() {
        let mut c = FieldCycler::new();
        assert_eq!(c.selected(), TunableField::HLow);

        let order: Vec<TunableField> = (0..6).map(|_| c.next()).collect();
        assert_eq!(
            order,
            vec![
                TunableField::SLow,
                TunableField::VLow,
                TunableField::HHigh,
                TunableField::SHigh,
                TunableField::VHigh,
                TunableField::HLow
            ]
        );
    }

    #[test]
    fn test_channel_bounds() {
        let mut range = ColorRange::new(Hsv::new(178, 0, 0), Hsv::new(179, 250, 255));
        let c = FieldCycler::new();

        assert_eq!(c.inc(&mut range, 1), 179);
        assert_eq!(c.inc(&mut range, 5), HUE_MAX);
        assert_eq!(c.dec(&mut range, 200), 0);
        assert!(range.validate().is_ok());
    }

    #[test]
    fn test_sat_stays_ordered() {
        let mut range = ColorRange::new(Hsv::new(0, 100, 0), Hsv::new(179, 110, 255));
        let mut c = FieldCycler::new();
        c.next();
        assert_eq!(c.selected(), TunableField::SLow);

        assert_eq!(c.inc(&mut range, 50), 110);
        assert!(range.validate().is_ok());

        c.next();
        c.next();
        c.next();
        assert_eq!(c.selected(), TunableField::SHigh);
        assert_eq!(c.inc(&mut range, 255), SAT_MAX);
        assert_eq!(c.dec(&mut range, 255), 110);
    }

    #[test]
    fn test_reset() {
        let mut range = ColorRange::new(Hsv::new(20, 30, 40), Hsv::new(50, 60, 70));
        FieldCycler::new().reset(&mut range);
        assert_eq!(range, ColorRange::FULL);
    }
}
