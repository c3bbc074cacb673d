//! # Tuning telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use structopt::{clap::AppSettings, StructOpt};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command issued to the live tuning surface.
#[derive(Debug, Clone, Serialize, Deserialize, StructOpt, PartialEq)]
pub enum TuneCmd {
    /// Set a numeric tuning parameter to the given value.
    #[structopt(name = "set", setting = AppSettings::AllowNegativeNumbers)]
    Set {
        /// The parameter to set, for example `kp` or `ss-setpoint`
        param: TunableParam,

        /// The new value of the parameter, which may be negative
        value: f64,
    },

    /// Select the next HSV bound to be adjusted by `inc` and `dec`.
    ///
    /// Bounds are cycled in the order H low, S low, V low, H high, S high, V high.
    #[structopt(name = "next")]
    Next,

    /// Increase the selected HSV bound.
    #[structopt(name = "inc")]
    Inc {
        #[structopt(default_value = "1")]
        step: u8,
    },

    /// Decrease the selected HSV bound.
    #[structopt(name = "dec")]
    Dec {
        #[structopt(default_value = "1")]
        step: u8,
    },

    /// Reset the HSV bounds to the full range.
    #[structopt(name = "reset")]
    Reset,

    /// Switch the drive mode.
    #[structopt(name = "mode")]
    Mode {
        /// Either `line` or `wall`
        mode: DriveMode,
    },

    /// Print the current tuning parameters.
    #[structopt(name = "show")]
    Show,

    /// Save the current tuning parameters into the session directory.
    #[structopt(name = "save")]
    Save,

    /// Stop the control loop, bringing the vehicle to a halt.
    #[structopt(name = "stop")]
    Stop,
}

/// The numeric tuning parameters which can be changed with [`TuneCmd::Set`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TunableParam {
    /// Steering proportional gain
    Kp,
    /// Steering integral gain
    Ki,
    /// Steering derivative gain
    Kd,
    /// Steering trim added to the angle demand
    AngleOffset,
    /// Speed limit as a fraction of full throttle
    SpeedLimit,
    /// Safety stop stand-off distance in cm
    SafetyStopSetpoint,
    /// Safety stop sensitivity in percent
    SafetyStopSensitivity,
    /// Total width of the forward LIDAR window in degrees
    SafetyStopWindow,
    /// Wall following sensitivity in percent
    WallFollowSensitivity,
    /// Half width of each side LIDAR window in degrees
    WallFollowWindow,
    /// Minimum contour area in pixels
    MinContourArea,
}

/// The driving behaviours available to the control loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DriveMode {
    /// Follow the centre of a coloured line, stopping short of obstacles.
    LineFollow,

    /// Keep centred between two walls, stopping short of obstacles.
    WallFollow,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TunableParam {
    /// All parameters in the order they are listed to the operator.
    pub const ALL: [TunableParam; 11] = [
        TunableParam::Kp,
        TunableParam::Ki,
        TunableParam::Kd,
        TunableParam::AngleOffset,
        TunableParam::SpeedLimit,
        TunableParam::SafetyStopSetpoint,
        TunableParam::SafetyStopSensitivity,
        TunableParam::SafetyStopWindow,
        TunableParam::WallFollowSensitivity,
        TunableParam::WallFollowWindow,
        TunableParam::MinContourArea,
    ];

    /// The name used for this parameter on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            TunableParam::Kp => "kp",
            TunableParam::Ki => "ki",
            TunableParam::Kd => "kd",
            TunableParam::AngleOffset => "angle-offset",
            TunableParam::SpeedLimit => "speed",
            TunableParam::SafetyStopSetpoint => "ss-setpoint",
            TunableParam::SafetyStopSensitivity => "ss-sense",
            TunableParam::SafetyStopWindow => "ss-window",
            TunableParam::WallFollowSensitivity => "wf-sense",
            TunableParam::WallFollowWindow => "wf-window",
            TunableParam::MinContourArea => "min-area",
        }
    }
}

impl FromStr for TunableParam {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TunableParam::ALL
            .iter()
            .find(|p| p.name() == s)
            .copied()
            .ok_or_else(|| {
                let names: Vec<&str> = TunableParam::ALL.iter().map(|p| p.name()).collect();
                format!("unknown parameter \"{}\", expected one of {:?}", s, names)
            })
    }
}

impl fmt::Display for TunableParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DriveMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line" => Ok(DriveMode::LineFollow),
            "wall" => Ok(DriveMode::WallFollow),
            _ => Err(format!("unknown drive mode \"{}\", expected line or wall", s)),
        }
    }
}

impl Default for DriveMode {
    fn default() -> Self {
        DriveMode::LineFollow
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_names_parse_back() {
        for p in TunableParam::ALL.iter() {
            assert_eq!(p.name().parse::<TunableParam>(), Ok(*p));
        }
        assert!("warp".parse::<TunableParam>().is_err());
    }
}
