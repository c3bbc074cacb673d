//! # Tuning parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::tc::{DriveMode, TunableParam};
use serde::{Deserialize, Serialize};

use super::TuningError;
use crate::{
    ctrl::{safety_stop, steer, wall_follow, PidController},
    lidar::{AngularWindow, WindowError},
    per::{ColorRange, CropRegion},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The full set of parameters an operator can tune while the vehicle runs.
///
/// A snapshot of these parameters is taken at the start of every control cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningParams {
    /// The active driving behaviour
    pub mode: DriveMode,

    // ---- LINE EXTRACTION ----
    /// Colour of the line to follow
    pub color_range: ColorRange,

    /// The smallest region accepted as the line.
    ///
    /// Units: pixels
    pub min_contour_area: usize,

    /// Part of the frame searched for the line
    pub crop: CropRegion,

    // ---- STEERING ----
    /// Proportional gain of the steering PID
    pub k_p: f64,

    /// Integral gain of the steering PID
    pub k_i: f64,

    /// Derivative gain of the steering PID
    pub k_d: f64,

    /// Divisor applied to the raw steering PID output
    ///
    /// Units: pixels
    pub steer_normalisation: f64,

    /// Trim added to the steering demand, between -1 and 1
    pub angle_offset: f64,

    /// Steer with the wall follower when no line is visible in line follow mode
    pub wall_follow_fallback: bool,

    // ---- SPEED ----
    /// Maximum speed magnitude, between 0 and 1
    pub speed_limit: f64,

    /// Stand-off distance the safety stop holds from obstacles ahead
    ///
    /// Units: centimeters
    pub safety_stop_setpoint_cm: f64,

    /// Safety stop sensitivity, between 0 and 100
    ///
    /// Units: percent
    pub safety_stop_sensitivity_pc: f64,

    /// Total width of the forward window watched by the safety stop
    ///
    /// Units: degrees
    pub safety_stop_window_deg: f64,

    // ---- WALL FOLLOWING ----
    /// Wall follower sensitivity, between 0 and 100
    ///
    /// Units: percent
    pub wall_follow_sensitivity_pc: f64,

    /// Half width of each of the side windows
    ///
    /// Units: degrees
    pub wall_follow_half_width_deg: f64,

    /// Distance assumed for a wall which gives no returns
    ///
    /// Units: centimeters
    pub far_distance_cm: f64,

    // ---- ARMING ----
    /// Trigger position above which the vehicle is allowed to move, between 0 and 1
    pub arming_threshold: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for TuningParams {
    fn default() -> Self {
        Self {
            mode: DriveMode::LineFollow,
            color_range: ColorRange::new(
                crate::per::Hsv::new(0, 100, 100),
                crate::per::Hsv::new(179, 255, 255),
            ),
            min_contour_area: 30,
            crop: CropRegion::default(),
            k_p: 0.08,
            k_i: 0.0,
            k_d: 0.1,
            steer_normalisation: steer::DEFAULT_NORMALISATION,
            angle_offset: 0.0,
            wall_follow_fallback: false,
            speed_limit: 0.5,
            safety_stop_setpoint_cm: 50.0,
            safety_stop_sensitivity_pc: 50.0,
            safety_stop_window_deg: 25.0,
            wall_follow_sensitivity_pc: 50.0,
            wall_follow_half_width_deg: 15.0,
            far_distance_cm: wall_follow::DEFAULT_FAR_DISTANCE_CM,
            arming_threshold: 0.1,
        }
    }
}

impl TuningParams {
    /// Check that the parameters can be used by the control loop.
    pub fn validate(&self) -> Result<(), TuningError> {
        self.color_range.validate()?;

        for (name, gain) in [
            ("k_p", self.k_p),
            ("k_i", self.k_i),
            ("k_d", self.k_d),
            ("angle_offset", self.angle_offset),
        ]
        .iter()
        {
            if !gain.is_finite() {
                return Err(TuningError::NonFinite(*name, *gain));
            }
        }

        if !(self.steer_normalisation.is_finite() && self.steer_normalisation > 0.0) {
            return Err(TuningError::InvalidNormalisation(self.steer_normalisation));
        }

        check_range("angle_offset", self.angle_offset, -1.0, 1.0)?;
        check_range("speed_limit", self.speed_limit, 0.0, 1.0)?;
        check_range("arming_threshold", self.arming_threshold, 0.0, 1.0)?;
        check_range(
            "safety_stop_sensitivity_pc",
            self.safety_stop_sensitivity_pc,
            0.0,
            100.0,
        )?;
        check_range(
            "wall_follow_sensitivity_pc",
            self.wall_follow_sensitivity_pc,
            0.0,
            100.0,
        )?;

        if !(self.safety_stop_setpoint_cm.is_finite() && self.safety_stop_setpoint_cm > 0.0) {
            return Err(TuningError::InvalidSetpoint(self.safety_stop_setpoint_cm));
        }

        if !(self.far_distance_cm.is_finite() && self.far_distance_cm > 0.0) {
            return Err(TuningError::InvalidFarDistance(self.far_distance_cm));
        }

        self.forward_window()?;
        self.side_windows()?;

        Ok(())
    }

    /// The steering controller described by these parameters.
    pub fn steer_ctrl(&self) -> PidController {
        PidController {
            k_p: self.k_p,
            k_i: self.k_i,
            k_d: self.k_d,
            normalisation: self.steer_normalisation,
            angle_offset: self.angle_offset,
        }
    }

    /// Window straight ahead of the vehicle watched by the safety stop.
    pub fn forward_window(&self) -> Result<AngularWindow, WindowError> {
        AngularWindow::centred(0.0, self.safety_stop_window_deg / 2.0)
    }

    /// Windows either side of the vehicle used by the wall follower.
    pub fn side_windows(&self) -> Result<wall_follow::SideWindows, WindowError> {
        wall_follow::SideWindows::new(self.wall_follow_half_width_deg)
    }

    /// Proportional gain of the safety stop.
    pub fn safety_stop_kp(&self) -> f64 {
        safety_stop::sensitivity_to_kp(
            self.safety_stop_setpoint_cm,
            self.safety_stop_sensitivity_pc,
        )
    }

    /// Proportional gain of the wall follower.
    pub fn wall_follow_kp(&self) -> f64 {
        wall_follow::sensitivity_to_kp(self.wall_follow_sensitivity_pc)
    }

    /// Get the current value of a numeric parameter.
    pub fn get(&self, param: TunableParam) -> f64 {
        match param {
            TunableParam::Kp => self.k_p,
            TunableParam::Ki => self.k_i,
            TunableParam::Kd => self.k_d,
            TunableParam::AngleOffset => self.angle_offset,
            TunableParam::SpeedLimit => self.speed_limit,
            TunableParam::SafetyStopSetpoint => self.safety_stop_setpoint_cm,
            TunableParam::SafetyStopSensitivity => self.safety_stop_sensitivity_pc,
            TunableParam::SafetyStopWindow => self.safety_stop_window_deg,
            TunableParam::WallFollowSensitivity => self.wall_follow_sensitivity_pc,
            TunableParam::WallFollowWindow => self.wall_follow_half_width_deg,
            TunableParam::MinContourArea => self.min_contour_area as f64,
        }
    }

    /// Set a numeric parameter.
    ///
    /// The change is only made if the resulting parameters are valid, otherwise the parameters
    /// are left untouched and the error returned.
    pub fn set(&mut self, param: TunableParam, value: f64) -> Result<(), TuningError> {
        let mut candidate = self.clone();

        match param {
            TunableParam::Kp => candidate.k_p = value,
            TunableParam::Ki => candidate.k_i = value,
            TunableParam::Kd => candidate.k_d = value,
            TunableParam::AngleOffset => candidate.angle_offset = value,
            TunableParam::SpeedLimit => candidate.speed_limit = value,
            TunableParam::SafetyStopSetpoint => candidate.safety_stop_setpoint_cm = value,
            TunableParam::SafetyStopSensitivity => candidate.safety_stop_sensitivity_pc = value,
            TunableParam::SafetyStopWindow => candidate.safety_stop_window_deg = value,
            TunableParam::WallFollowSensitivity => candidate.wall_follow_sensitivity_pc = value,
            TunableParam::WallFollowWindow => candidate.wall_follow_half_width_deg = value,
            TunableParam::MinContourArea => {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(TuningError::InvalidMinArea(value));
                }
                candidate.min_contour_area = value.round() as usize
            }
        }

        candidate.validate()?;
        *self = candidate;

        Ok(())
    }
}

fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), TuningError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
