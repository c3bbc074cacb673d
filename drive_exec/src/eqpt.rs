//! # Equipment interfaces
//!
//! The control loop talks to the vehicle's hardware only through these traits, so the same loop
//! can drive the real car, a replay of recorded data, or a test double.
//!
//! All calls are expected to return promptly. A source with nothing new to offer returns
//! `Ok(None)` rather than waiting, and the control loop then holds its last command. Drivers for
//! slow hardware should acquire on their own thread and hand over only the newest sample.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::{cam::CamImage, drive::DriveDems, lidar::LidarScan};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of colour camera frames.
pub trait FrameSource {
    /// Get the newest frame, or `None` if no frame has arrived since the last call.
    fn latest_frame(&mut self) -> Result<Option<CamImage>, EqptError>;
}

/// A source of LIDAR sweeps.
pub trait ScanSource {
    /// Get the newest sweep, or `None` if no sweep has completed since the last call.
    fn latest_scan(&mut self) -> Result<Option<LidarScan>, EqptError>;
}

/// The deadman trigger which must be held for the vehicle to move.
pub trait ArmingInput {
    /// Trigger position between 0 (released) and 1 (fully pressed).
    fn trigger(&mut self) -> f64;
}

/// The drive actuators.
pub trait ActuatorSink {
    /// Send a speed and steering demand to the actuators.
    fn set_command(&mut self, dems: DriveDems) -> Result<(), EqptError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by equipment.
#[derive(Debug, thiserror::Error)]
pub enum EqptError {
    #[error("The equipment is not connected")]
    NotConnected,

    #[error("The recorded data has been exhausted")]
    EndOfData,

    #[error("Could not decode the camera frame: {0}")]
    FrameDecode(#[from] image::ImageError),

    #[error("Actuator fault: {0}")]
    ActuatorFault(String),
}
