//! # Live tuning
//!
//! Gains, thresholds and windows used by the control loop can be changed while the vehicle is
//! running. The [`TuningSurface`] applies operator commands to its working copy of the
//! [`TuningParams`] and publishes each valid result as a snapshot, which the control loop reads
//! through a [`TuningSubscriber`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod console;
mod field;
mod params;
mod store;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use console::*;
pub use field::*;
pub use params::*;
pub use store::*;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::{lidar::WindowError, per::ColorRangeError};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reasons a set of tuning parameters cannot be used.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TuningError {
    #[error("Invalid colour range: {0}")]
    ColorRange(#[from] ColorRangeError),

    #[error("Invalid LIDAR window: {0}")]
    Window(#[from] WindowError),

    #[error("{0} must be finite, got {1}")]
    NonFinite(&'static str, f64),

    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("The steering normalisation must be positive, got {0}")]
    InvalidNormalisation(f64),

    #[error("The safety stop setpoint must be positive, got {0} cm")]
    InvalidSetpoint(f64),

    #[error("The far wall distance must be positive, got {0} cm")]
    InvalidFarDistance(f64),

    #[error("The minimum contour area must be a non-negative number of pixels, got {0}")]
    InvalidMinArea(f64),

    #[error("The control loop is no longer receiving tuning updates")]
    Disconnected,
}
