//! Drive control module
//!
//! Ties perception, range reduction and the controllers together into one control cycle, and
//! owns the Idle/Running state of the vehicle.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod control_loop;
mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// Internal
pub use control_loop::*;
pub use state::*;

use crate::{eqpt::EqptError, tuning::TuningError};

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur during DriveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Invalid tuning parameters: {0}")]
    InvalidTuning(#[from] TuningError),

    #[error("The actuators are unavailable, the vehicle has been stopped: {0}")]
    ActuatorUnavailable(EqptError),

    #[error("Could not set up the DriveCtrl archives: {0}")]
    ArchiveError(String),
}
