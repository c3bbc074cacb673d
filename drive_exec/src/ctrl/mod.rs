//! # Control laws
//!
//! The controllers in this module are pure functions of their inputs, apart from the steering
//! PID which threads its memory through an explicit [`ControllerState`] owned by the caller.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod safety_stop;
pub mod steer;
pub mod wall_follow;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use steer::{ControllerState, PidController};
