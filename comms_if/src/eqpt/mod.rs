//! # Equipment Interface
//!
//! This module defines the interface structures which are passed between the drive executable
//! and the vehicle's equipment.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod cam;
pub mod drive;
pub mod lidar;
