//! # Communications interface crate.
//!
//! Provides the interface types shared between the drive executable and the equipment it talks
//! to: camera frames, LIDAR scans, drive demands and tuning commands.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Tuning commands issued by the live tuning surface
pub mod tc;

/// Data and demand definitions for equipment (camera, LIDAR, drive)
pub mod eqpt;
