//! # Drive library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the drive crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Archive sink - records actuator demands instead of driving motors
pub mod archive_sink;

/// Control laws - steering PID, safety stop and wall following
pub mod ctrl;

/// Drive control module - runs the control cycle and owns the Idle/Running state
pub mod drive_ctrl;

/// Equipment interfaces - the traits the control loop reads sensors and commands actuators through
pub mod eqpt;

/// LIDAR range reduction - nearest, furthest and mean returns in an angular window
pub mod lidar;

/// Executable parameters
pub mod params;

/// Perception - finds the coloured line in camera frames
pub mod per;

/// Replay client - plays back recorded sensor data
pub mod replay_client;

/// Live tuning - parameters, the tuning surface and snapshot transport
pub mod tuning;
