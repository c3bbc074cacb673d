//! Parameters structure for the drive executable

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use std::path::PathBuf;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the drive executable.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveExecParams {
    /// Target period of one control cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Name of the tuning parameter file in the params directory
    pub tuning_params_file: String,

    /// Replay manifest to drive from, may be overridden on the command line
    #[serde(default)]
    pub replay_manifest: Option<PathBuf>,

    /// Save annotated frames into the session directory
    #[serde(default)]
    pub save_debug_frames: bool,

    /// Number of cycles between saved debug frames
    #[serde(default = "default_debug_frame_period")]
    pub debug_frame_period_cycles: u64,

    /// Number of consecutive cycle overruns after which the executable stops the vehicle, or
    /// `None` to never stop
    #[serde(default)]
    pub max_consec_overruns: Option<u64>,
}

fn default_debug_frame_period() -> u64 {
    10
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load_params_file() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../params/drive_exec.toml");
        let params: DriveExecParams = util::params::load_from_path(path).unwrap();

        assert!(params.cycle_period_s > 0.0);
        assert_eq!(params.tuning_params_file, "tuning.toml");
        assert!(params.debug_frame_period_cycles > 0);
    }

    #[test]
    fn test_defaults() {
        let params: DriveExecParams = util::params::from_str(
            r#"
            cycle_period_s = 0.05
            tuning_params_file = "tuning.toml"
            "#,
        )
        .unwrap();

        assert_eq!(params.replay_manifest, None);
        assert!(!params.save_debug_frames);
        assert_eq!(params.debug_frame_period_cycles, 10);
    }
}
