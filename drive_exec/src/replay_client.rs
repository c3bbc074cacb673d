//! # Replay client
//!
//! Plays back a recording of the vehicle's sensors so that the control loop can be run without
//! hardware. A recording is described by a JSON manifest listing what arrived on each tick:
//!
//! ```json
//! {
//!     "ticks": [
//!         { "frame": "frames/0000.png", "scan": [120.0, 118.5, ...], "trigger": 1.0 },
//!         { "frame": null, "scan": null, "trigger": 1.0 }
//!     ]
//! }
//! ```
//!
//! Frame paths are relative to the directory holding the manifest. Each source steps through the
//! recording once per call, so a loop pulling from all three stays in step.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::Utc;
use comms_if::eqpt::{cam::CamImage, lidar::LidarScan};
use log::debug;
use serde::Deserialize;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::eqpt::{ArmingInput, EqptError, FrameSource, ScanSource};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ReplayManifest {
    ticks: Vec<ReplayTick>,
}

#[derive(Debug, Deserialize)]
struct ReplayTick {
    #[serde(default)]
    frame: Option<PathBuf>,

    #[serde(default)]
    scan: Option<Vec<f64>>,

    #[serde(default)]
    trigger: f64,
}

/// Recorded camera frames.
pub struct ReplayFrames {
    dir: PathBuf,
    frames: VecDeque<Option<PathBuf>>,
}

/// Recorded LIDAR sweeps.
pub struct ReplayScans {
    scans: VecDeque<Option<Vec<f64>>>,
}

/// Recorded trigger positions.
///
/// Once the recording runs out the trigger reads as released.
pub struct ReplayArming {
    triggers: VecDeque<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Could not load the replay manifest: {0}")]
    ManifestLoad(std::io::Error),

    #[error("Could not parse the replay manifest: {0}")]
    ManifestParse(serde_json::Error),

    #[error("The replay manifest contains no ticks")]
    EmptyManifest,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Load a recording, returning the frame, scan and arming sources.
pub fn load_replay<P: AsRef<Path>>(
    manifest_path: P,
) -> Result<(ReplayFrames, ReplayScans, ReplayArming), ReplayError> {
    let manifest_str =
        fs::read_to_string(manifest_path.as_ref()).map_err(ReplayError::ManifestLoad)?;

    let dir = manifest_path
        .as_ref()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    from_manifest_str(&manifest_str, dir)
}

fn from_manifest_str(
    manifest_str: &str,
    dir: PathBuf,
) -> Result<(ReplayFrames, ReplayScans, ReplayArming), ReplayError> {
    let manifest: ReplayManifest =
        serde_json::from_str(manifest_str).map_err(ReplayError::ManifestParse)?;

    if manifest.ticks.is_empty() {
        return Err(ReplayError::EmptyManifest);
    }

    let mut frames = VecDeque::with_capacity(manifest.ticks.len());
    let mut scans = VecDeque::with_capacity(manifest.ticks.len());
    let mut triggers = VecDeque::with_capacity(manifest.ticks.len());

    for tick in manifest.ticks {
        frames.push_back(tick.frame);
        scans.push_back(tick.scan);
        triggers.push_back(tick.trigger);
    }

    Ok((
        ReplayFrames { dir, frames },
        ReplayScans { scans },
        ReplayArming { triggers },
    ))
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ReplayFrames {
    /// True once every recorded tick has been played back.
    pub fn is_finished(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of ticks left in the recording.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ReplayFrames {
    fn latest_frame(&mut self) -> Result<Option<CamImage>, EqptError> {
        match self.frames.pop_front() {
            Some(Some(path)) => {
                let full_path = self.dir.join(path);
                debug!("Replaying frame {:?}", full_path);

                Ok(Some(CamImage {
                    timestamp: Utc::now(),
                    image: image::open(full_path)?,
                }))
            }
            Some(None) => Ok(None),
            None => Err(EqptError::EndOfData),
        }
    }
}

impl ScanSource for ReplayScans {
    fn latest_scan(&mut self) -> Result<Option<LidarScan>, EqptError> {
        match self.scans.pop_front() {
            Some(scan) => Ok(scan.map(LidarScan::new)),
            None => Err(EqptError::EndOfData),
        }
    }
}

impl ArmingInput for ReplayArming {
    fn trigger(&mut self) -> f64 {
        self.triggers.pop_front().unwrap_or(0.0)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_playback() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(8, 6, Rgb([0, 0, 255]))
            .save(dir.path().join("f0.png"))
            .unwrap();

        let manifest_path = dir.path().join("replay.json");
        fs::write(
            &manifest_path,
            r#"{
                "ticks": [
                    { "frame": "f0.png", "scan": [10.0, 20.0, 30.0, 40.0], "trigger": 1.0 },
                    { "trigger": 0.5 }
                ]
            }"#,
        )
        .unwrap();

        let (mut frames, mut scans, mut arming) = load_replay(&manifest_path).unwrap();
        assert_eq!(frames.remaining(), 2);

        let frame = frames.latest_frame().unwrap().unwrap();
        assert_eq!(frame.to_rgb().dimensions(), (8, 6));
        assert_eq!(scans.latest_scan().unwrap().unwrap().distances_cm.len(), 4);
        assert_eq!(arming.trigger(), 1.0);

        assert!(frames.latest_frame().unwrap().is_none());
        assert!(scans.latest_scan().unwrap().is_none());
        assert_eq!(arming.trigger(), 0.5);

        assert!(frames.is_finished());
        assert!(matches!(frames.latest_frame(), Err(EqptError::EndOfData)));
        assert!(matches!(scans.latest_scan(), Err(EqptError::EndOfData)));
        assert_eq!(arming.trigger(), 0.0);
    }

    #[test]
    fn test_bad_manifests() {
        assert!(matches!(
            from_manifest_str(r#"{ "ticks": [] }"#, PathBuf::new()),
            Err(ReplayError::EmptyManifest)
        ));
        assert!(matches!(
            from_manifest_str("not json", PathBuf::new()),
            Err(ReplayError::ManifestParse(_))
        ));
        assert!(matches!(
            load_replay("/no/such/manifest.json"),
            Err(ReplayError::ManifestLoad(_))
        ));
    }

    #[test]
    fn test_missing_frame_file() {
        let (mut frames, _, _) = from_manifest_str(
            r#"{ "ticks": [ { "frame": "missing.png" } ] }"#,
            PathBuf::from("/no/such/dir"),
        )
        .unwrap();

        assert!(matches!(
            frames.latest_frame(),
            Err(EqptError::FrameDecode(_))
        ));
    }
}
