//! # Archive actuator sink
//!
//! An actuator sink which records every demand it receives into a CSV archive instead of driving
//! motors. Used when replaying recordings.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::drive::DriveDems;
use serde::Serialize;
use util::{
    archive::Archiver,
    session::{self, Session},
};

use crate::eqpt::{ActuatorSink, EqptError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Actuator sink writing demands into an archive.
pub struct ArchiveSink {
    arch: Archiver,
    last: DriveDems,
    num_cmds: u64,
}

#[derive(Serialize)]
struct CmdRecord {
    time_s: f64,
    speed: f64,
    angle: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArchiveSink {
    /// Create a new sink archiving into `drive_cmds.csv` in the session's archive directory.
    pub fn new(session: &Session) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::from_archiver(Archiver::from_path(
            session,
            "drive_cmds.csv",
        )?))
    }

    pub fn from_archiver(arch: Archiver) -> Self {
        Self {
            arch,
            last: DriveDems::stop(),
            num_cmds: 0,
        }
    }

    /// The last demand written.
    pub fn last(&self) -> DriveDems {
        self.last
    }

    /// Number of demands written so far.
    pub fn num_cmds(&self) -> u64 {
        self.num_cmds
    }
}

impl ActuatorSink for ArchiveSink {
    fn set_command(&mut self, dems: DriveDems) -> Result<(), EqptError> {
        if !dems.is_valid() {
            return Err(EqptError::ActuatorFault(format!(
                "Demands out of range: {:?}",
                dems
            )));
        }

        self.arch
            .serialise(CmdRecord {
                time_s: session::get_elapsed_seconds(),
                speed: dems.speed,
                angle: dems.angle,
            })
            .map_err(|e| EqptError::ActuatorFault(e.to_string()))?;

        self.last = dems;
        self.num_cmds += 1;

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_records_commands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmds.csv");
        let mut sink = ArchiveSink::from_archiver(Archiver::from_file_path(&path).unwrap());

        sink.set_command(DriveDems::new_clamped(0.5, -0.25)).unwrap();
        sink.set_command(DriveDems::stop()).unwrap();

        assert_eq!(sink.num_cmds(), 2);
        assert_eq!(sink.last(), DriveDems::stop());

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "time_s,speed,angle");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with(",0.5,-0.25"));
    }

    #[test]
    fn test_unattached_archive_faults() {
        let mut sink = ArchiveSink::from_archiver(Archiver::default());

        assert!(matches!(
            sink.set_command(DriveDems::stop()),
            Err(EqptError::ActuatorFault(_))
        ));
        assert_eq!(sink.num_cmds(), 0);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ArchiveSink::from_archiver(
            Archiver::from_file_path(dir.path().join("cmds.csv")).unwrap(),
        );

        sink.set_command(DriveDems::new_clamped(0.3, 0.1)).unwrap();
        assert!(matches!(
            sink.set_command(DriveDems {
                speed: 1.5,
                angle: 0.0
            }),
            Err(EqptError::ActuatorFault(_))
        ));

        // The rejected demand isn't recorded
        assert_eq!(sink.num_cmds(), 1);
        assert_eq!(sink.last(), DriveDems::new_clamped(0.3, 0.1));
    }
}
