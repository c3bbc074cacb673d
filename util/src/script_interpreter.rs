//! # Tuning script interpreter module
//!
//! This module provides an interpreter for tuning scripts, allowing tuning telecommands to be
//! replayed at fixed times after the start of the session. Each statement in a script has the
//! form `<time_s>: <command>;`, for example:
//!
//! ```text
//! 0.0: mode line;
//! 2.5: set kp 0.08;
//! 10.0: stop;
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal
use crate::session::get_elapsed_seconds;
use comms_if::tc::{parse_tune_cmd, TcParseError, TuneCmd};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
struct Command {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    /// The Telecommand to run
    tc: TuneCmd,
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending_tcs` to
/// acquire a list of telecommands that need executing.
pub struct ScriptInterpreter {
    script_path: PathBuf,
    cmds: VecDeque<Command>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)"
    )]
    InvalidTimestamp(String),

    #[error("Script contains an invalid TC at {0} s: {1}")]
    InvalidTc(f64, TcParseError),
}

pub enum PendingTcs {
    None,
    Some(Vec<TuneCmd>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        // Load the script into a string
        let script = fs::read_to_string(&path).map_err(ScriptError::ScriptLoadError)?;

        let cmds = parse_script(&script)?;

        Ok(ScriptInterpreter {
            script_path: path,
            cmds,
        })
    }

    /// Return a vector of pending TCs, or `None` if no TCs need executing now.
    pub fn get_pending_tcs(&mut self) -> PendingTcs {
        self.get_pending_tcs_at(get_elapsed_seconds())
    }

    /// Return the TCs which are due at the given time since the start of the session.
    pub fn get_pending_tcs_at(&mut self, current_time_s: f64) -> PendingTcs {
        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.cmds.is_empty() {
            return PendingTcs::EndOfScript;
        }

        let mut tc_vec: Vec<TuneCmd> = vec![];

        // Pop items from the queue while the head's exec time has passed
        while let Some(cmd) = self.cmds.front() {
            if cmd.exec_time_s > current_time_s {
                break;
            }
            if let Some(cmd) = self.cmds.pop_front() {
                tc_vec.push(cmd.tc);
            }
        }

        if !tc_vec.is_empty() {
            PendingTcs::Some(tc_vec)
        } else {
            PendingTcs::None
        }
    }

    /// Get the path the script was loaded from
    pub fn get_path(&self) -> &Path {
        &self.script_path
    }

    /// Get the number of TCs remaining in the script
    pub fn get_num_tcs(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64,
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn parse_script(script: &str) -> Result<VecDeque<Command>, ScriptError> {
    // Empty queue of commands
    let mut tc_queue: VecDeque<Command> = VecDeque::new();

    // Go through the script executing __the magic regex__.
    let re = match RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
        .multi_line(true)
        .build()
    {
        Ok(r) => r,
        Err(e) => crate::raise_error!("Script regex is invalid: {}", e),
    };

    for cap in re.captures_iter(script) {
        let (time_str, payload) = match (cap.get(1), cap.get(3)) {
            (Some(t), Some(p)) => (t.as_str(), p.as_str()),
            _ => continue,
        };

        // Parse the exec time
        let exec_time_s: f64 = time_str
            .parse()
            .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

        // Parse the TC from the payload
        let tc = parse_tune_cmd(payload).map_err(|e| ScriptError::InvalidTc(exec_time_s, e))?;

        tc_queue.push_back(Command { exec_time_s, tc });
    }

    if tc_queue.is_empty() {
        return Err(ScriptError::ScriptEmpty);
    }

    // Scripts may list statements out of order
    tc_queue
        .make_contiguous()
        .sort_by(|a, b| a.exec_time_s.total_cmp(&b.exec_time_s));

    Ok(tc_queue)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tc::{DriveMode, TunableParam};
    use std::io::Write;

    const SCRIPT: &str = "\
        0.0: mode wall;\n\
        2.5: set kp 0.08;\n\
        2.5: next;\n\
        10: stop;\n";

    #[test]
    fn test_load_and_replay() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCRIPT.as_bytes()).unwrap();

        let mut si = ScriptInterpreter::new(file.path()).unwrap();
        assert_eq!(si.get_num_tcs(), 4);
        assert_eq!(si.get_duration(), 10.0);

        match si.get_pending_tcs_at(0.0) {
            PendingTcs::Some(tcs) => assert_eq!(
                tcs,
                vec![TuneCmd::Mode {
                    mode: DriveMode::WallFollow
                }]
            ),
            _ => panic!("Expected the mode command"),
        }

        assert!(matches!(si.get_pending_tcs_at(1.0), PendingTcs::None));

        match si.get_pending_tcs_at(3.0) {
            PendingTcs::Some(tcs) => assert_eq!(
                tcs,
                vec![
                    TuneCmd::Set {
                        param: TunableParam::Kp,
                        value: 0.08
                    },
                    TuneCmd::Next
                ]
            ),
            _ => panic!("Expected two commands"),
        }

        assert!(matches!(si.get_pending_tcs_at(20.0), PendingTcs::Some(_)));
        assert!(matches!(
            si.get_pending_tcs_at(21.0),
            PendingTcs::EndOfScript
        ));
    }

    #[test]
    fn test_negative_values() {
        let cmds = parse_script("1.0: set angle-offset -0.1;\n2.0: set kp -0.05;\n").unwrap();

        let tcs: Vec<TuneCmd> = cmds.into_iter().map(|c| c.tc).collect();
        assert_eq!(
            tcs,
            vec![
                TuneCmd::Set {
                    param: TunableParam::AngleOffset,
                    value: -0.1
                },
                TuneCmd::Set {
                    param: TunableParam::Kp,
                    value: -0.05
                },
            ]
        );
    }

    #[test]
    fn test_bad_scripts() {
        assert!(matches!(
            parse_script("# nothing here\n"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            parse_script("1.0: set warp 9;"),
            Err(ScriptError::InvalidTc(t, _)) if t == 1.0
        ));
        assert!(matches!(
            ScriptInterpreter::new("/definitely/not/a/script.txt"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }
}
