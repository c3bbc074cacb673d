//! # Tuning surface
//!
//! The tuning surface owns the working copy of the tuning parameters and applies
//! [`TuneCmd`]s to it. Commands come either from the operator typing into the console or from a
//! tuning script, and are processed on a background thread so the control loop is never blocked.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::tc::{parse_tune_cmd, TcParseError, TuneCmd};
use log::{info, warn};
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use util::{
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session,
};

use super::{FieldCycler, TunableField, TuningError, TuningParams, TuningPublisher};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Period at which a tuning script is checked for due commands.
const SCRIPT_POLL_PERIOD: Duration = Duration::from_millis(10);

/// Session relative path tuning parameters are saved to.
const SAVE_PATH: &str = "tuning/tuning_params.json";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The writable side of the tuning parameters.
pub struct TuningSurface {
    params: TuningParams,
    cycler: FieldCycler,
    publisher: TuningPublisher,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The result of applying a command to the tuning surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The parameters changed and the new snapshot was published
    Published,

    /// A new colour bound was selected, with its current value
    Selected(TunableField, u8),

    /// The operator asked to see the parameters
    Show(TuningParams),

    /// The operator asked for the parameters to be saved
    Save(TuningParams),

    /// The operator asked for the vehicle to stop
    Stop,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TuningSurface {
    pub fn new(params: TuningParams, publisher: TuningPublisher) -> Self {
        Self {
            params,
            cycler: FieldCycler::new(),
            publisher,
        }
    }

    /// The working copy of the parameters.
    pub fn params(&self) -> &TuningParams {
        &self.params
    }

    /// Apply a command to the working copy.
    ///
    /// Commands which would leave the parameters invalid are rejected with no change made.
    pub fn apply(&mut self, cmd: &TuneCmd) -> Result<Outcome, TuningError> {
        let mut candidate = self.params.clone();

        match cmd {
            TuneCmd::Set { param, value } => candidate.set(*param, *value)?,
            TuneCmd::Next => {
                let field = self.cycler.next();
                return Ok(Outcome::Selected(field, field.get(&self.params.color_range)));
            }
            TuneCmd::Inc { step } => {
                self.cycler.inc(&mut candidate.color_range, *step);
            }
            TuneCmd::Dec { step } => {
                self.cycler.dec(&mut candidate.color_range, *step);
            }
            TuneCmd::Reset => self.cycler.reset(&mut candidate.color_range),
            TuneCmd::Mode { mode } => candidate.mode = *mode,
            TuneCmd::Show => return Ok(Outcome::Show(self.params.clone())),
            TuneCmd::Save => return Ok(Outcome::Save(self.params.clone())),
            TuneCmd::Stop => return Ok(Outcome::Stop),
        }

        self.publisher.publish(&candidate)?;
        self.params = candidate;

        Ok(Outcome::Published)
    }

    /// Apply a command and act on its outcome, logging the result.
    pub fn handle(&mut self, cmd: &TuneCmd, stop: &AtomicBool) {
        match self.apply(cmd) {
            Ok(Outcome::Published) => info!("Tuning updated: {:?}", cmd),
            Ok(Outcome::Selected(field, value)) => {
                info!("Currently modifying {}: value = {}", field.name(), value)
            }
            Ok(Outcome::Show(params)) => info!("Tuning parameters:\n{:#?}", params),
            Ok(Outcome::Save(params)) => {
                session::save_with_timestamp(SAVE_PATH, params);
                info!("Tuning parameters saved");
            }
            Ok(Outcome::Stop) => {
                info!("Stop requested");
                stop.store(true, Ordering::Relaxed);
            }
            Err(e) => warn!("Rejected tuning command {:?}: {}", cmd, e),
        }
    }

    /// Parse and handle one line typed by the operator.
    ///
    /// Blank lines are ignored and help requests are printed. Lines which aren't a valid command
    /// are returned as errors.
    pub fn handle_line(&mut self, line: &str, stop: &AtomicBool) -> Result<(), TcParseError> {
        match parse_tune_cmd(line) {
            Ok(cmd) => self.handle(&cmd, stop),
            Err(TcParseError::Empty) => (),
            Err(TcParseError::Help(text)) => info!("\n{}", text),
            Err(e) => return Err(e),
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run the tuning surface from the console, reading one command per line from stdin.
pub fn spawn_console(mut surface: TuningSurface, stop: Arc<AtomicBool>) -> JoinHandle<()> {
    thread::spawn(move || {
        info!("Tuning console ready, enter commands such as \"set kp 0.08\" or \"help\"");

        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    warn!("Could not read from the console: {}", e);
                    break;
                }
            };

            if let Err(e) = surface.handle_line(&line, &stop) {
                warn!("{}", e);
            }

            if stop.load(Ordering::Relaxed) {
                break;
            }
        }
    })
}

/// Run the tuning surface from a script, stopping the vehicle once the script ends.
pub fn spawn_script(
    mut surface: TuningSurface,
    mut script: ScriptInterpreter,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        match script.get_pending_tcs() {
            PendingTcs::None => thread::sleep(SCRIPT_POLL_PERIOD),
            PendingTcs::Some(cmds) => {
                for cmd in cmds.iter() {
                    surface.handle(cmd, &stop);
                }
            }
            PendingTcs::EndOfScript => {
                info!("End of tuning script reached, stopping");
                stop.store(true, Ordering::Relaxed);
                break;
            }
        }
    })
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::per::ColorRange;
    use crate::tuning::tuning_channel;
    use comms_if::tc::{DriveMode, TunableParam};

    fn surface() -> (TuningSurface, crate::tuning::TuningSubscriber) {
        let (publisher, subscriber) = tuning_channel(TuningParams::default()).unwrap();
        (
            TuningSurface::new(TuningParams::default(), publisher),
            subscriber,
        )
    }

    #[test]
    fn test_set_publishes() {
        let (mut surface, mut subscriber) = surface();

        let cmd = parse_tune_cmd("set kp 0.12").unwrap();
        assert_eq!(surface.apply(&cmd).unwrap(), Outcome::Published);
        assert_eq!(subscriber.latest().k_p, 0.12);

        let cmd = parse_tune_cmd("mode wall").unwrap();
        surface.apply(&cmd).unwrap();
        assert_eq!(subscriber.latest().mode, DriveMode::WallFollow);
        assert_eq!(subscriber.latest().k_p, 0.12);
    }

    #[test]
    fn test_invalid_rejected() {
        let (mut surface, mut subscriber) = surface();

        let cmd = TuneCmd::Set {
            param: TunableParam::SafetyStopSetpoint,
            value: 0.0,
        };
        assert!(surface.apply(&cmd).is_err());
        assert_eq!(surface.params(), &TuningParams::default());
        assert_eq!(subscriber.latest(), &TuningParams::default());
    }

    #[test]
    fn test_hsv_tuning() {
        let (mut surface, mut subscriber) = surface();

        // Default colour range has S_low = 100
        assert_eq!(
            surface.apply(&TuneCmd::Next).unwrap(),
            Outcome::Selected(TunableField::SLow, 100)
        );
        surface.apply(&TuneCmd::Inc { step: 10 }).unwrap();
        assert_eq!(subscriber.latest().color_range.lower.s, 110);

        surface.apply(&TuneCmd::Dec { step: 3 }).unwrap();
        assert_eq!(subscriber.latest().color_range.lower.s, 107);

        surface.apply(&TuneCmd::Reset).unwrap();
        assert_eq!(subscriber.latest().color_range, ColorRange::FULL);
    }

    #[test]
    fn test_stop_and_show() {
        let (mut surface, _subscriber) = surface();
        let stop = AtomicBool::new(false);

        assert_eq!(
            surface.apply(&TuneCmd::Show).unwrap(),
            Outcome::Show(TuningParams::default())
        );

        surface.handle(&TuneCmd::Stop, &stop);
        assert!(stop.load(Ordering::Relaxed));
    }

    #[test]
    fn test_console_lines() {
        let (mut surface, mut subscriber) = surface();
        let stop = AtomicBool::new(false);

        surface.handle_line("set angle-offset -0.1", &stop).unwrap();
        assert_eq!(subscriber.latest().angle_offset, -0.1);

        surface.handle_line("", &stop).unwrap();
        surface.handle_line("help", &stop).unwrap();
        surface.handle_line("set --help", &stop).unwrap();
        assert!(matches!(
            surface.handle_line("fly", &stop),
            Err(TcParseError::InvalidCmd(_))
        ));

        assert!(!stop.load(Ordering::Relaxed));
        surface.handle_line("stop", &stop).unwrap();
        assert!(stop.load(Ordering::Relaxed));
    }
}
