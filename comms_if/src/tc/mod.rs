//! # Telecommand module
//!
//! Telecommands are the instructions sent to the drive executable from outside the control loop.
//! Currently these are the tuning commands issued by an operator (or a tuning script) to adjust
//! the controller parameters while the vehicle is running.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod tune;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use structopt::{clap::ErrorKind, StructOpt};
use thiserror::Error;

// Internal
pub use tune::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("The command is empty")]
    Empty,

    #[error("Invalid tuning command: {0}")]
    InvalidCmd(String),

    /// The operator asked for usage information, which is carried as the message
    #[error("{0}")]
    Help(String),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse a tuning command from a single line of text, for example `set kp 0.08`.
pub fn parse_tune_cmd(line: &str) -> Result<TuneCmd, TcParseError> {
    let words: Vec<&str> = line.split_whitespace().collect();

    if words.is_empty() {
        return Err(TcParseError::Empty);
    }

    // structopt expects the binary name as the first argument
    TuneCmd::from_iter_safe(std::iter::once("tune").chain(words.into_iter())).map_err(|e| {
        match e.kind {
            ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => TcParseError::Help(e.message),
            _ => TcParseError::InvalidCmd(e.message),
        }
    })
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_tune_cmd() {
        assert_eq!(
            parse_tune_cmd("set kp 0.08").unwrap(),
            TuneCmd::Set {
                param: TunableParam::Kp,
                value: 0.08
            }
        );
        assert_eq!(
            parse_tune_cmd("  mode wall ").unwrap(),
            TuneCmd::Mode {
                mode: DriveMode::WallFollow
            }
        );
        assert_eq!(
            parse_tune_cmd("set angle-offset -0.1").unwrap(),
            TuneCmd::Set {
                param: TunableParam::AngleOffset,
                value: -0.1
            }
        );
        assert_eq!(parse_tune_cmd("inc").unwrap(), TuneCmd::Inc { step: 1 });
        assert_eq!(parse_tune_cmd("dec 5").unwrap(), TuneCmd::Dec { step: 5 });
        assert_eq!(parse_tune_cmd("next").unwrap(), TuneCmd::Next);

        assert_eq!(
            parse_tune_cmd("set kp -0.05").unwrap(),
            TuneCmd::Set {
                param: TunableParam::Kp,
                value: -0.05
            }
        );

        assert!(matches!(parse_tune_cmd("   "), Err(TcParseError::Empty)));
        assert!(matches!(
            parse_tune_cmd("set warp 9"),
            Err(TcParseError::InvalidCmd(_))
        ));
        assert!(matches!(
            parse_tune_cmd("fly"),
            Err(TcParseError::InvalidCmd(_))
        ));
    }

    #[test]
    fn test_help_is_not_an_error() {
        for line in ["help", "--help", "help set", "set --help"].iter() {
            match parse_tune_cmd(line) {
                Err(TcParseError::Help(text)) => assert!(text.contains("USAGE")),
                other => panic!("Expected help for {:?}, got {:?}", line, other),
            }
        }
    }
}
