//! # Tuning snapshot transport
//!
//! The tuning surface owns the only writable copy of the parameters. Every change is published
//! as a whole snapshot over a channel, and the control loop picks up the newest snapshot at the
//! start of each cycle. Neither side ever sees a half-applied update.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

use super::{TuningError, TuningParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Sending half of the tuning channel.
#[derive(Clone)]
pub struct TuningPublisher {
    sender: Sender<TuningParams>,
}

/// Receiving half of the tuning channel, held by the control loop.
pub struct TuningSubscriber {
    receiver: Receiver<TuningParams>,
    current: TuningParams,
    disconnected: bool,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create a new tuning channel starting from the given parameters.
///
/// The initial parameters must be valid.
pub fn tuning_channel(
    initial: TuningParams,
) -> Result<(TuningPublisher, TuningSubscriber), TuningError> {
    initial.validate()?;

    let (sender, receiver) = channel();

    Ok((
        TuningPublisher { sender },
        TuningSubscriber {
            receiver,
            current: initial,
            disconnected: false,
        },
    ))
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TuningPublisher {
    /// Validate and publish a snapshot of the parameters.
    ///
    /// Invalid parameters are never sent.
    pub fn publish(&self, params: &TuningParams) -> Result<(), TuningError> {
        params.validate()?;

        self.sender
            .send(params.clone())
            .map_err(|_| TuningError::Disconnected)
    }
}

impl TuningSubscriber {
    /// Drain all pending snapshots and return the newest valid one.
    ///
    /// If nothing new has been published the previous snapshot is returned.
    pub fn latest(&mut self) -> &TuningParams {
        loop {
            match self.receiver.try_recv() {
                Ok(p) => match p.validate() {
                    Ok(()) => {
                        debug!("New tuning snapshot received");
                        self.current = p;
                    }
                    Err(e) => warn!("Ignoring invalid tuning snapshot: {}", e),
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        warn!("Tuning surface disconnected, parameters are now fixed");
                        self.disconnected = true;
                    }
                    break;
                }
            }
        }

        &self.current
    }

    /// The most recently received snapshot, without checking for new ones.
    pub fn current(&self) -> &TuningParams {
        &self.current
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
