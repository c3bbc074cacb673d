//! Main drive executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Start the tuning surface on its own thread (console or script)
//!     - Initialise DriveCtrl and the equipment
//!     - Main loop:
//!         - Tuning snapshot acquisition
//!         - Camera and LIDAR acquisition
//!         - DriveCtrl processing
//!         - Actuator demand dispatch
//!         - Archiving
//!
//! # Usage
//!
//! ```text
//! drive_exec [--replay <manifest>] [script]
//! ```
//!
//! If a tuning script is given the tuning commands are taken from it, otherwise they are read from
//! the console.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use drive_lib::{
    archive_sink::ArchiveSink,
    drive_ctrl::{ControlLoop, DriveCtrl, DriveCtrlError},
    params::DriveExecParams,
    replay_client,
    tuning::{self, TuningParams, TuningSurface},
};
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::ScriptInterpreter,
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Command line options.
#[derive(Debug, StructOpt)]
#[structopt(name = "drive_exec", about = "RACECAR autonomous drive executable")]
struct Opts {
    /// Replay manifest to drive from, overriding the one in drive_exec.toml
    #[structopt(long, parse(from_os_str))]
    replay: Option<PathBuf>,

    /// Tuning script to run instead of the tuning console
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("drive_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("RACECAR Drive Executable\n");
    info!("Running on: {}", host::get_hostname());
    info!("Session directory: {:?}\n", session.session_root);

    debug!("CLI options: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let exec_params: DriveExecParams =
        util::params::load("drive_exec.toml").wrap_err("Could not load exec params")?;

    let tuning_params: TuningParams = util::params::load(&exec_params.tuning_params_file)
        .wrap_err("Could not load tuning params")?;

    tuning_params
        .validate()
        .wrap_err("The initial tuning parameters are invalid")?;

    if !(exec_params.cycle_period_s.is_finite() && exec_params.cycle_period_s > 0.0) {
        return Err(eyre!(
            "The cycle period must be positive, got {} s",
            exec_params.cycle_period_s
        ));
    }

    info!("Exec parameters loaded");

    // ---- INITIALISE TUNING ----

    let stop = Arc::new(AtomicBool::new(false));

    let (publisher, subscriber) = tuning::tuning_channel(tuning_params.clone())
        .wrap_err("Failed to create the tuning channel")?;
    let surface = TuningSurface::new(tuning_params, publisher);

    match opts.script {
        Some(ref path) => {
            info!("Loading tuning script from {:?}", path);

            let si = ScriptInterpreter::new(path).wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} TCs\n",
                si.get_duration(),
                si.get_num_tcs()
            );

            tuning::spawn_script(surface, si, stop.clone());
        }
        None => {
            info!("No script provided, tuning commands will be read from the console\n");
            tuning::spawn_console(surface, stop.clone());
        }
    }

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut drive_ctrl = DriveCtrl::default();
    drive_ctrl
        .init((), &session)
        .wrap_err("Failed to initialise DriveCtrl")?;
    info!("DriveCtrl init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE EQUIPMENT ----

    let manifest = opts
        .replay
        .or_else(|| exec_params.replay_manifest.clone())
        .ok_or_else(|| {
            eyre!("No replay manifest given, pass one with --replay or set it in drive_exec.toml")
        })?;

    let (frames, scans, arming) = replay_client::load_replay(&manifest)
        .wrap_err_with(|| format!("Failed to load the replay from {:?}", manifest))?;
    info!("Replaying {} ticks from {:?}", frames.remaining(), manifest);

    let sink = ArchiveSink::new(&session)
        .map_err(|e| eyre!("Failed to create the archive sink: {}", e))?;

    let mut control_loop =
        ControlLoop::new(drive_ctrl, frames, scans, arming, sink, subscriber, stop.clone());

    // Debug frame directory
    let debug_frame_dir = session.session_root.join("debug_frames");
    if exec_params.save_debug_frames {
        std::fs::create_dir_all(&debug_frame_dir)
            .wrap_err("Failed to create the debug frame directory")?;
    }

    // ---- MAIN LOOP ----

    control_loop
        .start()
        .wrap_err("Could not start the control loop")?;

    info!("Begining main loop\n");

    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);
    let debug_frame_period = exec_params.debug_frame_period_cycles.max(1);
    let mut num_cycles: u64 = 0;
    let mut num_consec_cycle_overruns: u64 = 0;

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        if control_loop.frames().is_finished() {
            info!("End of replay reached, stopping");
            break;
        }

        // ---- CONTROL PROCESSING ----

        match control_loop.tick() {
            Ok(report) => {
                if !report.running && control_loop.stop_requested() {
                    break;
                }
            }
            Err(e @ DriveCtrlError::ActuatorUnavailable(_)) => {
                error!("{}", e);
                break;
            }
            Err(e) => warn!("Error during DriveCtrl processing: {}", e),
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = control_loop.drive_ctrl.write() {
            warn!("Could not write DriveCtrl archives: {}", e);
        }

        if exec_params.save_debug_frames && num_cycles % debug_frame_period == 0 {
            if let Some(img) = control_loop.annotated_frame() {
                let path = debug_frame_dir.join(format!("frame_{:06}.png", num_cycles));
                if let Err(e) = img.save(&path) {
                    warn!("Could not save debug frame to {:?}: {}", path, e);
                }
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                num_consec_cycle_overruns += 1;

                if let Some(max) = exec_params.max_consec_overruns {
                    if num_consec_cycle_overruns > max {
                        error!("More than {} consecutive cycle overruns, stopping", max);
                        break;
                    }
                }
            }
        }

        num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    if let Err(e) = control_loop.stop() {
        warn!("Could not stop the vehicle cleanly: {}", e);
    }

    info!(
        "Executed {} cycles, {} commands archived, final command {:?}",
        num_cycles,
        control_loop.sink().num_cmds(),
        control_loop.sink().last()
    );

    // Make sure the tuning thread knows we're done
    stop.store(true, Ordering::Relaxed);

    session.exit();

    info!("End of execution");

    Ok(())
}
