//! Implementations for the DriveCtrl state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use comms_if::{
    eqpt::{cam::CamImage, drive::DriveDems, lidar::LidarScan},
    tc::DriveMode,
};
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::time::Instant;

// Internal
use super::DriveCtrlError;
use crate::{
    ctrl::{safety_stop, wall_follow, ControllerState},
    lidar::closest_in_window,
    per::{self, Contour},
    tuning::{TuningError, TuningParams},
};
use util::{
    archive::{Archived, Archiver},
    module::State,
    session::{self, Session},
};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Drive control module state
#[derive(Default)]
pub struct DriveCtrl {
    mode: CtrlMode,

    ctrl_state: ControllerState,

    /// Last command computed before the arming gate
    last_raw_dems: DriveDems,

    /// Last distance measured in the forward window
    last_forward_cm: Option<f64>,

    /// Contour found on the last frame processed
    last_contour: Option<Contour>,

    pub(crate) report: StatusReport,
    arch_report: Archiver,
}

/// Input data to DriveCtrl.
pub struct InputData {
    /// Tuning snapshot taken at the start of the cycle
    pub params: TuningParams,

    /// New camera frame, if one arrived this cycle
    pub frame: Option<CamImage>,

    /// New LIDAR sweep, if one arrived this cycle
    pub scan: Option<LidarScan>,

    /// Arming trigger position, between 0 and 1
    pub trigger: f64,

    /// Time at which the cycle started
    pub now: Instant,
}

/// Status report for DriveCtrl processing.
///
/// The report is flat so that it can be archived as a CSV row.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct StatusReport {
    /// Session time of the cycle
    ///
    /// Units: seconds
    pub time_s: f64,

    pub running: bool,
    pub mode: DriveMode,

    pub new_frame: bool,
    pub new_scan: bool,

    pub target_found: bool,
    pub centroid_row: Option<f64>,
    pub centroid_col: Option<f64>,
    pub contour_area: Option<usize>,

    /// Column of the target minus the centre column of the frame
    ///
    /// Units: pixels
    pub lateral_error: Option<f64>,

    pub forward_distance_cm: Option<f64>,

    /// True if there were no returns in the forward window this cycle
    pub forward_dropout: bool,

    pub left_distance_cm: Option<f64>,
    pub right_distance_cm: Option<f64>,

    /// True if one of the side windows had no returns this cycle
    pub side_dropout: bool,

    /// True if the steering demand was held from the previous cycle
    pub angle_held: bool,

    /// Time since the previous steering PID update, zero if the PID didn't run
    ///
    /// Units: seconds
    pub dt_s: f64,

    pub raw_speed: f64,
    pub raw_angle: f64,

    pub armed: bool,

    /// Speed demand sent to the actuators
    pub speed: f64,

    /// Steering demand sent to the actuators
    pub angle: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Operating mode of DriveCtrl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CtrlMode {
    /// Demands held at zero
    Idle,

    /// Closed loop control active
    Running,
}

impl Default for CtrlMode {
    fn default() -> Self {
        CtrlMode::Idle
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl State for DriveCtrl {
    type InitData = ();
    type InitError = DriveCtrlError;

    type InputData = InputData;
    type OutputData = DriveDems;
    type StatusReport = StatusReport;
    type ProcError = DriveCtrlError;

    /// Initialise the DriveCtrl module, creating its archives in the session.
    fn init(&mut self, _init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        // Create the arch folder for drive_ctrl
        std::fs::create_dir_all(session.arch_root.join("drive_ctrl"))
            .map_err(|e| DriveCtrlError::ArchiveError(e.to_string()))?;

        self.arch_report = Archiver::from_path(session, "drive_ctrl/status_report.csv")
            .map_err(|e| DriveCtrlError::ArchiveError(e.to_string()))?;

        Ok(())
    }

    /// Perform cyclic processing of DriveCtrl.
    ///
    /// The returned demands have already been clamped and passed through the arming gate.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport {
            time_s: session::get_elapsed_seconds(),
            mode: input_data.params.mode,
            ..Default::default()
        };

        if self.mode == CtrlMode::Idle {
            return Ok((DriveDems::stop(), self.report));
        }
        self.report.running = true;

        let params = &input_data.params;
        self.report.new_frame = input_data.frame.is_some();
        self.report.new_scan = input_data.scan.is_some();

        // ---- STEERING ----

        let angle = match params.mode {
            DriveMode::LineFollow => match input_data.frame {
                Some(ref frame) => self.line_follow_angle(frame, input_data.scan.as_ref(), params, input_data.now)?,
                None => None,
            },
            DriveMode::WallFollow => self.wall_follow_angle(input_data.scan.as_ref(), params)?,
        };

        let angle = match angle {
            Some(a) => a,
            None => {
                self.report.angle_held = true;
                self.last_raw_dems.angle
            }
        };

        // ---- SPEED ----

        let speed = match input_data.scan {
            Some(ref scan) => self.safety_stop_speed(scan, params)?,
            // Nothing new from either sensor, keep the previous command
            None if input_data.frame.is_none() => self.last_raw_dems.speed,
            None => self.safety_stop_from_last(params),
        };

        let raw = DriveDems::new_clamped(speed, angle);
        self.last_raw_dems = raw;
        self.report.raw_speed = raw.speed;
        self.report.raw_angle = raw.angle;

        // ---- ARMING GATE ----

        let armed = input_data.trigger > params.arming_threshold;
        self.report.armed = armed;

        let output = if armed { raw } else { DriveDems::stop() };
        self.report.speed = output.speed;
        self.report.angle = output.angle;

        trace!(
            "DriveCtrl output: speed = {:.3}, angle = {:.3} (armed = {})",
            output.speed,
            output.angle,
            armed
        );

        Ok((output, self.report))
    }
}

impl Archived for DriveCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;

        Ok(())
    }
}

impl DriveCtrl {
    /// Move from Idle to Running.
    ///
    /// The tuning parameters are validated first, and the controller memory is cleared so that
    /// no integral or derivative state carries over from a previous run.
    pub fn start(&mut self, params: &TuningParams) -> Result<(), DriveCtrlError> {
        params.validate()?;

        self.ctrl_state = ControllerState::default();
        self.last_raw_dems = DriveDems::stop();
        self.last_forward_cm = None;
        self.last_contour = None;
        self.mode = CtrlMode::Running;

        info!("DriveCtrl running in {:?} mode", params.mode);

        Ok(())
    }

    /// Move to Idle, holding the demands at zero.
    pub fn stop(&mut self) {
        if self.mode == CtrlMode::Running {
            info!("DriveCtrl stopped");
        }

        self.mode = CtrlMode::Idle;
        self.last_raw_dems = DriveDems::stop();
    }

    pub fn mode(&self) -> CtrlMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.mode == CtrlMode::Running
    }

    /// The contour found on the most recent frame, if any.
    pub fn last_contour(&self) -> Option<&Contour> {
        self.last_contour.as_ref()
    }

    /// Steering demand from the line in the frame.
    ///
    /// If there's no line visible the wall follower is used when enabled, otherwise `None` is
    /// returned and the previous angle is held.
    fn line_follow_angle(
        &mut self,
        frame: &CamImage,
        scan: Option<&LidarScan>,
        params: &TuningParams,
        now: Instant,
    ) -> Result<Option<f64>, DriveCtrlError> {
        let rgb = frame.to_rgb();
        let contour = per::extract(
            &rgb,
            &params.color_range,
            params.min_contour_area,
            &params.crop,
        );
        self.last_contour = contour;

        match contour {
            Some(c) => {
                let error = c.centroid_col - rgb.width() as f64 / 2.0;

                self.report.target_found = true;
                self.report.centroid_row = Some(c.centroid_row);
                self.report.centroid_col = Some(c.centroid_col);
                self.report.contour_area = Some(c.area);
                self.report.lateral_error = Some(error);

                // The PID clock only runs when the PID does, so a stall doesn't shrink dt
                let dt = self.ctrl_state.advance_clock(now);
                self.report.dt_s = dt;

                Ok(Some(params.steer_ctrl().compute(
                    error,
                    dt,
                    &mut self.ctrl_state,
                )))
            }
            None => {
                debug!("No target found in frame");

                if params.wall_follow_fallback {
                    self.wall_follow_angle(scan, params)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Steering demand keeping the vehicle between the walls, or `None` without a sweep.
    fn wall_follow_angle(
        &mut self,
        scan: Option<&LidarScan>,
        params: &TuningParams,
    ) -> Result<Option<f64>, DriveCtrlError> {
        let scan = match scan {
            Some(s) => s,
            None => return Ok(None),
        };

        let walls = params
            .side_windows()
            .map_err(TuningError::from)?
            .measure(scan, params.far_distance_cm);

        self.report.left_distance_cm = Some(walls.left_cm);
        self.report.right_distance_cm = Some(walls.right_cm);
        self.report.side_dropout = walls.left_dropout || walls.right_dropout;

        Ok(Some(wall_follow::compute(
            walls.left_cm,
            walls.right_cm,
            params.wall_follow_kp(),
        )))
    }

    /// Speed demand from the nearest obstacle in the forward window of a new sweep.
    fn safety_stop_speed(
        &mut self,
        scan: &LidarScan,
        params: &TuningParams,
    ) -> Result<f64, DriveCtrlError> {
        let window = params.forward_window().map_err(TuningError::from)?;

        match closest_in_window(scan, &window) {
            Some((angle, distance)) => {
                trace!("Nearest obstacle {:.1} cm at {:.1} deg", distance, angle);
                self.last_forward_cm = Some(distance);
            }
            None => {
                self.report.forward_dropout = true;
                warn!(
                    "No LIDAR returns in the forward window, holding last distance ({:?} cm)",
                    self.last_forward_cm
                );
            }
        }

        Ok(self.safety_stop_from_last(params))
    }

    /// Speed demand from the last known forward distance, full speed if nothing was ever seen.
    fn safety_stop_from_last(&mut self, params: &TuningParams) -> f64 {
        self.report.forward_distance_cm = self.last_forward_cm;

        match self.last_forward_cm {
            Some(d) => safety_stop::compute(
                d,
                params.safety_stop_setpoint_cm,
                params.safety_stop_kp(),
                params.speed_limit,
            ),
            None => params.speed_limit,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::time::Duration;

    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
    const GREY: Rgb<u8> = Rgb([90, 90, 90]);

    /// 320x240 frame with a 21 px wide blue line centred on `col`, or no line at all.
    fn frame(line_col: Option<u32>) -> CamImage {
        CamImage::from_rgb(RgbImage::from_fn(320, 240, |x, y| match line_col {
            Some(col) if y >= 190 && x + 10 >= col && x <= col + 10 => BLUE,
            _ => GREY,
        }))
    }

    fn d_only_params() -> TuningParams {
        let mut p = TuningParams::default();
        p.color_range =
            per::ColorRange::new(per::Hsv::new(100, 150, 150), per::Hsv::new(130, 255, 255));
        p.k_p = 0.0;
        p.k_i = 0.0;
        p.k_d = 0.1;
        p
    }

    fn input(params: &TuningParams, frame: Option<CamImage>, now: Instant) -> InputData {
        InputData {
            params: params.clone(),
            frame,
            scan: None,
            trigger: 1.0,
            now,
        }
    }

    #[test]
    fn test_pid_dt_spans_ticks_without_target() {
        let params = d_only_params();
        let mut drive_ctrl = DriveCtrl::default();
        drive_ctrl.start(&params).unwrap();

        let t0 = Instant::now();
        let tick = Duration::from_millis(50);

        // Error +40, first update so no derivative
        let (dems, report) = drive_ctrl
            .proc(&input(&params, Some(frame(Some(200))), t0))
            .unwrap();
        assert_eq!(report.lateral_error, Some(40.0));
        assert_eq!(dems.angle, 0.0);

        // Four ticks with no frame and one with a frame but no line, all holding the angle
        for i in 1..=5 {
            let f = if i == 3 { Some(frame(None)) } else { None };
            let (dems, report) = drive_ctrl.proc(&input(&params, f, t0 + tick * i)).unwrap();
            assert!(report.angle_held);
            assert_eq!(report.dt_s, 0.0);
            assert_eq!(dems.angle, 0.0);
        }

        // Error +10 at 0.3 s, the derivative is taken over the whole gap since the last update
        let (dems, report) = drive_ctrl
            .proc(&input(&params, Some(frame(Some(170))), t0 + tick * 6))
            .unwrap();
        assert_eq!(report.lateral_error, Some(10.0));
        assert!((report.dt_s - 0.3).abs() < 1e-9);
        assert!((dems.angle - -0.1).abs() < 1e-9);

        // The integral also spans the gap: 40 * 0 + 10 * 0.3
        assert!((drive_ctrl.ctrl_state.integral - 3.0).abs() < 1e-9);
        assert_eq!(drive_ctrl.ctrl_state.previous_error, 10.0);
    }

    #[test]
    fn test_restart_clears_pid_memory() {
        let params = d_only_params();
        let mut drive_ctrl = DriveCtrl::default();
        drive_ctrl.start(&params).unwrap();

        let t0 = Instant::now();
        drive_ctrl
            .proc(&input(&params, Some(frame(Some(200))), t0))
            .unwrap();

        drive_ctrl.stop();
        drive_ctrl.start(&params).unwrap();

        // First update after a restart has no derivative kick from the old error
        let (dems, report) = drive_ctrl
            .proc(&input(
                &params,
                Some(frame(Some(100))),
                t0 + Duration::from_secs(2),
            ))
            .unwrap();
        assert_eq!(report.dt_s, 0.0);
        assert_eq!(dems.angle, 0.0);
    }
}
