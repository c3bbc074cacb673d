//! # Control loop
//!
//! Runs one DriveCtrl cycle per tick against the vehicle's equipment.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use comms_if::eqpt::{cam::CamImage, drive::DriveDems};
use image::RgbImage;
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

// Internal
use super::{DriveCtrl, DriveCtrlError, InputData, StatusReport};
use crate::{
    eqpt::{ActuatorSink, ArmingInput, FrameSource, ScanSource},
    per,
    tuning::TuningSubscriber,
};
use util::module::State;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// The control loop, owning DriveCtrl and the equipment it reads from and commands.
pub struct ControlLoop<F, S, A, K> {
    pub drive_ctrl: DriveCtrl,

    frames: F,
    scans: S,
    arming: A,
    sink: K,

    tuning: TuningSubscriber,

    /// Set by any thread to stop the vehicle at the start of the next tick
    stop: Arc<AtomicBool>,

    /// Frame processed on the last tick it arrived
    last_frame: Option<CamImage>,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl<F, S, A, K> ControlLoop<F, S, A, K>
where
    F: FrameSource,
    S: ScanSource,
    A: ArmingInput,
    K: ActuatorSink,
{
    pub fn new(
        drive_ctrl: DriveCtrl,
        frames: F,
        scans: S,
        arming: A,
        sink: K,
        tuning: TuningSubscriber,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            drive_ctrl,
            frames,
            scans,
            arming,
            sink,
            tuning,
            stop,
            last_frame: None,
        }
    }

    /// Start closed loop control using the current tuning snapshot.
    pub fn start(&mut self) -> Result<(), DriveCtrlError> {
        let params = self.tuning.latest().clone();
        self.drive_ctrl.start(&params)
    }

    /// Stop the vehicle and return to Idle.
    pub fn stop(&mut self) -> Result<(), DriveCtrlError> {
        self.drive_ctrl.stop();
        self.dispatch(DriveDems::stop())
    }

    /// True once a stop has been requested through the shared stop flag.
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Run a single cycle of the loop.
    ///
    /// Sensor errors are treated as missing data. If the actuators fail the vehicle is put into
    /// Idle and `DriveCtrlError::ActuatorUnavailable` is returned.
    pub fn tick(&mut self) -> Result<StatusReport, DriveCtrlError> {
        let now = Instant::now();

        if self.stop_requested() && self.drive_ctrl.is_running() {
            info!("Stop signal received");
            self.drive_ctrl.stop();
        }

        // ---- DATA INPUT ----

        let params = self.tuning.latest().clone();

        let (frame, scan, trigger) = if self.drive_ctrl.is_running() {
            let frame = match self.frames.latest_frame() {
                Ok(f) => f,
                Err(e) => {
                    warn!("Could not get camera frame: {}", e);
                    None
                }
            };
            let scan = match self.scans.latest_scan() {
                Ok(s) => s,
                Err(e) => {
                    warn!("Could not get LIDAR scan: {}", e);
                    None
                }
            };

            (frame, scan, self.arming.trigger())
        } else {
            (None, None, 0.0)
        };

        let input = InputData {
            params,
            frame,
            scan,
            trigger,
            now,
        };

        // ---- PROCESSING ----

        let (dems, report) = self.drive_ctrl.proc(&input)?;

        if input.frame.is_some() {
            self.last_frame = input.frame;
        }

        // ---- OUTPUT ----

        self.dispatch(dems)?;

        Ok(report)
    }

    /// The last frame processed with the target drawn on, if a target was found in it.
    pub fn annotated_frame(&self) -> Option<RgbImage> {
        match (&self.last_frame, self.drive_ctrl.last_contour()) {
            (Some(frame), Some(contour)) => Some(per::annotate(&frame.to_rgb(), contour)),
            _ => None,
        }
    }

    pub fn frames(&self) -> &F {
        &self.frames
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    fn dispatch(&mut self, dems: DriveDems) -> Result<(), DriveCtrlError> {
        match self.sink.set_command(dems.clamped()) {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("Could not command the actuators: {}", e);
                self.drive_ctrl.stop();

                // The actuators may still accept a stop even if the last demand failed
                if let Err(e) = self.sink.set_command(DriveDems::stop()) {
                    warn!("Could not send stop to the actuators: {}", e);
                }

                Err(DriveCtrlError::ActuatorUnavailable(e))
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        drive_ctrl::CtrlMode,
        eqpt::EqptError,
        tuning::{tuning_channel, TuningParams},
    };
    use comms_if::{eqpt::lidar::LidarScan, tc::DriveMode};
    use image::Rgb;
    use std::collections::VecDeque;

    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
    const GREY: Rgb<u8> = Rgb([90, 90, 90]);

    struct Frames(VecDeque<Option<CamImage>>);
    struct Scans(VecDeque<Option<LidarScan>>);
    struct Trigger(f64);

    #[derive(Default)]
    struct Sink {
        sent: Vec<DriveDems>,
        fail: bool,
    }

    impl FrameSource for Frames {
        fn latest_frame(&mut self) -> Result<Option<CamImage>, EqptError> {
            Ok(self.0.pop_front().flatten())
        }
    }

    impl ScanSource for Scans {
        fn latest_scan(&mut self) -> Result<Option<LidarScan>, EqptError> {
            Ok(self.0.pop_front().flatten())
        }
    }

    impl ArmingInput for Trigger {
        fn trigger(&mut self) -> f64 {
            self.0
        }
    }

    impl ActuatorSink for Sink {
        fn set_command(&mut self, dems: DriveDems) -> Result<(), EqptError> {
            if self.fail && dems != DriveDems::stop() {
                return Err(EqptError::NotConnected);
            }
            self.sent.push(dems);
            Ok(())
        }
    }

    /// 320x240 frame with a 21 px wide blue line centred on `col`, inside the floor crop.
    fn line_frame(col: u32) -> CamImage {
        CamImage::from_rgb(RgbImage::from_fn(320, 240, |x, y| {
            if y >= 190 && x + 10 >= col && x <= col + 10 {
                BLUE
            } else {
                GREY
            }
        }))
    }

    fn uniform_scan(distance_cm: f64) -> LidarScan {
        LidarScan::new(vec![distance_cm; 360])
    }

    fn blue_params() -> TuningParams {
        let mut p = TuningParams::default();
        p.color_range = per::ColorRange::new(per::Hsv::new(100, 150, 150), per::Hsv::new(130, 255, 255));
        p.k_p = 0.08;
        p.k_i = 0.0;
        p.k_d = 0.0;
        p
    }

    fn make_loop(
        params: TuningParams,
        frames: Vec<Option<CamImage>>,
        scans: Vec<Option<LidarScan>>,
        trigger: f64,
    ) -> ControlLoop<Frames, Scans, Trigger, Sink> {
        let (_publisher, subscriber) = tuning_channel(params).unwrap();
        ControlLoop::new(
            DriveCtrl::default(),
            Frames(frames.into_iter().collect()),
            Scans(scans.into_iter().collect()),
            Trigger(trigger),
            Sink::default(),
            subscriber,
            Arc::new(AtomicBool::new(false)),
        )
    }

    #[test]
    fn test_line_follow_scenario() {
        // Line 40 px left of centre, obstacle 30 cm ahead with a 50 cm stand-off
        let mut cl = make_loop(
            blue_params(),
            vec![Some(line_frame(120))],
            vec![Some(uniform_scan(30.0))],
            1.0,
        );
        cl.start().unwrap();

        let report = cl.tick().unwrap();
        assert!(report.target_found);
        assert_eq!(report.lateral_error, Some(-40.0));
        assert!((report.angle - -0.032).abs() < 1e-9);
        assert!(report.speed < 0.0);
        assert!(report.speed >= -0.5);
        assert!(report.armed);

        let sent = cl.sink().sent.last().unwrap();
        assert_eq!(sent.speed, report.speed);
        assert_eq!(sent.angle, report.angle);
    }

    #[test]
    fn test_arming_gate() {
        for trigger in [0.0, 0.05, 0.1].iter() {
            let mut cl = make_loop(
                blue_params(),
                vec![Some(line_frame(200))],
                vec![Some(uniform_scan(500.0))],
                *trigger,
            );
            cl.start().unwrap();

            let report = cl.tick().unwrap();
            assert!(!report.armed);
            assert!(report.raw_speed > 0.0);
            assert_eq!(cl.sink().sent.last(), Some(&DriveDems::stop()));
        }
    }

    #[test]
    fn test_idle_holds_zero() {
        let mut cl = make_loop(
            blue_params(),
            vec![Some(line_frame(200))],
            vec![Some(uniform_scan(500.0))],
            1.0,
        );

        let report = cl.tick().unwrap();
        assert!(!report.running);
        assert_eq!(cl.drive_ctrl.mode(), CtrlMode::Idle);
        assert_eq!(cl.sink().sent, vec![DriveDems::stop()]);
    }

    #[test]
    fn test_hold_without_new_data() {
        let mut cl = make_loop(
            blue_params(),
            vec![Some(line_frame(200)), None, None],
            vec![Some(uniform_scan(500.0)), None, Some(LidarScan::new(vec![0.0; 360]))],
            1.0,
        );
        cl.start().unwrap();

        let first = cl.tick().unwrap();
        assert!(first.angle > 0.0);
        assert_eq!(first.speed, 0.5);

        // No frame and no scan reuses the last command
        let second = cl.tick().unwrap();
        assert!(second.angle_held);
        assert_eq!((second.speed, second.angle), (first.speed, first.angle));

        // A sweep with no returns holds the last forward distance
        let third = cl.tick().unwrap();
        assert!(third.forward_dropout);
        assert_eq!(third.forward_distance_cm, Some(500.0));
        assert_eq!(third.speed, 0.5);
    }

    #[test]
    fn test_clear_path_without_returns() {
        let mut cl = make_loop(
            blue_params(),
            vec![Some(line_frame(160))],
            vec![Some(LidarScan::new(vec![0.0; 360]))],
            1.0,
        );
        cl.start().unwrap();

        let report = cl.tick().unwrap();
        assert!(report.forward_dropout);
        assert_eq!(report.forward_distance_cm, None);
        assert_eq!(report.speed, 0.5);
    }

    #[test]
    fn test_wall_follow_mode() {
        let mut params = blue_params();
        params.mode = DriveMode::WallFollow;

        let mut d = vec![500.0; 360];
        d[270] = 40.0;
        d[90] = 80.0;

        let mut cl = make_loop(params, vec![None], vec![Some(LidarScan::new(d))], 1.0);
        cl.start().unwrap();

        let report = cl.tick().unwrap();
        assert_eq!(report.left_distance_cm, Some(40.0));
        assert_eq!(report.right_distance_cm, Some(80.0));

        // Right wall further away steers right
        assert!((report.angle - 0.01 * 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_wall_follow_fallback() {
        let mut params = blue_params();
        params.wall_follow_fallback = true;

        let mut d = vec![500.0; 360];
        d[270] = 90.0;
        d[90] = 30.0;
        let grey = CamImage::from_rgb(RgbImage::from_pixel(320, 240, GREY));

        let mut cl = make_loop(params, vec![Some(grey)], vec![Some(LidarScan::new(d))], 1.0);
        cl.start().unwrap();

        let report = cl.tick().unwrap();
        assert!(!report.target_found);
        assert!(!report.angle_held);
        assert!(report.angle < 0.0);
    }

    #[test]
    fn test_stop_signal() {
        let mut cl = make_loop(
            blue_params(),
            vec![Some(line_frame(200)), Some(line_frame(200))],
            vec![Some(uniform_scan(500.0)), Some(uniform_scan(500.0))],
            1.0,
        );
        cl.start().unwrap();
        cl.tick().unwrap();

        cl.stop.store(true, Ordering::Relaxed);
        let report = cl.tick().unwrap();
        assert!(!report.running);
        assert_eq!(cl.sink().sent.last(), Some(&DriveDems::stop()));
    }

    #[test]
    fn test_actuator_failure() {
        let mut cl = make_loop(
            blue_params(),
            vec![Some(line_frame(200))],
            vec![Some(uniform_scan(500.0))],
            1.0,
        );
        cl.sink.fail = true;
        cl.start().unwrap();

        assert!(matches!(
            cl.tick(),
            Err(DriveCtrlError::ActuatorUnavailable(_))
        ));
        assert_eq!(cl.drive_ctrl.mode(), CtrlMode::Idle);
        assert_eq!(cl.sink().sent.last(), Some(&DriveDems::stop()));
    }

    #[test]
    fn test_start_rejects_invalid_tuning() {
        let mut dc = DriveCtrl::default();
        let mut params = TuningParams::default();
        params.safety_stop_setpoint_cm = 0.0;

        assert!(matches!(
            dc.start(&params),
            Err(DriveCtrlError::InvalidTuning(_))
        ));
        assert!(!dc.is_running());
    }

    #[test]
    fn test_annotated_frame() {
        let mut cl = make_loop(
            blue_params(),
            vec![Some(line_frame(200))],
            vec![Some(uniform_scan(500.0))],
            1.0,
        );
        assert!(cl.annotated_frame().is_none());

        cl.start().unwrap();
        cl.tick().unwrap();
        assert!(cl.annotated_frame().is_some());
    }
}
