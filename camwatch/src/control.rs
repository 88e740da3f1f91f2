// THEORY:
// The control loop is the only stateful piece of the system. Its lifecycle is
// a small state machine:
//
//   Init -> CameraOpening -> CameraOpenFailed                     (terminal)
//                         -> Running -> UserStopped               (terminal)
//                                    -> ReadFailed                (terminal)
//                                    -> BackendFailed             (terminal)
//                                    -> Interrupted               (terminal)
//
// `Running` is the only state that iterates: read a frame, pass it through a
// `FrameStage`, hand it to the `PresentationSink`. Every transition out of
// `Running` releases the camera before `run` returns.
//
// Cancellation is cooperative. A Ctrl+C handler raises a `ShutdownFlag`; the
// loop checks it before each read and turns it into `Outcome::Interrupted`,
// which maps to a successful exit. An interrupt is a request, not a failure.

use crate::capture::{CameraOpener, CaptureSession, FrameSource};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::processor::{Detector, FrameProcessor, Raster, Resizer};
use crate::rate::{status_line, MonotonicClock, RateMonitor, TextOverlay};
use crate::sink::{Display, Flow, PresentationSink, SampleWriter, WindowSystem};
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    CameraOpenFailed,
    /// Exit key pressed or window closed.
    UserStopped,
    ReadFailed,
    BackendFailed,
    Interrupted,
}

/// Shared stop request, raised from a signal handler.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-frame work between capture and presentation.
pub trait FrameStage<F> {
    fn apply(&mut self, frame: F) -> Result<F>;
}

/// Shows frames exactly as captured.
pub struct Passthrough;

impl<F> FrameStage<F> for Passthrough {
    fn apply(&mut self, frame: F) -> Result<F> {
        Ok(frame)
    }
}

/// Source of timestamps for the rate monitor.
pub trait Clock {
    fn now_secs(&self) -> f64;
}

impl Clock for MonotonicClock {
    fn now_secs(&self) -> f64 {
        MonotonicClock::now_secs(self)
    }
}

/// Resize, detect, then stamp the model name and FPS onto the frame.
pub struct DetectionStage<R, D, O, C = MonotonicClock> {
    processor: FrameProcessor<R, D>,
    overlay: O,
    clock: C,
    monitor: RateMonitor,
    model_name: String,
}

impl<R, D, O, C: Clock> DetectionStage<R, D, O, C> {
    pub fn new(processor: FrameProcessor<R, D>, overlay: O, clock: C, model_name: &str, log_interval: u64) -> Self {
        let monitor = RateMonitor::new(clock.now_secs(), log_interval);
        Self {
            processor,
            overlay,
            clock,
            monitor,
            model_name: model_name.to_string(),
        }
    }

    pub fn fps(&self) -> f64 {
        self.monitor.fps()
    }
}

impl<F, R, D, O, C> FrameStage<F> for DetectionStage<R, D, O, C>
where
    F: Raster,
    R: Resizer<F>,
    D: Detector<F>,
    O: TextOverlay<F>,
    C: Clock,
{
    fn apply(&mut self, frame: F) -> Result<F> {
        let mut frame = self.processor.process(frame)?;
        let fps = self.monitor.tick(self.clock.now_secs());
        if let Err(err) = self.overlay.put_status(&mut frame, &status_line(&self.model_name, fps)) {
            warn!("Could not draw status overlay: {}", err);
        }
        Ok(frame)
    }
}

/// Opens the camera and runs the capture loop until something ends it.
///
/// The camera is released exactly once on every path that opened it. The
/// sink is borrowed, so the caller's drop of it closes any window afterwards.
pub fn run<O, D, W, S>(
    config: &SessionConfig,
    opener: &mut O,
    sink: &mut PresentationSink<D, W>,
    stage: &mut S,
    shutdown: &ShutdownFlag,
) -> Outcome
where
    O: CameraOpener,
    D: WindowSystem + Display<<O::Source as FrameSource>::Frame>,
    W: SampleWriter<<O::Source as FrameSource>::Frame>,
    S: FrameStage<<O::Source as FrameSource>::Frame>,
{
    let mut session = match CaptureSession::open(
        opener,
        config.camera_index,
        config.frame_width,
        config.frame_height,
        config.capture_api,
    ) {
        Ok(session) => session,
        Err(err) => {
            error!("{}", err);
            return Outcome::CameraOpenFailed;
        }
    };

    let outcome = drive(&mut session, sink, stage, shutdown);
    session.release();
    outcome
}

fn drive<Src, D, W, S>(
    session: &mut CaptureSession<Src>,
    sink: &mut PresentationSink<D, W>,
    stage: &mut S,
    shutdown: &ShutdownFlag,
) -> Outcome
where
    Src: FrameSource,
    D: WindowSystem + Display<Src::Frame>,
    W: SampleWriter<Src::Frame>,
    S: FrameStage<Src::Frame>,
{
    let mut frame_index: u64 = 0;
    loop {
        if shutdown.is_raised() {
            info!("Interrupted by user, releasing resources...");
            return Outcome::Interrupted;
        }

        let frame = match session.read_frame() {
            Ok(frame) => frame,
            // A signal can abort a blocking read; that is still an interrupt.
            Err(_) if shutdown.is_raised() => {
                info!("Interrupted by user, releasing resources...");
                return Outcome::Interrupted;
            }
            Err(err) => {
                warn!("Unable to read frame, the device may be disconnected or out of bandwidth: {}", err);
                return Outcome::ReadFailed;
            }
        };

        let frame = match stage.apply(frame) {
            Ok(frame) => frame,
            Err(err) => {
                error!("Frame processing failed: {}", err);
                return Outcome::BackendFailed;
            }
        };

        match sink.present(&frame, frame_index) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Stop) => return Outcome::UserStopped,
            Err(err) => {
                error!("Presentation failed: {}", err);
                return Outcome::BackendFailed;
            }
        }
        frame_index += 1;
    }
}
