//! Person detection on a live USB camera.
//!
//! Loads `yolov8n.onnx`, then runs every frame through the detector at
//! 640x480 with the model name and FPS drawn in the corner.
//!
//! Exit codes: 0 normal stop or Ctrl+C, 1 model load failure, 2 camera open
//! failure, 3 frame read failure.

use camwatch::{
    run, DetectionStage, DetectorConfig, DisplayMode, FrameProcessor, Headless, MonotonicClock,
    PresentationSink, SessionConfig,
};
use camwatch_tools::{runtime, CvCameraOpener, CvResizer, HighGui, JpegWriter, PersonDetector, StatusText};
use log::{error, info};
use std::process::ExitCode;

fn main() -> ExitCode {
    runtime::init_logging();
    let config = SessionConfig::human_detect();
    let detector_config = DetectorConfig::default();
    let model_name = detector_config.model_name();

    let detector = match PersonDetector::load(detector_config) {
        Ok(detector) => detector,
        Err(err) => {
            error!("{}", err);
            return ExitCode::from(config.exit_policy.model_load_failed);
        }
    };

    let shutdown = runtime::install_interrupt_handler();
    let headless = Headless::new(
        JpegWriter,
        config.sample_path.clone(),
        config.sample_interval,
        config.headless_pause,
    );
    let mut sink = PresentationSink::select(DisplayMode::detect(), HighGui, &config.window_name, headless);
    if sink.is_windowed() {
        info!("Live preview in window '{}'; press Esc or q to quit", config.window_name);
    } else {
        info!("Live preview disabled; status is reported on the terminal only");
    }

    let processor = FrameProcessor::new(CvResizer, detector, config.frame_width, config.frame_height);
    let mut stage = DetectionStage::new(
        processor,
        StatusText,
        MonotonicClock::new(),
        &model_name,
        config.fps_log_interval,
    );

    let outcome = run(&config, &mut CvCameraOpener, &mut sink, &mut stage, &shutdown);
    drop(sink);

    ExitCode::from(config.exit_policy.code_for(outcome))
}
