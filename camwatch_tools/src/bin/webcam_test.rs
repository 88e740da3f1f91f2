//! Live USB camera preview.
//!
//! Shows camera 0 in a window until Escape or `q` is pressed or the window is
//! closed. Without a display, writes `headless_frame.jpg` every 30 frames
//! until Ctrl+C.

use camwatch::{run, DisplayMode, Headless, Passthrough, PresentationSink, SessionConfig};
use camwatch_tools::{runtime, CvCameraOpener, HighGui, JpegWriter};
use std::process::ExitCode;

fn main() -> ExitCode {
    runtime::init_logging();
    let config = SessionConfig::webcam_test();
    let shutdown = runtime::install_interrupt_handler();

    let headless = Headless::new(
        JpegWriter,
        config.sample_path.clone(),
        config.sample_interval,
        config.headless_pause,
    );
    let mut sink = PresentationSink::select(DisplayMode::detect(), HighGui, &config.window_name, headless);

    let outcome = run(&config, &mut CvCameraOpener, &mut sink, &mut Passthrough, &shutdown);
    // Closes the window, if any, after the camera is released.
    drop(sink);

    ExitCode::from(config.exit_policy.code_for(outcome))
}
