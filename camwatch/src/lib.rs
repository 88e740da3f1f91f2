// THEORY:
// This file is the entry point for the `camwatch` library crate.
// It holds the whole camera loop as plain Rust behind a handful of traits:
// opening and reading a camera, resizing and annotating a frame, showing it in
// a window or writing a sample to disk. Nothing here links against OpenCV;
// the `camwatch_tools` crate supplies the OpenCV-backed implementations and
// the two executables.
//
// Modules:
// - `env_probe` decides once whether a display is available.
// - `capture` owns the camera handle and guarantees it is released.
// - `processor` normalises frame size and hands frames to a detector.
// - `sink` shows or persists frames.
// - `rate` measures frames per second.
// - `control` ties them together and maps how the loop ended to an exit code.

pub mod capture;
pub mod config;
pub mod control;
pub mod env_probe;
pub mod error;
pub mod processor;
pub mod rate;
pub mod sink;

pub use capture::{CameraOpener, CaptureApi, CaptureSession, FrameSource};
pub use config::{DetectorConfig, ExitPolicy, SessionConfig};
pub use control::{run, Clock, DetectionStage, FrameStage, Outcome, Passthrough, ShutdownFlag};
pub use env_probe::DisplayMode;
pub use error::{CamError, Result};
pub use processor::{Detector, FrameProcessor, Raster, Resizer};
pub use rate::{MonotonicClock, RateMonitor, TextOverlay};
pub use sink::{Display, Flow, Headless, PresentationSink, SampleWriter, Window, WindowSystem};
