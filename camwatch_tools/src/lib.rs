// THEORY:
// `camwatch_tools` is the OpenCV side of camwatch. Each module implements one
// of the library's seams with OpenCV primitives:
// - `frame`: the `Mat` wrapper every other module passes around.
// - `camera`: `VideoCapture` as a `CameraOpener`/`FrameSource`.
// - `highgui`: windows, key polling, sample JPEG output, resize and text.
// - `detector`: a YOLOv8 ONNX model run through `opencv::dnn`, kept to one class.
// - `runtime`: logger and Ctrl+C wiring shared by both executables.

pub mod camera;
pub mod detector;
pub mod frame;
pub mod highgui;
pub mod runtime;

pub use camera::{CvCamera, CvCameraOpener};
pub use detector::PersonDetector;
pub use frame::CvFrame;
pub use highgui::{CvResizer, HighGui, JpegWriter, StatusText};
