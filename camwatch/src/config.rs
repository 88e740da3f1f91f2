// THEORY:
// Neither program takes command-line flags. Their behaviour is fixed by the
// constants below, gathered into a `SessionConfig` so the loop receives one
// immutable value instead of reaching for globals. Each program gets a named
// preset; tests build their own configs with zero pauses.

use crate::capture::CaptureApi;
use crate::control::Outcome;
use std::path::PathBuf;
use std::time::Duration;

pub const CAMERA_INDEX: i32 = 0;
pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 480;
/// Headless samples and FPS log lines are emitted every this many frames.
pub const SAMPLE_INTERVAL: u64 = 30;
pub const ESCAPE_KEY: i32 = 27;
pub const KEY_POLL_MS: i32 = 1;

/// Exit statuses a program reports for each way its loop can end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitPolicy {
    pub model_load_failed: u8,
    pub camera_open_failed: u8,
    /// A read failure that ends the loop. `0` means the loop just stops.
    pub frame_read_failed: u8,
    /// The window or image backend failed mid-run.
    pub backend_failed: u8,
}

impl ExitPolicy {
    /// Plain preview: open failure is 1, a lost stream simply ends the loop.
    pub fn webcam_test() -> Self {
        Self {
            model_load_failed: 1,
            camera_open_failed: 1,
            frame_read_failed: 0,
            backend_failed: 1,
        }
    }

    /// Detection: every failure has its own code.
    pub fn human_detect() -> Self {
        Self {
            model_load_failed: 1,
            camera_open_failed: 2,
            frame_read_failed: 3,
            backend_failed: 1,
        }
    }

    pub fn code_for(&self, outcome: Outcome) -> u8 {
        match outcome {
            Outcome::CameraOpenFailed => self.camera_open_failed,
            Outcome::ReadFailed => self.frame_read_failed,
            Outcome::BackendFailed => self.backend_failed,
            Outcome::UserStopped | Outcome::Interrupted => 0,
        }
    }
}

/// Configuration for one capture run.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub camera_index: i32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub capture_api: CaptureApi,
    pub window_name: String,
    /// File overwritten with a sample frame in headless mode.
    pub sample_path: PathBuf,
    pub sample_interval: u64,
    /// Sleep after every headless iteration; there is no blocking UI call to pace the loop.
    pub headless_pause: Duration,
    pub fps_log_interval: u64,
    pub exit_policy: ExitPolicy,
}

impl SessionConfig {
    pub fn webcam_test() -> Self {
        Self {
            camera_index: CAMERA_INDEX,
            frame_width: FRAME_WIDTH,
            frame_height: FRAME_HEIGHT,
            capture_api: CaptureApi::for_platform(),
            window_name: "YOLO".to_string(),
            sample_path: PathBuf::from("headless_frame.jpg"),
            sample_interval: SAMPLE_INTERVAL,
            headless_pause: Duration::from_millis(30),
            fps_log_interval: SAMPLE_INTERVAL,
            exit_policy: ExitPolicy::webcam_test(),
        }
    }

    pub fn human_detect() -> Self {
        Self {
            window_name: "YOLOv8n - person".to_string(),
            sample_path: PathBuf::from("headless_person.jpg"),
            headless_pause: Duration::from_millis(10),
            exit_policy: ExitPolicy::human_detect(),
            ..Self::webcam_test()
        }
    }
}

/// Settings for the single-class person detector.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub model_path: PathBuf,
    /// COCO class id to keep; 0 is `person`.
    pub class_id: usize,
    pub class_label: String,
    /// Square network input side, in pixels.
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("yolov8n.onnx"),
            class_id: 0,
            class_label: "person".to_string(),
            input_size: 640,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
        }
    }
}

impl DetectorConfig {
    /// Name shown in the status overlay.
    pub fn model_name(&self) -> String {
        self.model_path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_for_detection() {
        let policy = ExitPolicy::human_detect();
        assert_eq!(policy.code_for(Outcome::CameraOpenFailed), 2);
        assert_eq!(policy.code_for(Outcome::ReadFailed), 3);
        assert_eq!(policy.code_for(Outcome::Interrupted), 0);
        assert_eq!(policy.code_for(Outcome::UserStopped), 0);
        assert_eq!(policy.model_load_failed, 1);
    }

    #[test]
    fn exit_codes_for_plain_preview() {
        let policy = ExitPolicy::webcam_test();
        assert_eq!(policy.code_for(Outcome::CameraOpenFailed), 1);
        assert_eq!(policy.code_for(Outcome::ReadFailed), 0);
        assert_eq!(policy.code_for(Outcome::Interrupted), 0);
    }

    #[test]
    fn presets_share_camera_settings() {
        let plain = SessionConfig::webcam_test();
        let detect = SessionConfig::human_detect();
        assert_eq!(plain.camera_index, 0);
        assert_eq!((detect.frame_width, detect.frame_height), (640, 480));
        assert_eq!(plain.sample_interval, 30);
        assert_ne!(plain.sample_path, detect.sample_path);
        assert!(detect.headless_pause < plain.headless_pause);
    }
}
