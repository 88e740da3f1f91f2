// THEORY:
// OpenCV's `VideoCapture` is the camera handle. Opening it is where the
// platform backend is chosen (DirectShow on Windows, the default elsewhere)
// and where the requested resolution is applied. Cameras are free to ignore
// the request, so the negotiated size is read back and a mismatch is only a
// warning; the frame processor normalises sizes later anyway.
//
// `CvCamera` itself does not release on drop. Release is owned by
// `camwatch::CaptureSession`, which guarantees it happens exactly once.

use crate::frame::CvFrame;
use camwatch::{CamError, CameraOpener, CaptureApi, FrameSource, Result};
use log::{debug, info, warn};
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

/// Opens USB cameras through OpenCV.
#[derive(Debug, Default, Clone, Copy)]
pub struct CvCameraOpener;

impl CvCameraOpener {
    fn api_preference(api: CaptureApi) -> i32 {
        match api {
            CaptureApi::DirectShow => videoio::CAP_DSHOW,
            CaptureApi::Any => videoio::CAP_ANY,
        }
    }

    fn negotiated_size(capture: &VideoCapture) -> Option<(u32, u32)> {
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH).ok()?;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT).ok()?;
        Some((width as u32, height as u32))
    }
}

impl CameraOpener for CvCameraOpener {
    type Source = CvCamera;

    fn open(&mut self, index: i32, width: u32, height: u32, api: CaptureApi) -> Result<CvCamera> {
        let mut capture = VideoCapture::new(index, Self::api_preference(api)).map_err(|e| {
            debug!("VideoCapture::new({}) failed: {}", index, e);
            CamError::CannotOpenDevice { index }
        })?;

        // Best effort; not every camera accepts every size.
        let _ = capture.set(videoio::CAP_PROP_FRAME_WIDTH, f64::from(width));
        let _ = capture.set(videoio::CAP_PROP_FRAME_HEIGHT, f64::from(height));

        if !capture.is_opened().unwrap_or(false) {
            return Err(CamError::CannotOpenDevice { index });
        }

        match Self::negotiated_size(&capture) {
            Some((w, h)) if (w, h) != (width, height) => warn!(
                "Resolution mismatch (got: {}x{}, requested: {}x{})",
                w, h, width, height
            ),
            Some((w, h)) => info!("Camera configured: {}x{}", w, h),
            None => debug!("Camera did not report its resolution"),
        }

        Ok(CvCamera { capture, index })
    }
}

/// An opened OpenCV capture device.
pub struct CvCamera {
    capture: VideoCapture,
    index: i32,
}

impl FrameSource for CvCamera {
    type Frame = CvFrame;

    fn read_frame(&mut self) -> Result<CvFrame> {
        let mut mat = Mat::default();
        let grabbed = self
            .capture
            .read(&mut mat)
            .map_err(|e| CamError::FrameReadFailed(e.to_string()))?;
        if !grabbed || mat.empty() {
            return Err(CamError::FrameReadFailed(format!("camera {} returned no frame", self.index)));
        }
        Ok(CvFrame::new(mat))
    }

    fn release(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Error releasing camera {}: {}", self.index, e);
        }
    }
}
