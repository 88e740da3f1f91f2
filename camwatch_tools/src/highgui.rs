//! OpenCV implementations of the presentation and imaging seams.
//!
//! All four types are stateless unit structs over OpenCV free functions, so
//! each component can own its own copy.

use crate::frame::CvFrame;
use camwatch::{CamError, Display, Resizer, Result, SampleWriter, TextOverlay, WindowSystem};
use log::warn;
use opencv::core::{self, Mat, Point, Scalar, Size};
use opencv::prelude::*;
use opencv::{highgui, imgcodecs, imgproc};
use std::path::Path;

/// HighGUI windows and keyboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighGui;

impl WindowSystem for HighGui {
    fn named_window(&mut self, name: &str) -> Result<()> {
        highgui::named_window(name, highgui::WINDOW_NORMAL).map_err(CamError::backend)
    }

    fn poll_key(&mut self, timeout_ms: i32) -> Result<i32> {
        highgui::wait_key(timeout_ms).map_err(CamError::backend)
    }

    fn window_visible(&mut self, name: &str) -> Result<bool> {
        let visible = highgui::get_window_property(name, highgui::WND_PROP_VISIBLE).map_err(CamError::backend)?;
        Ok(visible >= 1.0)
    }

    fn destroy_all_windows(&mut self) {
        if let Err(e) = highgui::destroy_all_windows() {
            warn!("Error destroying windows: {}", e);
        }
    }
}

impl Display<CvFrame> for HighGui {
    fn show(&mut self, name: &str, frame: &CvFrame) -> Result<()> {
        highgui::imshow(name, frame.mat()).map_err(CamError::backend)
    }
}

/// Writes samples with `imwrite`; the format follows the file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegWriter;

impl SampleWriter<CvFrame> for JpegWriter {
    fn write_sample(&mut self, path: &Path, frame: &CvFrame) -> Result<()> {
        let name = path
            .to_str()
            .ok_or_else(|| CamError::Backend(format!("non UTF-8 path: {}", path.display())))?;
        let written = imgcodecs::imwrite(name, frame.mat(), &core::Vector::<i32>::new()).map_err(CamError::backend)?;
        if !written {
            return Err(CamError::Backend(format!("imwrite refused {}", name)));
        }
        Ok(())
    }
}

/// Bilinear resize.
#[derive(Debug, Default, Clone, Copy)]
pub struct CvResizer;

impl Resizer<CvFrame> for CvResizer {
    fn resize(&mut self, frame: &CvFrame, width: u32, height: u32) -> Result<CvFrame> {
        let mut resized = Mat::default();
        imgproc::resize(
            frame.mat(),
            &mut resized,
            Size::new(width as i32, height as i32),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )
        .map_err(CamError::backend)?;
        Ok(CvFrame::new(resized))
    }
}

/// Green status text in the top-left corner.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusText;

impl StatusText {
    const ORIGIN: (i32, i32) = (10, 30);
    const SCALE: f64 = 0.8;
    const THICKNESS: i32 = 2;
}

impl TextOverlay<CvFrame> for StatusText {
    fn put_status(&mut self, frame: &mut CvFrame, text: &str) -> Result<()> {
        imgproc::put_text(
            frame.mat_mut(),
            text,
            Point::new(Self::ORIGIN.0, Self::ORIGIN.1),
            imgproc::FONT_HERSHEY_SIMPLEX,
            Self::SCALE,
            Scalar::new(0.0, 255.0, 0.0, 0.0),
            Self::THICKNESS,
            imgproc::LINE_AA,
            false,
        )
        .map_err(CamError::backend)
    }
}
