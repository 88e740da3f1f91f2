// THEORY:
// The capture session is the sole owner of the camera handle. It follows a
// scoped-acquisition discipline: the handle is acquired by `open`, and its
// release is tied to the session's `Drop`, so a normal break, an early error
// return and an interrupt all release the device through the same path.
//
// `release` is idempotent. The underlying `FrameSource::release` runs exactly
// once no matter how many times the session is released or dropped, and a
// released session refuses further reads without touching the device.

use crate::error::{CamError, Result};
use log::{debug, info};

/// Which capture backend to request from the camera library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureApi {
    /// DirectShow, preferred on Windows.
    DirectShow,
    /// Let the library choose.
    Any,
}

impl CaptureApi {
    pub fn for_platform() -> Self {
        if cfg!(target_os = "windows") {
            CaptureApi::DirectShow
        } else {
            CaptureApi::Any
        }
    }
}

/// An opened camera delivering frames.
pub trait FrameSource {
    type Frame;

    /// Blocks until the next frame arrives or the device reports failure.
    fn read_frame(&mut self) -> Result<Self::Frame>;

    /// Frees the device. Called exactly once by `CaptureSession`.
    fn release(&mut self);
}

/// Acquires a camera device.
pub trait CameraOpener {
    type Source: FrameSource;

    /// Opens device `index`, requesting `width`x`height`. The resolution is a
    /// request only; devices may deliver something else.
    fn open(&mut self, index: i32, width: u32, height: u32, api: CaptureApi) -> Result<Self::Source>;
}

/// Exclusive, self-releasing owner of an opened camera.
pub struct CaptureSession<S: FrameSource> {
    source: S,
    released: bool,
    frames_read: u64,
}

impl<S: FrameSource> CaptureSession<S> {
    pub fn open<O>(opener: &mut O, index: i32, width: u32, height: u32, api: CaptureApi) -> Result<Self>
    where
        O: CameraOpener<Source = S>,
    {
        debug!("Opening camera {} at {}x{} via {:?}", index, width, height, api);
        let source = opener.open(index, width, height, api)?;
        info!("Camera {} opened", index);
        Ok(Self::from_source(source))
    }

    pub fn from_source(source: S) -> Self {
        Self {
            source,
            released: false,
            frames_read: 0,
        }
    }

    pub fn read_frame(&mut self) -> Result<S::Frame> {
        if self.released {
            return Err(CamError::FrameReadFailed("camera already released".to_string()));
        }
        let frame = self.source.read_frame()?;
        self.frames_read += 1;
        Ok(frame)
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.source.release();
        info!("Camera released after {} frame(s)", self.frames_read);
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

impl<S: FrameSource> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        self.release();
    }
}
