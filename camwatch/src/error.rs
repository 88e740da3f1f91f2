//! Error types for the camera loop.
//!
//! Every way a run can fail is one variant here. The user interrupt is not
//! an error and is modelled by `control::Outcome::Interrupted` instead.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CamError>;

#[derive(Debug, Error)]
pub enum CamError {
    /// The capture device could not be acquired.
    #[error("cannot open USB camera (index={index})")]
    CannotOpenDevice { index: i32 },
    /// The detection model could not be loaded at startup.
    #[error("failed to load model: {0}")]
    ModelLoadFailed(String),
    /// The device did not deliver a frame.
    #[error("failed to read frame: {0}")]
    FrameReadFailed(String),
    /// Any other failure reported by the imaging backend.
    #[error("backend error: {0}")]
    Backend(String),
}

impl CamError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        CamError::Backend(err.to_string())
    }
}
