//! OpenCV frame wrapper.

use camwatch::Raster;
use opencv::core::Mat;
use opencv::prelude::*;

/// A captured BGR image.
pub struct CvFrame {
    mat: Mat,
}

impl CvFrame {
    pub fn new(mat: Mat) -> Self {
        Self { mat }
    }

    pub fn mat(&self) -> &Mat {
        &self.mat
    }

    pub fn mat_mut(&mut self) -> &mut Mat {
        &mut self.mat
    }

    pub fn into_mat(self) -> Mat {
        self.mat
    }
}

impl Raster for CvFrame {
    fn dimensions(&self) -> (u32, u32) {
        (self.mat.cols().max(0) as u32, self.mat.rows().max(0) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{CV_8UC3, Scalar};

    #[test]
    fn empty_mat_has_no_size() {
        let frame = CvFrame::new(Mat::default());
        assert_eq!(frame.dimensions(), (0, 0));
    }

    #[test]
    fn dimensions_are_width_then_height() {
        let mat = Mat::new_rows_cols_with_default(480, 640, CV_8UC3, Scalar::all(0.0)).unwrap();
        let frame = CvFrame::new(mat);
        assert_eq!(frame.dimensions(), (640, 480));
        assert_eq!(frame.into_mat().rows(), 480);
    }
}
