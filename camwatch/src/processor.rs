// THEORY:
// The frame processor sits between capture and presentation in the detection
// program. It has two jobs:
// 1.  **Size normalisation**: every frame handed to the detector has the same
//     target resolution. Frames that already match are passed through without
//     calling the resizer at all.
// 2.  **Delegation**: detection itself belongs to an external model. The
//     processor hands the frame to a `Detector` and gets the same frame back
//     with boxes and labels already drawn.
//
// Detector failures are not an error category of their own. A frame the
// detector chokes on is logged and shown with whatever was drawn so far; the
// loop keeps running.

use crate::error::Result;
use log::warn;

/// Anything with a pixel size.
pub trait Raster {
    /// `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);
}

pub trait Resizer<F> {
    fn resize(&mut self, frame: &F, width: u32, height: u32) -> Result<F>;
}

/// A pretrained single-class detector that draws its own results.
pub trait Detector<F> {
    /// Renders detection overlays onto `frame` in place.
    fn annotate(&mut self, frame: &mut F) -> Result<()>;
}

pub struct FrameProcessor<R, D> {
    resizer: R,
    detector: D,
    target: (u32, u32),
}

impl<R, D> FrameProcessor<R, D> {
    pub fn new(resizer: R, detector: D, width: u32, height: u32) -> Self {
        Self {
            resizer,
            detector,
            target: (width, height),
        }
    }

    pub fn target(&self) -> (u32, u32) {
        self.target
    }
}

impl<R, D> FrameProcessor<R, D> {
    /// Resizes `frame` to the target unless it already matches.
    pub fn ensure_size<F>(&mut self, frame: F) -> Result<F>
    where
        F: Raster,
        R: Resizer<F>,
    {
        let (width, height) = self.target;
        if frame.dimensions() == self.target {
            return Ok(frame);
        }
        self.resizer.resize(&frame, width, height)
    }

    /// Normalises the frame and runs the detector over it.
    pub fn process<F>(&mut self, frame: F) -> Result<F>
    where
        F: Raster,
        R: Resizer<F>,
        D: Detector<F>,
    {
        let mut frame = self.ensure_size(frame)?;
        if let Err(err) = self.detector.annotate(&mut frame) {
            warn!("Detection failed on this frame, showing it unannotated: {}", err);
        }
        Ok(frame)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::capture::fake::FakeFrame;
    use crate::error::CamError;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Records every resize request.
    #[derive(Default, Clone)]
    pub struct SpyResizer {
        pub calls: Rc<RefCell<Vec<(u32, u32)>>>,
    }

    impl Resizer<FakeFrame> for SpyResizer {
        fn resize(&mut self, _frame: &FakeFrame, width: u32, height: u32) -> Result<FakeFrame> {
            self.calls.borrow_mut().push((width, height));
            Ok(FakeFrame { width, height })
        }
    }

    #[derive(Default, Clone)]
    pub struct CountingDetector {
        pub calls: Rc<Cell<u32>>,
        pub fail: bool,
    }

    impl Detector<FakeFrame> for CountingDetector {
        fn annotate(&mut self, _frame: &mut FakeFrame) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(CamError::backend("forward pass failed"));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::*;
    use super::*;
    use crate::capture::fake::FakeFrame;

    #[test]
    fn matching_frame_is_not_resized() {
        let resizer = SpyResizer::default();
        let calls = resizer.calls.clone();
        let mut processor = FrameProcessor::new(resizer, CountingDetector::default(), 640, 480);

        let frame = processor.ensure_size(FakeFrame { width: 640, height: 480 }).unwrap();

        assert_eq!(frame, FakeFrame { width: 640, height: 480 });
        assert_eq!(calls.borrow().len(), 0);
    }

    #[test]
    fn mismatched_frame_is_resized_once_to_target() {
        let resizer = SpyResizer::default();
        let calls = resizer.calls.clone();
        let mut processor = FrameProcessor::new(resizer, CountingDetector::default(), 640, 480);

        let frame = processor.ensure_size(FakeFrame { width: 1280, height: 720 }).unwrap();

        assert_eq!(frame.dimensions(), (640, 480));
        assert_eq!(*calls.borrow(), vec![(640, 480)]);
    }

    #[test]
    fn process_runs_the_detector_on_the_normalised_frame() {
        let detector = CountingDetector::default();
        let detections = detector.calls.clone();
        let mut processor = FrameProcessor::new(SpyResizer::default(), detector, 640, 480);

        let out = processor.process(FakeFrame { width: 320, height: 240 }).unwrap();

        assert_eq!(out.dimensions(), (640, 480));
        assert_eq!(detections.get(), 1);
    }

    #[test]
    fn detector_failure_passes_the_frame_through() {
        let detector = CountingDetector {
            fail: true,
            ..CountingDetector::default()
        };
        let mut processor = FrameProcessor::new(SpyResizer::default(), detector, 640, 480);

        let out = processor.process(FakeFrame { width: 640, height: 480 }).unwrap();

        assert_eq!(out, FakeFrame { width: 640, height: 480 });
    }
}
