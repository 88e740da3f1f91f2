// THEORY:
// The person detector wraps a pretrained YOLOv8 network exported to ONNX and
// executed by OpenCV's DNN module. The network is a black box: the frame is
// squashed to the square input size, one forward pass yields a
// `[1, 4 + classes, anchors]` tensor, and only the score row of the configured
// class is read. Overlapping boxes are merged with OpenCV's NMS, and the
// survivors are drawn back onto the full-size frame.
//
// Loading happens once at startup and is the only failure with its own exit
// code. Problems during a forward pass surface as `CamError::Backend` and the
// frame processor shows that frame unannotated.

use crate::frame::CvFrame;
use anyhow::{Context, ensure};
use camwatch::{CamError, Detector, DetectorConfig, Result};
use log::info;
use opencv::core::{CV_32F, Mat, Point, Rect, Scalar, Size, Vector};
use opencv::prelude::*;
use opencv::{dnn, imgproc};

/// Output strides of the YOLOv8 detection heads.
const STRIDES: [u32; 3] = [8, 16, 32];
const BOX_COLOR: (f64, f64, f64) = (255.0, 56.0, 56.0);

/// One box in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub score: f32,
}

impl Candidate {
    fn rect(&self) -> Rect {
        Rect::new(
            self.x.round() as i32,
            self.y.round() as i32,
            self.width.round() as i32,
            self.height.round() as i32,
        )
    }
}

/// Number of prediction anchors for a square input of `input_size`.
pub fn anchor_count(input_size: u32) -> usize {
    STRIDES
        .iter()
        .map(|stride| {
            let cells = (input_size / stride) as usize;
            cells * cells
        })
        .sum()
}

/// Reads candidates for `class_id` out of an attribute-major YOLOv8 output.
///
/// `data` holds `attributes * anchors` values where rows 0..4 are the box
/// centre and size and row `4 + c` is the score of class `c`. Boxes are
/// scaled by `scale` from network input space to frame space.
pub fn decode_predictions(
    data: &[f32],
    anchors: usize,
    class_id: usize,
    threshold: f32,
    scale: (f32, f32),
) -> Vec<Candidate> {
    let score_row = 4 + class_id;
    if anchors == 0 || data.len() < (score_row + 1) * anchors {
        return Vec::new();
    }
    let row = |r: usize| &data[r * anchors..(r + 1) * anchors];
    let (cx, cy, w, h, scores) = (row(0), row(1), row(2), row(3), row(score_row));

    (0..anchors)
        .filter(|&i| scores[i] >= threshold)
        .map(|i| Candidate {
            x: (cx[i] - w[i] / 2.0) * scale.0,
            y: (cy[i] - h[i] / 2.0) * scale.1,
            width: w[i] * scale.0,
            height: h[i] * scale.1,
            score: scores[i],
        })
        .collect()
}

pub struct PersonDetector {
    net: dnn::Net,
    config: DetectorConfig,
}

impl PersonDetector {
    /// Loads the ONNX model; failure is `CamError::ModelLoadFailed`.
    pub fn load(config: DetectorConfig) -> Result<Self> {
        let net = Self::read_net(&config).map_err(|e| CamError::ModelLoadFailed(format!("{:#}", e)))?;
        info!(
            "Loaded {} (class {} '{}', input {}px)",
            config.model_name(),
            config.class_id,
            config.class_label,
            config.input_size
        );
        Ok(Self { net, config })
    }

    fn read_net(config: &DetectorConfig) -> anyhow::Result<dnn::Net> {
        let path = &config.model_path;
        ensure!(path.is_file(), "{} not found", path.display());
        let name = path.to_str().context("model path is not valid UTF-8")?;
        let net = dnn::read_net_from_onnx(name).with_context(|| format!("reading {}", name))?;
        ensure!(!net.empty()?, "{} contains no layers", name);
        Ok(net)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn detect(&mut self, image: &Mat) -> anyhow::Result<Vec<Candidate>> {
        let side = self.config.input_size as i32;
        let blob = dnn::blob_from_image(
            image,
            1.0 / 255.0,
            Size::new(side, side),
            Scalar::default(),
            true,
            false,
            CV_32F,
        )
        .context("preparing network input")?;
        self.net
            .set_input(&blob, "", 1.0, Scalar::default())
            .context("setting network input")?;
        let output = self.net.forward_single("").context("forward pass")?;

        let anchors = anchor_count(self.config.input_size);
        let data = output.data_typed::<f32>().context("reading network output")?;
        ensure!(
            data.len() % anchors == 0,
            "unexpected output size {} for {} anchors",
            data.len(),
            anchors
        );

        let scale = (
            image.cols() as f32 / side as f32,
            image.rows() as f32 / side as f32,
        );
        let candidates = decode_predictions(
            data,
            anchors,
            self.config.class_id,
            self.config.confidence_threshold,
            scale,
        );
        self.suppress(candidates)
    }

    fn suppress(&self, candidates: Vec<Candidate>) -> anyhow::Result<Vec<Candidate>> {
        if candidates.is_empty() {
            return Ok(candidates);
        }
        let boxes: Vector<Rect> = candidates.iter().map(Candidate::rect).collect();
        let scores: Vector<f32> = candidates.iter().map(|c| c.score).collect();
        let mut keep = Vector::<i32>::new();
        dnn::nms_boxes(
            &boxes,
            &scores,
            self.config.confidence_threshold,
            self.config.iou_threshold,
            &mut keep,
            1.0,
            0,
        )
        .context("non-maximum suppression")?;
        Ok(keep.iter().filter_map(|i| candidates.get(i as usize).copied()).collect())
    }

    fn draw(&self, image: &mut Mat, detections: &[Candidate]) -> anyhow::Result<()> {
        let color = Scalar::new(BOX_COLOR.0, BOX_COLOR.1, BOX_COLOR.2, 0.0);
        for detection in detections {
            let rect = detection.rect();
            imgproc::rectangle(image, rect, color, 2, imgproc::LINE_8, 0)?;
            let label = format!("{} {:.2}", self.config.class_label, detection.score);
            let origin = Point::new(rect.x, (rect.y - 6).max(12));
            imgproc::put_text(
                image,
                &label,
                origin,
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.5,
                color,
                1,
                imgproc::LINE_AA,
                false,
            )?;
        }
        Ok(())
    }
}

impl Detector<CvFrame> for PersonDetector {
    fn annotate(&mut self, frame: &mut CvFrame) -> Result<()> {
        let detections = self
            .detect(frame.mat())
            .map_err(|e| CamError::Backend(format!("{:#}", e)))?;
        self.draw(frame.mat_mut(), &detections)
            .map_err(|e| CamError::Backend(format!("{:#}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds an attribute-major tensor for `anchors` anchors and `classes` classes.
    fn tensor(anchors: usize, classes: usize, fill: impl Fn(usize, usize) -> f32) -> Vec<f32> {
        let mut data = vec![0.0; (4 + classes) * anchors];
        for attr in 0..4 + classes {
            for i in 0..anchors {
                data[attr * anchors + i] = fill(attr, i);
            }
        }
        data
    }

    #[test]
    fn anchors_for_640() {
        assert_eq!(anchor_count(640), 8400);
        assert_eq!(anchor_count(320), 2100);
    }

    #[test]
    fn only_the_configured_class_is_kept() {
        // Anchor 0 is a confident person, anchor 1 a confident car, anchor 2 a weak person.
        let data = tensor(3, 3, |attr, i| match (attr, i) {
            (0, _) => 100.0,
            (1, _) => 50.0,
            (2, _) => 20.0,
            (3, _) => 40.0,
            (4, 0) => 0.9,
            (4, 2) => 0.1,
            (6, 1) => 0.95,
            _ => 0.0,
        });

        let found = decode_predictions(&data, 3, 0, 0.25, (1.0, 1.0));

        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0],
            Candidate {
                x: 90.0,
                y: 30.0,
                width: 20.0,
                height: 40.0,
                score: 0.9
            }
        );
    }

    #[test]
    fn boxes_are_scaled_to_the_frame() {
        let data = tensor(1, 1, |attr, _| [320.0, 320.0, 64.0, 64.0, 0.8][attr]);

        let found = decode_predictions(&data, 1, 0, 0.25, (1.0, 0.75));

        assert_eq!(found[0].x, 288.0);
        assert_eq!(found[0].y, 216.0);
        assert_eq!(found[0].height, 48.0);
    }

    #[test]
    fn truncated_output_yields_nothing() {
        assert!(decode_predictions(&[0.5; 7], 2, 0, 0.25, (1.0, 1.0)).is_empty());
        assert!(decode_predictions(&[], 0, 0, 0.25, (1.0, 1.0)).is_empty());
    }

    #[test]
    fn missing_model_is_a_load_failure() {
        let config = DetectorConfig {
            model_path: "does/not/exist.onnx".into(),
            ..DetectorConfig::default()
        };
        let result = PersonDetector::load(config);
        assert!(matches!(result, Err(CamError::ModelLoadFailed(msg)) if msg.contains("not found")));
    }
}
