#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, DetectionResult, ObjectClass};
use crate::geometry::BoundingBox;

const DEFAULT_INPUT_SIZE: u32 = 640;
const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
/// Box coordinates plus one score per class: `[cx, cy, w, h, s0, s1, ...]`.
const BOX_FIELDS: usize = 4;

/// Tract-based backend for YOLOv8-style ONNX detectors.
///
/// Loads a local model file, resizes each RGB frame to the model input and
/// decodes the `[1, 4 + classes, anchors]` output into person boxes.
pub struct TractBackend {
    model: TypedSimplePlan<TypedModel>,
    input_width: u32,
    input_height: u32,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl TractBackend {
    /// Load an ONNX model from disk with the default 640x640 input.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        Self::with_input_size(model_path, DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE)
    }

    pub fn with_input_size<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_width: width,
            input_height: height,
            confidence_threshold: 0.25,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        })
    }

    /// Override the default confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;

        if width == 0 || height == 0 || pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected_len,
                width,
                height,
                pixels.len()
            ));
        }

        // Nearest-neighbour resize straight into the NCHW tensor.
        let (src_w, src_h) = (width as usize, height as usize);
        let (dst_w, dst_h) = (self.input_width as usize, self.input_height as usize);
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, dst_h, dst_w), |(_, c, y, x)| {
            let sx = (x * src_w / dst_w).min(src_w - 1);
            let sy = (y * src_h / dst_h).min(src_h - 1);
            pixels[(sy * src_w + sx) * 3 + c] as f32 / 255.0
        });

        Ok(input.into_tensor())
    }

    fn decode(&self, outputs: TVec<TValue>, width: u32, height: u32) -> Result<Vec<Detection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?
            .into_dimensionality::<tract_ndarray::Ix3>()
            .context("model output is not [batch, fields, anchors]")?;

        let scale = (
            width as f32 / self.input_width as f32,
            height as f32 / self.input_height as f32,
        );
        let candidates = decode_anchors(&view, scale, (width, height), self.confidence_threshold)?;
        Ok(non_max_suppression(candidates, self.iou_threshold))
    }
}

/// Turn `[1, 4 + classes, anchors]` rows into boxes in frame coordinates.
///
/// Each anchor takes its best-scoring class; anchors below `threshold` are
/// dropped.
fn decode_anchors(
    view: &tract_ndarray::ArrayView3<f32>,
    (sx, sy): (f32, f32),
    (width, height): (u32, u32),
    threshold: f32,
) -> Result<Vec<Detection>> {
    let fields = view.shape()[1];
    if fields <= BOX_FIELDS {
        return Err(anyhow!("model output has only {} fields per anchor", fields));
    }

    let mut candidates = Vec::new();
    for anchor in 0..view.shape()[2] {
        let (class_index, score) = (BOX_FIELDS..fields)
            .map(|field| (field - BOX_FIELDS, view[[0, field, anchor]]))
            .fold((0, f32::NEG_INFINITY), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            });
        if score < threshold {
            continue;
        }
        let cx = view[[0, 0, anchor]] * sx;
        let cy = view[[0, 1, anchor]] * sy;
        let w = view[[0, 2, anchor]] * sx;
        let h = view[[0, 3, anchor]] * sy;
        candidates.push(Detection {
            bbox: BoundingBox::new(
                (cx - w / 2.0).max(0.0),
                (cy - h / 2.0).max(0.0),
                (cx + w / 2.0).min(width as f32),
                (cy + h / 2.0).min(height as f32),
            ),
            confidence: score.clamp(0.0, 1.0),
            class: ObjectClass::from_coco_index(class_index),
        });
    }
    Ok(candidates)
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<DetectionResult> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let detections = self.decode(outputs, width, height)?;
        Ok(DetectionResult::new(detections))
    }

    fn warm_up(&mut self) -> Result<()> {
        let (w, h) = (self.input_width, self.input_height);
        let blank = vec![0u8; (w as usize) * (h as usize) * 3];
        self.detect(&blank, w, h).map(|_| ())
    }
}

/// Greedy per-class NMS: keep the highest-scoring box, drop same-class
/// overlaps above `iou`.
fn non_max_suppression(mut candidates: Vec<Detection>, iou: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<Detection> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let suppressed = kept
            .iter()
            .any(|k| k.class == candidate.class && k.bbox.iou(&candidate.bbox) > iou);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}
