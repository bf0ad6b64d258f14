use crate::geometry::BoundingBox;

/// Result of running detection on a frame.
#[derive(Clone, Debug, Default)]
pub struct DetectionResult {
    /// Boxes in frame pixel coordinates.
    pub detections: Vec<Detection>,
}

impl DetectionResult {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    /// Keep only person detections at or above `min_confidence`.
    pub fn persons(self, min_confidence: f32) -> Vec<Detection> {
        self.detections
            .into_iter()
            .filter(|d| d.class == ObjectClass::Person && d.confidence >= min_confidence)
            .collect()
    }
}

/// One observed subject in one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub class: ObjectClass,
}

impl Detection {
    /// Person detection from an `(x1, y1, x2, y2, confidence)` tuple.
    pub fn person(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32) -> Self {
        Self {
            bbox: BoundingBox::new(x1, y1, x2, y2),
            confidence: confidence.clamp(0.0, 1.0),
            class: ObjectClass::Person,
        }
    }
}

/// Coarse object class. The intrusion engine only consumes `Person`.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectClass {
    Person,
    Vehicle,
    Animal,
    Unknown,
}

impl ObjectClass {
    /// Map a COCO-80 class index to the coarse class set.
    pub fn from_coco_index(index: usize) -> Self {
        match index {
            0 => ObjectClass::Person,
            1..=8 => ObjectClass::Vehicle,
            14..=23 => ObjectClass::Animal,
            _ => ObjectClass::Unknown,
        }
    }
}
