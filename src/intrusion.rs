//! Per-frame intrusion aggregation.
//!
//! Pure function of (detections, zones): every detection is reduced to its
//! representative point, matched against every zone, and the matches are
//! unioned into the frame's intrusion signal. Nothing carries over between
//! frames.

use serde::Serialize;

use crate::detect::Detection;
use crate::geometry::{representative_point, zones_containing, BoundingBox, Point};
use crate::zones::ZoneRegistry;

/// Zone membership of a single detection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectionZones {
    /// Index of the detection within the frame.
    pub index: usize,
    pub bbox: BoundingBox,
    pub confidence: f32,
    /// Representative point tested against the zones.
    pub point: Point,
    /// Containing zone ids, in registry order.
    pub zone_ids: Vec<u32>,
}

impl DetectionZones {
    pub fn in_zone(&self) -> bool {
        !self.zone_ids.is_empty()
    }

    /// Display label: the first violated zone, or the confidence when clear.
    pub fn label(&self) -> String {
        match self.zone_ids.first() {
            Some(zone_id) => format!("Person (Zone {})", zone_id),
            None => format!("Person {:.2}", self.confidence),
        }
    }
}

/// Intrusion decision for one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FrameIntrusion {
    pub detections: Vec<DetectionZones>,
    /// Violated zone ids, deduplicated, in first-seen order.
    pub zones_hit: Vec<u32>,
    pub has_intrusion: bool,
}

/// Evaluate one frame's detections against the registry.
pub fn evaluate(detections: &[Detection], zones: &ZoneRegistry) -> FrameIntrusion {
    let mut zones_hit: Vec<u32> = Vec::new();
    let detections: Vec<DetectionZones> = detections
        .iter()
        .enumerate()
        .map(|(index, detection)| {
            let point = representative_point(&detection.bbox);
            let zone_ids = zones_containing(point, zones.zones());
            for id in &zone_ids {
                if !zones_hit.contains(id) {
                    zones_hit.push(*id);
                }
            }
            DetectionZones {
                index,
                bbox: detection.bbox,
                confidence: detection.confidence,
                point,
                zone_ids,
            }
        })
        .collect();

    FrameIntrusion {
        has_intrusion: !zones_hit.is_empty(),
        detections,
        zones_hit,
    }
}
