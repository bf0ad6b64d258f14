use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, DetectionResult};

const DEFAULT_PERIOD_FRAMES: u64 = 90;
const DEFAULT_SEED: u64 = 0x5eed;

/// Stub backend for demos and tests.
///
/// Emits one synthetic person that walks left to right across the frame at
/// mid height. The person is visible for the first two thirds of every
/// period and absent for the rest, so an alarm fed by this backend both
/// activates and times out. Confidence jitter is seeded and reproducible.
pub struct StubBackend {
    frame_count: u64,
    period_frames: u64,
    rng: StdRng,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::with_period(DEFAULT_PERIOD_FRAMES)
    }

    pub fn with_period(period_frames: u64) -> Self {
        Self {
            frame_count: 0,
            period_frames: period_frames.max(3),
            rng: StdRng::seed_from_u64(DEFAULT_SEED),
        }
    }

    fn visible_frames(&self) -> u64 {
        self.period_frames * 2 / 3
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _pixels: &[u8], width: u32, height: u32) -> Result<DetectionResult> {
        let phase = self.frame_count % self.period_frames;
        self.frame_count += 1;

        let visible = self.visible_frames();
        if phase >= visible {
            return Ok(DetectionResult::default());
        }

        let (w, h) = (width as f32, height as f32);
        let box_w = (w * 0.1).max(1.0);
        let box_h = (h * 0.35).max(1.0);
        let progress = phase as f32 / visible.max(1) as f32;
        let x1 = progress * (w - box_w).max(0.0);
        let y1 = (h - box_h) / 2.0;
        let confidence = self.rng.gen_range(0.80_f32..0.95);

        Ok(DetectionResult::new(vec![Detection::person(
            x1,
            y1,
            x1 + box_w,
            y1 + box_h,
            confidence,
        )]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_walks_then_disappears() {
        let mut backend = StubBackend::with_period(9);

        let first = backend.detect(&[], 100, 100).unwrap();
        assert_eq!(first.detections.len(), 1);
        let start_x = first.detections[0].bbox.x1;

        let mut last_x = start_x;
        for _ in 1..6 {
            let r = backend.detect(&[], 100, 100).unwrap();
            assert_eq!(r.detections.len(), 1);
            assert!(r.detections[0].bbox.x1 >= last_x);
            assert!((0.80..0.95).contains(&r.detections[0].confidence));
            last_x = r.detections[0].bbox.x1;
        }
        assert!(last_x > start_x);

        for _ in 6..9 {
            assert!(backend.detect(&[], 100, 100).unwrap().detections.is_empty());
        }
        assert_eq!(backend.detect(&[], 100, 100).unwrap().detections.len(), 1);
    }

    #[test]
    fn stub_is_reproducible() {
        let mut a = StubBackend::new();
        let mut b = StubBackend::new();
        for _ in 0..10 {
            let ra = a.detect(&[], 640, 480).unwrap();
            let rb = b.detect(&[], 640, 480).unwrap();
            assert_eq!(ra.detections, rb.detections);
        }
    }
}
