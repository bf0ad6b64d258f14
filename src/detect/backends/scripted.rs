use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, DetectionResult};

/// One `[x1, y1, x2, y2, confidence]` row of a detection script.
type ScriptRow = [f32; 5];

#[derive(Debug, Deserialize)]
struct DetectionScript {
    frames: Vec<Vec<ScriptRow>>,
}

/// Replays precomputed person detections, one entry per frame.
///
/// Script files look like:
///
/// ```json
/// { "frames": [ [], [[120, 80, 180, 260, 0.91]], [] ] }
/// ```
///
/// Once the script is exhausted every further frame has no detections.
pub struct ScriptedBackend {
    frames: VecDeque<Vec<Detection>>,
}

impl ScriptedBackend {
    pub fn new<I>(frames: I) -> Self
    where
        I: IntoIterator<Item = Vec<Detection>>,
    {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Load a detection script from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading detection script {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("parsing detection script {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let script: DetectionScript =
            serde_json::from_str(raw).map_err(|e| anyhow!("invalid detection script: {}", e))?;
        let frames = script
            .frames
            .into_iter()
            .map(|rows| {
                rows.into_iter()
                    .map(|[x1, y1, x2, y2, conf]| Detection::person(x1, y1, x2, y2, conf))
                    .collect()
            })
            .collect::<Vec<_>>();
        Ok(Self::new(frames))
    }

    /// Frames left in the script.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl DetectorBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<DetectionResult> {
        let detections = self.frames.pop_front().unwrap_or_default();
        Ok(DetectionResult::new(detections))
    }
}
