//! Per-frame orchestration of the intrusion engine.
//!
//! `IntrusionMonitor` owns the zone registry and the alarm for one run and
//! feeds each frame through detection, aggregation and the alarm, strictly in
//! frame order.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::alarm::{Alarm, AlarmConfig, AlarmState, AlarmTransition};
use crate::detect::{Detection, DetectorBackend};
use crate::frame::Frame;
use crate::intrusion::{evaluate, FrameIntrusion};
use crate::zones::ZoneRegistry;

/// Everything decided about one frame.
#[derive(Clone, Debug, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub time_secs: f64,
    #[serde(flatten)]
    pub intrusion: FrameIntrusion,
    /// One display label per detection, same order as `detections`.
    pub labels: Vec<String>,
    pub alarm: AlarmState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<AlarmTransition>,
}

impl FrameReport {
    pub fn alarm_active(&self) -> bool {
        self.alarm.active
    }

    /// One-line status, e.g. `Frame: 12/300 | Alarm: ON`.
    pub fn status_line(&self, total_frames: Option<u64>) -> String {
        let total = total_frames
            .map(|t| t.to_string())
            .unwrap_or_else(|| "?".to_string());
        format!(
            "Frame: {}/{} | Alarm: {}",
            self.frame,
            total,
            if self.alarm.active { "ON" } else { "OFF" }
        )
    }
}

/// Counters for a processing run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub intrusion_frames: u64,
    pub activations: u64,
    pub deactivations: u64,
    pub detector_errors: u64,
}

pub struct IntrusionMonitor {
    zones: ZoneRegistry,
    alarm: Alarm,
    last_frame: Option<u64>,
    summary: RunSummary,
}

impl IntrusionMonitor {
    pub fn new(zones: ZoneRegistry, alarm: AlarmConfig) -> Self {
        Self {
            zones,
            alarm: Alarm::new(alarm),
            last_frame: None,
            summary: RunSummary::default(),
        }
    }

    /// Evaluate one frame's person detections and advance the alarm.
    ///
    /// Frame indices must strictly increase; an out-of-order frame is
    /// rejected before it can affect the alarm.
    pub fn process(
        &mut self,
        frame_index: u64,
        now: f64,
        detections: &[Detection],
    ) -> Result<FrameReport> {
        if let Some(last) = self.last_frame {
            if frame_index <= last {
                return Err(anyhow!(
                    "frame {} arrived after frame {}; frames must be processed in order",
                    frame_index,
                    last
                ));
            }
        }
        self.last_frame = Some(frame_index);

        let intrusion = evaluate(detections, &self.zones);
        let transition = self.alarm.update(intrusion.has_intrusion, now);

        self.summary.frames += 1;
        if intrusion.has_intrusion {
            self.summary.intrusion_frames += 1;
        }
        match transition {
            Some(AlarmTransition::Activated) => self.summary.activations += 1,
            Some(AlarmTransition::Deactivated) => self.summary.deactivations += 1,
            None => {}
        }

        if intrusion.has_intrusion {
            log::debug!(
                "frame {}: {} detection(s), zones hit {:?}",
                frame_index,
                detections.len(),
                intrusion.zones_hit
            );
        }

        let labels = intrusion.detections.iter().map(|d| d.label()).collect();
        Ok(FrameReport {
            frame: frame_index,
            time_secs: now,
            intrusion,
            labels,
            alarm: self.alarm.state(),
            transition,
        })
    }

    /// Run `backend` on `frame` and process the resulting person boxes.
    ///
    /// A detector failure is logged and the frame counts as empty, so a
    /// pending deactivation keeps counting down.
    pub fn process_frame(
        &mut self,
        frame: &Frame,
        now: f64,
        backend: &mut dyn DetectorBackend,
        min_confidence: f32,
    ) -> Result<FrameReport> {
        let detections = match backend.detect(frame.pixels(), frame.width, frame.height) {
            Ok(result) => result.persons(min_confidence),
            Err(e) => {
                self.summary.detector_errors += 1;
                log::warn!(
                    "frame {}: detector {} failed: {:#}",
                    frame.index,
                    backend.name(),
                    e
                );
                Vec::new()
            }
        };
        self.process(frame.index, now, &detections)
    }

    /// Start a new run: alarm off, ordering and counters cleared.
    pub fn reset(&mut self) {
        self.alarm.reset();
        self.last_frame = None;
        self.summary = RunSummary::default();
    }

    pub fn zones(&self) -> &ZoneRegistry {
        &self.zones
    }

    pub fn alarm_active(&self) -> bool {
        self.alarm.is_active()
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }
}

/// Appends frame reports as JSON lines.
pub struct ReportWriter<W: Write> {
    out: W,
    written: u64,
}

impl ReportWriter<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("creating report file {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn write(&mut self, report: &FrameReport) -> Result<()> {
        serde_json::to_writer(&mut self.out, report).context("serialize frame report")?;
        self.out.write_all(b"\n").context("write frame report")?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.out.flush().context("flush frame reports")?;
        Ok(self.out)
    }
}
