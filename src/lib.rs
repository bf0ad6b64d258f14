//! Zone Sentry
//!
//! Restricted-zone intrusion detection for video streams.
//!
//! # Architecture
//!
//! The decision engine is three small layers, each testable in isolation:
//!
//! 1. **Geometry**: a detection is reduced to its truncated bounding-box
//!    centroid and tested against zone polygons (boundary inclusive).
//! 2. **Aggregation**: per frame, every detection is matched against every
//!    zone and the matches are unioned into a single intrusion signal.
//! 3. **Alarm**: the intrusion signal drives a debounced alarm that turns on
//!    immediately and turns off only after a quiet period.
//!
//! Time is always supplied by the caller; nothing in the engine reads a clock.
//!
//! # Module Structure
//!
//! - `geometry`: points, boxes, containment
//! - `zones`: zone registry, JSON persistence, capture sessions
//! - `intrusion`: per-frame aggregation
//! - `alarm`: alarm state machine
//! - `detect`: detector backends (stub, scripted, ONNX)
//! - `frame` / `ingest`: decoded frames and their sources
//! - `monitor`: per-frame orchestration and reports
//! - `config`: file + environment configuration

pub mod alarm;
pub mod config;
pub mod detect;
pub mod frame;
pub mod geometry;
pub mod ingest;
pub mod intrusion;
pub mod monitor;
pub mod zones;

pub use alarm::{Alarm, AlarmConfig, AlarmState, AlarmTransition, DEFAULT_DEACTIVATE_DELAY_SECS};
pub use config::{ClockMode, MonitorConfig};
pub use detect::{
    backend_from_model, Detection, DetectionResult, DetectorBackend, Device, ObjectClass,
    ScriptedBackend, StubBackend,
};
pub use frame::Frame;
pub use geometry::{contains, representative_point, zones_containing, BoundingBox, Point};
pub use ingest::{FileConfig, FileSource};
pub use intrusion::{evaluate, DetectionZones, FrameIntrusion};
pub use monitor::{FrameReport, IntrusionMonitor, ReportWriter, RunSummary};
pub use zones::{CaptureCommand, LoadStatus, Zone, ZoneCapture, ZoneRegistry, DEFAULT_ZONES_PATH};
