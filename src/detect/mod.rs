//! Person detection backends.
//!
//! The intrusion engine consumes only the output contract of a detector:
//! per-frame person boxes with confidences. Class filtering is the backend's
//! job; nothing downstream re-checks it.

mod backend;
mod backends;
mod result;

use anyhow::Result;
use std::fmt;
use std::path::Path;

pub use backend::DetectorBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use backends::{ScriptedBackend, StubBackend};
pub use result::{Detection, DetectionResult, ObjectClass};

/// Model name selecting the synthetic [`StubBackend`].
pub const STUB_MODEL: &str = "stub";

/// Inference device requested on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Device {
    #[default]
    #[value(name = "cpu")]
    Cpu,
    #[value(name = "cuda")]
    Cuda,
    /// First GPU by ordinal.
    #[value(name = "0")]
    Gpu0,
}

impl Device {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cpu" => Some(Device::Cpu),
            "cuda" => Some(Device::Cuda),
            "0" => Some(Device::Gpu0),
            _ => None,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
            Device::Gpu0 => write!(f, "0"),
        }
    }
}

/// Build a detector backend from a model reference.
///
/// - `stub` selects the synthetic walker.
/// - `*.json` replays a detection script.
/// - anything else is an ONNX model, which needs the `backend-tract` feature.
///
/// All backends run on the CPU; GPU devices fall back with a warning.
pub fn backend_from_model(
    model: &str,
    device: Device,
    confidence_threshold: f32,
) -> Result<Box<dyn DetectorBackend>> {
    if device != Device::Cpu {
        log::warn!("device {} not supported by the available backends, using cpu", device);
    }

    if model == STUB_MODEL {
        return Ok(Box::new(StubBackend::new()));
    }

    let path = Path::new(model);
    let is_script = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_script {
        return Ok(Box::new(ScriptedBackend::from_file(path)?));
    }

    onnx_backend(path, confidence_threshold)
}

#[cfg(feature = "backend-tract")]
fn onnx_backend(path: &Path, confidence_threshold: f32) -> Result<Box<dyn DetectorBackend>> {
    let backend = TractBackend::new(path)?.with_threshold(confidence_threshold);
    Ok(Box::new(backend))
}

#[cfg(not(feature = "backend-tract"))]
fn onnx_backend(path: &Path, _confidence_threshold: f32) -> Result<Box<dyn DetectorBackend>> {
    Err(anyhow::anyhow!(
        "model {} requires the backend-tract feature (rebuild with --features backend-tract)",
        path.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_parse() {
        assert_eq!(Device::parse("CPU"), Some(Device::Cpu));
        assert_eq!(Device::parse("cuda"), Some(Device::Cuda));
        assert_eq!(Device::parse("0"), Some(Device::Gpu0));
        assert_eq!(Device::parse("tpu"), None);
        assert_eq!(Device::Gpu0.to_string(), "0");
    }

    #[test]
    fn stub_model_selects_stub_backend() {
        let backend = backend_from_model(STUB_MODEL, Device::Cuda, 0.25).unwrap();
        assert_eq!(backend.name(), "stub");
    }

    #[test]
    fn missing_script_is_an_error() {
        assert!(backend_from_model("/nonexistent/detections.json", Device::Cpu, 0.25).is_err());
    }

    #[cfg(not(feature = "backend-tract"))]
    #[test]
    fn onnx_model_requires_feature() {
        let err = backend_from_model("yolov8n.onnx", Device::Cpu, 0.25)
            .err()
            .expect("missing dependency");
        assert!(err.to_string().contains("backend-tract"));
    }
}
