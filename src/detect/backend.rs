use anyhow::Result;

use crate::detect::result::DetectionResult;

/// Detector backend trait.
///
/// A backend turns one RGB frame into person detections. Backends own any
/// model state; the intrusion engine only consumes the returned boxes.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    ///
    /// `pixels` is tightly packed RGB24, `width * height * 3` bytes, and is
    /// only valid for the duration of the call.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<DetectionResult>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
