use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::alarm::{AlarmConfig, DEFAULT_DEACTIVATE_DELAY_SECS};
use crate::detect::Device;
use crate::zones::DEFAULT_ZONES_PATH;

const DEFAULT_MODEL: &str = "yolov8n.onnx";
const DEFAULT_CONFIDENCE: f32 = 0.25;
const DEFAULT_TARGET_FPS: u32 = 30;

#[derive(Debug, Deserialize, Default)]
struct MonitorConfigFile {
    zones_path: Option<PathBuf>,
    detector: Option<DetectorConfigFile>,
    alarm: Option<AlarmConfigFile>,
    source: Option<SourceConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    model: Option<String>,
    device: Option<String>,
    confidence_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct AlarmConfigFile {
    deactivate_delay_secs: Option<f64>,
    clock: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    target_fps: Option<u32>,
}

/// Where the alarm's notion of "now" comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClockMode {
    /// Seconds since the run started (monotonic wall clock).
    #[default]
    Wall,
    /// Media time of each frame, reproducible across runs.
    Media,
}

impl ClockMode {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "wall" => Ok(ClockMode::Wall),
            "media" => Ok(ClockMode::Media),
            other => Err(anyhow!("clock must be 'wall' or 'media', got '{}'", other)),
        }
    }
}

impl fmt::Display for ClockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockMode::Wall => write!(f, "wall"),
            ClockMode::Media => write!(f, "media"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub zones_path: PathBuf,
    pub detector: DetectorSettings,
    pub alarm: AlarmConfig,
    pub clock: ClockMode,
    pub target_fps: u32,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub model: String,
    pub device: Device,
    pub confidence_threshold: f32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            zones_path: PathBuf::from(DEFAULT_ZONES_PATH),
            detector: DetectorSettings {
                model: DEFAULT_MODEL.to_string(),
                device: Device::Cpu,
                confidence_threshold: DEFAULT_CONFIDENCE,
            },
            alarm: AlarmConfig::default(),
            clock: ClockMode::Wall,
            target_fps: DEFAULT_TARGET_FPS,
        }
    }
}

impl MonitorConfig {
    /// Defaults, overlaid by the JSON file named in `ZONE_SENTRY_CONFIG`,
    /// overlaid by individual `ZONE_SENTRY_*` variables.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("ZONE_SENTRY_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: MonitorConfigFile) -> Result<Self> {
        let zones_path = file
            .zones_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ZONES_PATH));
        let detector = file.detector.unwrap_or_default();
        let device = match detector.device.as_deref() {
            Some(raw) => parse_device(raw)?,
            None => Device::Cpu,
        };
        let alarm = file.alarm.unwrap_or_default();
        let clock = match alarm.clock.as_deref() {
            Some(raw) => ClockMode::parse(raw)?,
            None => ClockMode::Wall,
        };
        Ok(Self {
            zones_path,
            detector: DetectorSettings {
                model: detector.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                device,
                confidence_threshold: detector
                    .confidence_threshold
                    .unwrap_or(DEFAULT_CONFIDENCE),
            },
            alarm: AlarmConfig {
                deactivate_delay_secs: alarm
                    .deactivate_delay_secs
                    .unwrap_or(DEFAULT_DEACTIVATE_DELAY_SECS),
            },
            clock,
            target_fps: file
                .source
                .and_then(|source| source.target_fps)
                .unwrap_or(DEFAULT_TARGET_FPS),
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("ZONE_SENTRY_ZONES") {
            if !path.trim().is_empty() {
                self.zones_path = PathBuf::from(path);
            }
        }
        if let Ok(model) = std::env::var("ZONE_SENTRY_MODEL") {
            if !model.trim().is_empty() {
                self.detector.model = model;
            }
        }
        if let Ok(device) = std::env::var("ZONE_SENTRY_DEVICE") {
            if !device.trim().is_empty() {
                self.detector.device = parse_device(&device)?;
            }
        }
        if let Ok(confidence) = std::env::var("ZONE_SENTRY_CONFIDENCE") {
            self.detector.confidence_threshold = confidence
                .trim()
                .parse()
                .map_err(|_| anyhow!("ZONE_SENTRY_CONFIDENCE must be a number in [0, 1]"))?;
        }
        if let Ok(delay) = std::env::var("ZONE_SENTRY_DEACTIVATE_DELAY_SECS") {
            self.alarm.deactivate_delay_secs = delay.trim().parse().map_err(|_| {
                anyhow!("ZONE_SENTRY_DEACTIVATE_DELAY_SECS must be a number of seconds")
            })?;
        }
        if let Ok(clock) = std::env::var("ZONE_SENTRY_CLOCK") {
            if !clock.trim().is_empty() {
                self.clock = ClockMode::parse(&clock)?;
            }
        }
        Ok(())
    }

    /// Check ranges. Also used after CLI overrides are applied.
    pub fn validate(&self) -> Result<()> {
        let delay = self.alarm.deactivate_delay_secs;
        if !delay.is_finite() || delay < 0.0 {
            return Err(anyhow!(
                "deactivate delay must be a finite, non-negative number of seconds"
            ));
        }
        if !(0.0..=1.0).contains(&self.detector.confidence_threshold) {
            return Err(anyhow!("confidence threshold must be within [0, 1]"));
        }
        if self.target_fps == 0 {
            return Err(anyhow!("target_fps must be >= 1"));
        }
        if self.detector.model.trim().is_empty() {
            return Err(anyhow!("detector model must not be empty"));
        }
        Ok(())
    }
}

fn parse_device(raw: &str) -> Result<Device> {
    Device::parse(raw).ok_or_else(|| anyhow!("device must be one of cpu|cuda|0, got '{}'", raw))
}

fn read_config_file(path: &Path) -> Result<MonitorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = MonitorConfig::from_file(MonitorConfigFile::default()).unwrap();
        assert_eq!(cfg.zones_path, PathBuf::from("restricted_zones.json"));
        assert_eq!(cfg.detector.model, "yolov8n.onnx");
        assert_eq!(cfg.detector.device, Device::Cpu);
        assert_eq!(cfg.alarm.deactivate_delay_secs, 3.0);
        assert_eq!(cfg.clock, ClockMode::Wall);
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_unknown_device_and_clock() {
        let file: MonitorConfigFile =
            serde_json::from_str(r#"{ "detector": { "device": "tpu" } }"#).unwrap();
        assert!(MonitorConfig::from_file(file).is_err());

        let file: MonitorConfigFile =
            serde_json::from_str(r#"{ "alarm": { "clock": "sundial" } }"#).unwrap();
        assert!(MonitorConfig::from_file(file).is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut cfg = MonitorConfig::default();
        cfg.alarm.deactivate_delay_secs = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = MonitorConfig::default();
        cfg.alarm.deactivate_delay_secs = f64::INFINITY;
        assert!(cfg.validate().is_err());

        let mut cfg = MonitorConfig::default();
        cfg.detector.confidence_threshold = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = MonitorConfig::default();
        cfg.target_fps = 0;
        assert!(cfg.validate().is_err());
    }
}
