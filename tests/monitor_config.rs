use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use zone_sentry::{ClockMode, Device, MonitorConfig};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "ZONE_SENTRY_CONFIG",
        "ZONE_SENTRY_ZONES",
        "ZONE_SENTRY_MODEL",
        "ZONE_SENTRY_DEVICE",
        "ZONE_SENTRY_CONFIDENCE",
        "ZONE_SENTRY_DEACTIVATE_DELAY_SECS",
        "ZONE_SENTRY_CLOCK",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = MonitorConfig::load().expect("load config");
    assert_eq!(cfg.zones_path, PathBuf::from("restricted_zones.json"));
    assert_eq!(cfg.detector.model, "yolov8n.onnx");
    assert_eq!(cfg.detector.device, Device::Cpu);
    assert_eq!(cfg.alarm.deactivate_delay_secs, 3.0);
    assert_eq!(cfg.clock, ClockMode::Wall);
    assert_eq!(cfg.target_fps, 30);
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "zones_path": "/etc/zone-sentry/loading_dock.json",
        "detector": {
            "model": "models/yolov8s.onnx",
            "device": "cuda",
            "confidence_threshold": 0.4
        },
        "alarm": {
            "deactivate_delay_secs": 5.0,
            "clock": "media"
        },
        "source": {
            "target_fps": 15
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("ZONE_SENTRY_CONFIG", file.path());
    std::env::set_var("ZONE_SENTRY_MODEL", "stub");
    std::env::set_var("ZONE_SENTRY_DEACTIVATE_DELAY_SECS", "1.5");

    let cfg = MonitorConfig::load().expect("load config");

    assert_eq!(
        cfg.zones_path,
        PathBuf::from("/etc/zone-sentry/loading_dock.json")
    );
    assert_eq!(cfg.detector.model, "stub");
    assert_eq!(cfg.detector.device, Device::Cuda);
    assert_eq!(cfg.detector.confidence_threshold, 0.4);
    assert_eq!(cfg.alarm.deactivate_delay_secs, 1.5);
    assert_eq!(cfg.clock, ClockMode::Media);
    assert_eq!(cfg.target_fps, 15);

    clear_env();
}

#[test]
fn rejects_invalid_env_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("ZONE_SENTRY_DEACTIVATE_DELAY_SECS", "-2");
    assert!(MonitorConfig::load().is_err());
    clear_env();

    std::env::set_var("ZONE_SENTRY_DEACTIVATE_DELAY_SECS", "soon");
    assert!(MonitorConfig::load().is_err());
    clear_env();

    std::env::set_var("ZONE_SENTRY_CONFIDENCE", "1.2");
    assert!(MonitorConfig::load().is_err());
    clear_env();

    std::env::set_var("ZONE_SENTRY_DEVICE", "tpu");
    assert!(MonitorConfig::load().is_err());
    clear_env();
}

#[test]
fn missing_or_invalid_config_file_is_an_error() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("ZONE_SENTRY_CONFIG", "/nonexistent/zone-sentry.json");
    assert!(MonitorConfig::load().is_err());

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, b"{ not json").expect("write config");
    std::env::set_var("ZONE_SENTRY_CONFIG", file.path());
    assert!(MonitorConfig::load().is_err());

    clear_env();
}
