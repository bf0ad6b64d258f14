//! detect_intrusion - flag people entering restricted zones in a video
//!
//! Decodes the video frame by frame, runs the person detector, matches each
//! detection against the configured zones and drives the debounced alarm.
//! Optionally writes one JSON report line per frame.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use zone_sentry::ingest::is_stub_path;
use zone_sentry::{
    backend_from_model, ClockMode, Device, FileConfig, FileSource, IntrusionMonitor,
    MonitorConfig, ReportWriter, ZoneRegistry,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the input video (`stub://name` for a synthetic stream).
    video: String,
    /// Zone file written by mark_zones.
    #[arg(long)]
    zones: Option<PathBuf>,
    /// Detector model: an ONNX file, a JSON detection script, or `stub`.
    #[arg(long)]
    model: Option<String>,
    /// Inference device.
    #[arg(long, value_enum)]
    device: Option<Device>,
    /// Write per-frame JSON reports to this file.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Disable the live status line.
    #[arg(long)]
    no_preview: bool,
    /// Seconds without intrusion before the alarm turns off.
    #[arg(long, value_name = "SECS")]
    deactivate_delay: Option<f64>,
    /// Alarm time source (wall|media).
    #[arg(long, value_name = "CLOCK")]
    clock: Option<String>,
    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty, !stdout_is_tty);

    if !is_stub_path(&args.video) && !Path::new(&args.video).exists() {
        return Err(anyhow!("video file '{}' not found", args.video));
    }

    let mut cfg = MonitorConfig::load()?;
    if let Some(zones) = args.zones {
        cfg.zones_path = zones;
    }
    if let Some(model) = args.model {
        cfg.detector.model = model;
    }
    if let Some(device) = args.device {
        cfg.detector.device = device;
    }
    if let Some(delay) = args.deactivate_delay {
        cfg.alarm.deactivate_delay_secs = delay;
    }
    if let Some(clock) = args.clock.as_deref() {
        cfg.clock = ClockMode::parse(clock)?;
    }
    cfg.validate()?;

    log::info!("processing video: {}", args.video);
    log::info!("device: {}, clock: {}", cfg.detector.device, cfg.clock);

    let zones = {
        let _stage = ui.stage("Load zones");
        let (zones, status) = ZoneRegistry::load_with_status(&cfg.zones_path);
        if !status.is_loaded() {
            log::warn!("no restricted zones active: {}", status);
        }
        zones
    };

    let mut backend = {
        let _stage = ui.stage("Load detector");
        let mut backend = backend_from_model(
            &cfg.detector.model,
            cfg.detector.device,
            cfg.detector.confidence_threshold,
        )?;
        backend.warm_up()?;
        log::info!("detector backend: {}", backend.name());
        backend
    };

    let mut source = {
        let _stage = ui.stage("Open video");
        let mut source = FileSource::new(FileConfig {
            path: args.video.clone(),
            target_fps: cfg.target_fps,
            max_frames: args.max_frames,
            ..FileConfig::default()
        })?;
        source.connect()?;
        source
    };
    let total_frames = match (source.total_frames(), args.max_frames) {
        (Some(total), Some(max)) => Some(total.min(max)),
        (total, max) => total.or(max),
    };

    let mut writer = match &args.output {
        Some(path) => Some(ReportWriter::create(path)?),
        None => None,
    };

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("installing Ctrl-C handler")?;
    }

    let mut monitor = IntrusionMonitor::new(zones, cfg.alarm);
    let mut progress = (!args.no_preview).then(|| ui.frames(total_frames));
    let started = Instant::now();

    while !stop.load(Ordering::SeqCst) {
        let Some(frame) = source.next_frame()? else {
            break;
        };
        let now = match cfg.clock {
            ClockMode::Wall => started.elapsed().as_secs_f64(),
            ClockMode::Media => frame.timestamp_secs,
        };
        let report = monitor.process_frame(
            &frame,
            now,
            backend.as_mut(),
            cfg.detector.confidence_threshold,
        )?;
        if let Some(writer) = writer.as_mut() {
            writer.write(&report)?;
        }
        if let Some(progress) = progress.as_mut() {
            progress.update(
                &report.status_line(total_frames),
                report.transition.is_some(),
            );
        }
    }

    if let Some(progress) = progress {
        progress.finish();
    }
    if stop.load(Ordering::SeqCst) {
        log::info!("interrupted, stopping early");
    }
    if let (Some(writer), Some(path)) = (writer, args.output.as_ref()) {
        let written = writer.written();
        writer.finish()?;
        println!("{} frame report(s) written to {}", written, path.display());
    }

    let summary = monitor.summary();
    println!(
        "processing complete: {} frame(s), {} with intrusions, alarm raised {} time(s)",
        summary.frames, summary.intrusion_frames, summary.activations
    );
    if summary.detector_errors > 0 {
        log::warn!("{} frame(s) had detector errors", summary.detector_errors);
    }
    Ok(())
}
