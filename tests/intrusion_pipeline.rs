use tempfile::TempDir;

use zone_sentry::{
    backend_from_model, AlarmConfig, AlarmTransition, Detection, Device, FileConfig, FileSource,
    IntrusionMonitor, ReportWriter, ScriptedBackend, ZoneRegistry,
};

fn stub_source(frames: u64) -> FileSource {
    let mut source = FileSource::new(FileConfig {
        path: "stub://loading-dock".to_string(),
        target_fps: 10,
        width: 64,
        height: 48,
        max_frames: Some(frames),
    })
    .expect("stub source");
    source.connect().expect("connect");
    source
}

fn dock_zones() -> ZoneRegistry {
    let mut zones = ZoneRegistry::new();
    zones.add([(0, 0), (100, 0), (100, 100), (0, 100)], None);
    zones.add([(200, 0), (300, 0), (300, 100)], None);
    zones
}

/// Ten frames with a person inside zone 1, then nothing.
fn walk_in_then_leave() -> ScriptedBackend {
    let mut frames = vec![vec![Detection::person(40.0, 40.0, 60.0, 60.0, 0.9)]; 10];
    frames.extend(vec![Vec::new(); 50]);
    ScriptedBackend::new(frames)
}

#[test]
fn alarm_turns_off_after_quiet_period_in_media_time() {
    let mut source = stub_source(60);
    let mut backend = walk_in_then_leave();
    let mut monitor = IntrusionMonitor::new(dock_zones(), AlarmConfig::default());

    let mut transitions = Vec::new();
    while let Some(frame) = source.next_frame().expect("decode") {
        let report = monitor
            .process_frame(&frame, frame.timestamp_secs, &mut backend, 0.25)
            .expect("process");
        if frame.index < 10 {
            assert!(report.intrusion.has_intrusion);
            assert_eq!(report.intrusion.zones_hit, vec![1]);
        }
        if let Some(transition) = report.transition {
            transitions.push((frame.index, transition));
        }
    }

    // Last intrusion at frame 9 (0.9s); first quiet frame 10 (1.0s) schedules
    // the alarm off for 4.0s, reached at frame 40.
    assert_eq!(
        transitions,
        vec![
            (0, AlarmTransition::Activated),
            (40, AlarmTransition::Deactivated)
        ]
    );
    let summary = monitor.summary();
    assert_eq!(summary.frames, 60);
    assert_eq!(summary.intrusion_frames, 10);
    assert_eq!(summary.activations, 1);
    assert_eq!(summary.deactivations, 1);
    assert_eq!(summary.detector_errors, 0);
}

#[test]
fn reentry_before_deadline_keeps_alarm_on() {
    let mut source = stub_source(30);
    let inside = vec![Detection::person(40.0, 40.0, 60.0, 60.0, 0.9)];
    let mut frames = vec![inside.clone(); 5];
    frames.extend(vec![Vec::new(); 10]);
    frames.push(inside);
    let mut backend = ScriptedBackend::new(frames);
    let mut monitor = IntrusionMonitor::new(dock_zones(), AlarmConfig::default());

    while let Some(frame) = source.next_frame().expect("decode") {
        let report = monitor
            .process_frame(&frame, frame.timestamp_secs, &mut backend, 0.25)
            .expect("process");
        assert!(report.alarm_active(), "frame {} dropped the alarm", frame.index);
        if frame.index == 15 {
            assert_eq!(report.alarm.deactivate_at, None);
        }
    }
    assert_eq!(monitor.summary().activations, 1);
    assert_eq!(monitor.summary().deactivations, 0);
}

#[test]
fn detections_outside_zones_never_raise_alarm() {
    let mut source = stub_source(20);
    let mut backend = ScriptedBackend::new(vec![
        vec![Detection::person(140.0, 40.0, 160.0, 60.0, 0.9)];
        20
    ]);
    let mut monitor = IntrusionMonitor::new(dock_zones(), AlarmConfig::default());

    while let Some(frame) = source.next_frame().expect("decode") {
        let report = monitor
            .process_frame(&frame, frame.timestamp_secs, &mut backend, 0.25)
            .expect("process");
        assert!(!report.intrusion.has_intrusion);
        assert_eq!(report.labels, vec!["Person 0.90".to_string()]);
    }
    assert_eq!(monitor.summary().activations, 0);
}

#[test]
fn scripted_model_file_drives_report_output() {
    let dir = TempDir::new().expect("temp dir");
    let script = dir.path().join("detections.json");
    std::fs::write(
        &script,
        r#"{ "frames": [ [[40, 40, 60, 60, 0.9], [240, 10, 260, 30, 0.8]], [], [[400, 400, 420, 420, 0.7]] ] }"#,
    )
    .expect("write script");
    let report_path = dir.path().join("reports.jsonl");

    let mut backend = backend_from_model(script.to_str().expect("utf-8 path"), Device::Cpu, 0.25)
        .expect("scripted backend");
    assert_eq!(backend.name(), "scripted");

    let mut source = stub_source(3);
    let mut monitor = IntrusionMonitor::new(dock_zones(), AlarmConfig::default());
    let mut writer = ReportWriter::create(&report_path).expect("create report");
    while let Some(frame) = source.next_frame().expect("decode") {
        let report = monitor
            .process_frame(&frame, frame.timestamp_secs, backend.as_mut(), 0.25)
            .expect("process");
        writer.write(&report).expect("write report");
    }
    assert_eq!(writer.written(), 3);
    writer.finish().expect("flush");

    let raw = std::fs::read_to_string(&report_path).expect("read reports");
    let lines: Vec<serde_json::Value> = raw
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["zones_hit"], serde_json::json!([1, 2]));
    assert_eq!(
        lines[0]["labels"],
        serde_json::json!(["Person (Zone 1)", "Person (Zone 2)"])
    );
    assert_eq!(lines[0]["transition"], "activated");
    assert_eq!(lines[1]["has_intrusion"], false);
    assert_eq!(lines[1]["alarm"]["active"], true);
    assert_eq!(lines[2]["detections"][0]["zone_ids"], serde_json::json!([]));
}

#[test]
fn stub_model_runs_end_to_end() {
    let mut backend = backend_from_model("stub", Device::Cpu, 0.25).expect("stub backend");
    backend.warm_up().expect("warm up");

    let mut zones = ZoneRegistry::new();
    zones.add([(0, 0), (64, 0), (64, 48), (0, 48)], None);
    let mut monitor = IntrusionMonitor::new(zones, AlarmConfig::default());

    let mut source = stub_source(90);
    while let Some(frame) = source.next_frame().expect("decode") {
        monitor
            .process_frame(&frame, frame.timestamp_secs, backend.as_mut(), 0.25)
            .expect("process");
    }
    let summary = monitor.summary();
    assert_eq!(summary.frames, 90);
    assert!(summary.intrusion_frames > 0);
    assert!(summary.activations >= 1);
}
