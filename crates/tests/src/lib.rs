//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（无需眼动仪）
//! - 文件格式与连续性回归

#[cfg(test)]
mod support {
    use std::sync::{Arc, Once};

    use contracts::{
        GazeSource, PointerDevice, RecordingConfig, SimulationConfig, SurfaceGeometry, Units,
    };
    use coords::SurfaceTransform;
    use gaze_source::SimulatedGazeSource;
    use session::RecordingSession;

    static TRACING: Once = Once::new();

    /// Logs from every crate, once per test binary
    pub fn init_tracing() {
        TRACING.call_once(|| {
            let _ = observability::init_with_config(observability::ObservabilityConfig {
                log_format: observability::LogFormat::Compact,
                metrics_port: None,
                default_log_level: "warn".to_string(),
            });
        });
    }

    pub fn transform() -> SurfaceTransform {
        SurfaceTransform::new(SurfaceGeometry::new(1280, 1024, Units::Height))
    }

    pub fn simulated(pointer: Arc<dyn PointerDevice>, hz: f64) -> Arc<dyn GazeSource> {
        Arc::new(SimulatedGazeSource::new(
            pointer,
            transform(),
            &SimulationConfig {
                frequency_hz: hz,
                jitter_us: 0,
            },
        ))
    }

    pub fn session(source: Arc<dyn GazeSource>, config: RecordingConfig) -> RecordingSession {
        RecordingSession::new(
            source,
            transform(),
            RecordingConfig {
                stabilization_ms: 0,
                ..config
            },
        )
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{ContractError, ErrorCategory, FileFormat, Units};
    use std::path::Path;

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_unsupported_output_is_configuration_error() {
        let err = FileFormat::from_path(Path::new("gaze.xlsx")).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(matches!(err, ContractError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_unit_names_round_trip() {
        for units in [Units::Normalized, Units::Height, Units::Pixel] {
            assert_eq!(units.as_str().parse::<Units>().unwrap(), units);
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use contracts::{Point2, RecordingConfig, SchemaVariant};
    use gaze_source::{FixedPointer, ScriptedPointer};
    use rusqlite::Connection;

    use crate::support;

    /// End-to-end: simulated tracker -> session -> CSV, with periodic saves
    ///
    /// 验证完整的数据流：
    /// 1. 模拟眼动仪以 120 Hz 产生采样
    /// 2. 录制期间插入事件并多次保存
    /// 3. 停止后文件中的事件与行顺序完整
    #[test]
    fn test_e2e_simulated_csv() {
        support::init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subject1.csv");

        let pointer = Arc::new(ScriptedPointer::circle(Point2::new(0.0, 0.0), 0.2, 1.0));
        let mut session = support::session(
            support::simulated(pointer, 120.0),
            RecordingConfig {
                output: Some(path.clone()),
                ..RecordingConfig::default()
            },
        );

        assert!(session.start().unwrap());
        for i in 0..3 {
            thread::sleep(Duration::from_millis(60));
            session.record_event(format!("trial_{i}")).unwrap();
            thread::sleep(Duration::from_millis(20));
            session.save().unwrap();
        }
        thread::sleep(Duration::from_millis(40));
        let summary = session.stop().unwrap().unwrap();

        assert_eq!(summary.events_written, 3);
        assert_eq!(summary.saves, 4);
        assert!(!summary.truncated);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(0), Some("TimeStamp"));
        assert_eq!(headers.iter().last(), Some("Events"));
        let events_col = headers.len() - 1;

        // header written once
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len() as u64, summary.rows_written);

        let stamps: Vec<i64> = rows.iter().map(|r| r[0].parse().unwrap()).collect();
        assert_eq!(stamps[0], 0);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));

        let labels: Vec<&str> = rows
            .iter()
            .map(|r| &r[events_col])
            .filter(|l| !l.is_empty())
            .collect();
        assert_eq!(labels, vec!["trial_0", "trial_1", "trial_2"]);
    }

    /// Raw schema into SQLite keeps the source clock strictly increasing
    /// across drains and stores events in their own table.
    #[test]
    fn test_e2e_sqlite_raw_across_drains() {
        support::init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subject2.db");

        let pointer = Arc::new(FixedPointer(Point2::new(0.1, -0.1)));
        let mut session = support::session(
            support::simulated(pointer, 250.0),
            RecordingConfig {
                output: Some(path.clone()),
                schema: SchemaVariant::Raw,
                ..RecordingConfig::default()
            },
        );

        session.start().unwrap();
        for label in ["fixation", "stimulus"] {
            thread::sleep(Duration::from_millis(40));
            session.record_event(label).unwrap();
            thread::sleep(Duration::from_millis(10));
            session.save().unwrap();
        }
        let summary = session.stop().unwrap().unwrap();
        assert!(summary.rows_written > 0);

        let conn = Connection::open(&path).unwrap();
        let mut stmt = conn
            .prepare("SELECT system_time_stamp FROM gaze ORDER BY rowid")
            .unwrap();
        let stamps: Vec<i64> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(stamps.len() as u64, summary.rows_written);
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));

        let events: i64 = conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
            .unwrap();
        assert_eq!(events, 2);

        let attrs: i64 = conn
            .query_row("SELECT COUNT(*) FROM gaze_attrs", [], |row| row.get(0))
            .unwrap();
        assert!(attrs > 0);
    }

    /// Samples produced while the session is idle never reach the file
    #[test]
    fn test_restart_writes_fresh_session() {
        support::init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("restart.csv");

        let pointer = Arc::new(FixedPointer(Point2::new(0.0, 0.0)));
        let mut session = support::session(
            support::simulated(pointer, 120.0),
            RecordingConfig {
                output: Some(path.clone()),
                ..RecordingConfig::default()
            },
        );

        session.start().unwrap();
        thread::sleep(Duration::from_millis(50));
        let first = session.stop().unwrap().unwrap();

        thread::sleep(Duration::from_millis(50));
        assert_eq!(session.buffered(), (0, 0));

        session.start().unwrap();
        thread::sleep(Duration::from_millis(50));
        let second = session.stop().unwrap().unwrap();

        let rows = csv::Reader::from_path(&path).unwrap().records().count() as u64;
        assert_eq!(rows, first.rows_written + second.rows_written);
    }
}

#[cfg(test)]
mod replay_tests {
    use std::io::Write;
    use std::thread;
    use std::time::{Duration, Instant};

    use contracts::{GazeSource, Point2, RecordingConfig};
    use gaze_source::{simulated_sample, ReplayConfig, ReplayGazeSource};
    use std::sync::Arc;

    use crate::support;

    /// Replayed JSONL recordings are written row for row
    #[test]
    fn test_replay_recording_is_complete() {
        support::init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let jsonl = dir.path().join("session.jsonl");
        let output = dir.path().join("replayed.csv");

        let mut file = std::fs::File::create(&jsonl).unwrap();
        for i in 0..60 {
            let sample = simulated_sample(Point2::new(0.5, 0.5), 5_000_000 + i * 8_333);
            writeln!(file, "{}", serde_json::to_string(&sample).unwrap()).unwrap();
        }
        drop(file);

        let source: Arc<dyn GazeSource> = Arc::new(
            ReplayGazeSource::load(
                &jsonl,
                ReplayConfig {
                    speed_multiplier: 4.0,
                    frequency_hz: None,
                },
            )
            .unwrap(),
        );
        let mut session = support::session(
            Arc::clone(&source),
            RecordingConfig {
                output: Some(output.clone()),
                ..RecordingConfig::default()
            },
        );

        session.start().unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while source.is_streaming() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        let summary = session.stop().unwrap().unwrap();

        assert_eq!(summary.rows_written, 60);
        let report = summary.continuity.unwrap();
        assert_eq!(report.gaps, 0);
        assert_eq!(report.dropped_samples, 0);
    }
}

#[cfg(test)]
mod continuity_tests {
    use contracts::{Event, Point2, SchemaVariant};
    use gaze_source::simulated_sample;
    use persistence::{analyze_file, PersistenceEngine};

    use crate::support;

    #[test]
    fn test_gap_detected_in_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gappy.csv");
        let mut engine =
            PersistenceEngine::new(&path, SchemaVariant::Simplified, support::transform(), 100.0)
                .unwrap();

        // 100 Hz with 3 samples missing between the two batches
        let first: Vec<_> = (0..20)
            .map(|i| simulated_sample(Point2::new(0.5, 0.5), i * 10_000))
            .collect();
        let second: Vec<_> = (23..40)
            .map(|i| simulated_sample(Point2::new(0.5, 0.5), i * 10_000))
            .collect();
        engine.save(&first, &[Event::new(55_000, "cue")]).unwrap();
        engine.save(&second, &[]).unwrap();

        let report = analyze_file(&path, 100.0).unwrap().unwrap();
        assert_eq!(report.total_samples, 37);
        assert_eq!(report.gaps, 1);
        assert_eq!(report.dropped_samples, 3);
        assert_eq!(report.max_interval_us, 40_000);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let cue_row = reader
            .records()
            .map(Result::unwrap)
            .position(|r| r.iter().last() == Some("cue"))
            .unwrap();
        // first sample at or after 55 ms is the one at 60 ms
        assert_eq!(cue_row, 6);
    }
}

#[cfg(test)]
mod calibration_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use calibration::{
        load_calibration, save_calibration, CalibrationOperator, CalibrationProcedure,
        CollectionState, OperatorCommand, PointerCalibrationBackend, ReviewDecision,
    };
    use contracts::{CalibrationConfig, CalibrationResult, CalibrationStatus, Point2};
    use gaze_source::FixedPointer;

    use crate::support;

    /// Collects everything once and accepts
    struct Unattended;

    impl CalibrationOperator for Unattended {
        fn next_command(&mut self, state: &CollectionState<'_>) -> OperatorCommand {
            state
                .pending
                .iter()
                .copied()
                .find(|&i| !state.collected[i])
                .map_or(OperatorCommand::Finish, OperatorCommand::Collect)
        }

        fn review(&mut self, _result: &CalibrationResult) -> ReviewDecision {
            ReviewDecision::Accept
        }
    }

    #[test]
    fn test_calibrate_save_and_reload() {
        support::init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("subject1_calibration.dat");
        let transform = support::transform();

        let config = CalibrationConfig {
            focus_time_ms: 0,
            samples_per_point: 3,
            file: Some(file.clone()),
            ..CalibrationConfig::default()
        };
        let procedure = CalibrationProcedure::from_config(&config, &transform).unwrap();
        let pointer = Arc::new(FixedPointer(Point2::new(0.0, 0.0)));
        let mut backend = PointerCalibrationBackend::new(pointer.clone(), transform, 3)
            .with_collection_time(Duration::ZERO);

        let report = procedure.run(&mut backend, &mut Unattended).unwrap();
        assert!(report.success());
        let result = report.result.unwrap();
        assert_eq!(result.status, CalibrationStatus::Success);
        assert_eq!(result.points.len(), config.points.len());

        save_calibration(&backend, config.file.as_deref()).unwrap();

        let mut fresh = PointerCalibrationBackend::new(pointer, transform, 3);
        load_calibration(&mut fresh, &file).unwrap();
        assert_eq!(fresh.applied(), backend.applied());
    }

    #[test]
    fn test_too_many_points_rejected() {
        let config = CalibrationConfig {
            points: vec![Point2::new(0.0, 0.0); 10],
            ..CalibrationConfig::default()
        };
        assert!(CalibrationProcedure::from_config(&config, &support::transform()).is_err());
    }
}

#[cfg(test)]
mod config_tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{GazeSource, Point2, SimulationConfig};
    use coords::SurfaceTransform;
    use gaze_source::{SharedPointer, SimulatedGazeSource};
    use session::RecordingSession;

    const CONFIG: &str = r#"
[surface]
width_px = 1280
height_px = 1024
units = "height"

[recording]
stabilization_ms = 0

[simulation]
frequency_hz = 200.0

[rolling]
window = { samples = 8 }
method = "median"
on_missing = "off_surface"
"#;

    /// Config file -> session with rolling gaze that follows the pointer
    #[test]
    fn test_config_drives_session() {
        crate::support::init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let mut blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        blueprint.recording.output = Some(dir.path().join("configured.csv"));

        let pointer = SharedPointer::new(Point2::new(0.2, 0.1));
        let source: Arc<dyn GazeSource> = Arc::new(SimulatedGazeSource::new(
            Arc::new(pointer.clone()),
            SurfaceTransform::new(blueprint.surface),
            &SimulationConfig {
                frequency_hz: blueprint.simulation.frequency_hz,
                jitter_us: 0,
            },
        ));
        let mut session = RecordingSession::from_blueprint(source, &blueprint).unwrap();
        assert!(session.rolling_config().is_some());

        let guard = session.begin().unwrap();
        thread::sleep(Duration::from_millis(100));
        let gaze = guard.gaze_position().unwrap().unwrap();
        assert!((gaze.x - 0.2).abs() < 1e-6);
        assert!((gaze.y - 0.1).abs() < 1e-6);

        pointer.set(Point2::new(-0.3, 0.0));
        thread::sleep(Duration::from_millis(100));
        let gaze = guard.gaze_position().unwrap().unwrap();
        assert!((gaze.x + 0.3).abs() < 1e-6);

        let summary = guard.finish().unwrap().unwrap();
        assert!(summary.rows_written > 0);
    }

    #[test]
    fn test_invalid_output_rejected_before_recording() {
        let mut blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        blueprint.recording.output = Some("gaze.parquet".into());
        assert!(ConfigLoader::validate(&blueprint).is_err());
    }
}
