//! Pipeline orchestrator - coordinates source, calibration and recording.
//!
//! Runs either a pointer-driven simulated tracker or a JSONL replay through
//! a full recording session. Blocking: call it from a dedicated thread.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use calibration::{
    load_calibration, save_calibration, CalibrationProcedure, PointerCalibrationBackend,
};
use contracts::{GazeSource, Point2, PointerDevice, RecorderBlueprint};
use coords::SurfaceTransform;
use gaze_source::{
    connect, DeviceInfo, ReplayConfig, ReplayGazeSource, ScriptedPointer, SimulatedDiscovery,
};
use session::RecordingSession;
use tracing::{debug, info, warn};

use super::{AutoOperator, PipelineStats};

/// Loop tick for events, saves and gaze queries
const TICK: Duration = Duration::from_millis(10);

/// Period of the simulated pointer's circle (seconds)
const POINTER_PERIOD_S: f64 = 4.0;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated recorder configuration
    pub blueprint: RecorderBlueprint,

    /// Recording length (None = until shutdown or end of replay)
    pub duration: Option<Duration>,

    /// Insert an event at this interval (None = no events)
    pub event_interval: Option<Duration>,

    /// Flush to disk at this interval (None = only at stop)
    pub save_interval: Option<Duration>,

    /// Run the calibration procedure before recording
    pub calibrate: bool,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Replay recorded data instead of simulating
    pub replay_path: Option<PathBuf>,

    /// Replay speed multiplier (1.0 = original speed)
    pub replay_speed: f64,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion or until `shutdown` is set
    pub fn run(self, shutdown: Arc<AtomicBool>) -> Result<PipelineStats> {
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let transform = SurfaceTransform::new(blueprint.surface);
        let radius = transform
            .height_to_units(0.25)
            .context("Failed to size the simulated pointer path")?;
        let pointer: Arc<dyn PointerDevice> = Arc::new(ScriptedPointer::circle(
            Point2::new(0.0, 0.0),
            radius,
            POINTER_PERIOD_S,
        ));

        let (device, source) = self.open_source(Arc::clone(&pointer), transform)?;
        let mut stats = PipelineStats {
            device: Some(device),
            ..Default::default()
        };

        // Calibration
        let mut backend = PointerCalibrationBackend::new(
            Arc::clone(&pointer),
            transform,
            blueprint.calibration.samples_per_point,
        );
        if self.config.calibrate {
            stats.calibration = Some(self.calibrate(&mut backend, transform)?);
        } else if let Some(path) = blueprint.calibration.file.as_deref() {
            if path.exists() {
                load_calibration(&mut backend, path)
                    .with_context(|| format!("Failed to load calibration {}", path.display()))?;
            }
        }

        // Recording
        let mut session = RecordingSession::from_blueprint(source, blueprint)
            .context("Failed to create recording session")?;
        let mut recording = session.begin().context("Failed to start recording")?;
        info!(
            output = ?recording.output_path(),
            duration = ?self.config.duration,
            "Recording started"
        );

        let started = Instant::now();
        let mut last_event = started;
        let mut last_save = started;
        let replaying = self.config.replay_path.is_some();

        loop {
            if shutdown.load(Ordering::SeqCst) {
                info!("Shutdown requested");
                break;
            }
            if self.config.duration.is_some_and(|d| started.elapsed() >= d) {
                info!("Reached recording duration");
                break;
            }
            if replaying && !recording.source().is_streaming() {
                info!("Replay finished");
                break;
            }
            if let Some(fault) = recording.producer_fault() {
                warn!(fault = %fault, "Producer stopped early");
                break;
            }

            if let Some(interval) = self.config.event_interval {
                if last_event.elapsed() >= interval {
                    let label = format!("event_{}", stats.events_recorded + 1);
                    recording.record_event(label)?;
                    stats.events_recorded += 1;
                    last_event = Instant::now();
                }
            }

            if let Some(interval) = self.config.save_interval {
                if last_save.elapsed() >= interval {
                    let report = recording.save().context("Periodic save failed")?;
                    debug!(rows = report.rows_written, "Periodic save");
                    last_save = Instant::now();
                }
            }

            if recording.rolling_config().is_some() {
                stats.gaze_queries += 1;
                if recording.gaze_position()?.is_none() {
                    stats.gaze_missing += 1;
                }
            }

            thread::sleep(TICK);
        }

        info!("Stopping recording...");
        stats.summary = recording.finish().context("Failed to stop recording")?;
        Ok(stats)
    }

    fn open_source(
        &self,
        pointer: Arc<dyn PointerDevice>,
        transform: SurfaceTransform,
    ) -> Result<(DeviceInfo, Arc<dyn GazeSource>)> {
        if let Some(path) = &self.config.replay_path {
            info!(path = %path.display(), "Running in REPLAY mode");
            let replay = ReplayGazeSource::load(
                path,
                ReplayConfig {
                    speed_multiplier: self.config.replay_speed,
                    frequency_hz: None,
                },
            )
            .with_context(|| format!("Failed to load replay {}", path.display()))?;
            let device = DeviceInfo {
                address: format!("file://{}", path.display()),
                model: "Replay".to_string(),
                serial_number: "REPLAY".to_string(),
                frequencies_hz: vec![replay.frequency_hz()],
            };
            return Ok((device, Arc::new(replay)));
        }

        info!("Running in SIMULATION mode (pointer-driven tracker)");
        let discovery =
            SimulatedDiscovery::new(pointer, transform, self.config.blueprint.simulation.clone());
        connect(&discovery, 0).context("Failed to connect to the simulated tracker")
    }

    fn calibrate(
        &self,
        backend: &mut PointerCalibrationBackend,
        transform: SurfaceTransform,
    ) -> Result<bool> {
        let calibration = &self.config.blueprint.calibration;
        let procedure = CalibrationProcedure::from_config(calibration, &transform)
            .context("Invalid calibration points")?;
        info!(points = procedure.points().len(), "Running calibration");

        let report = procedure
            .run(backend, &mut AutoOperator::default())
            .context("Calibration failed")?;
        info!(
            success = report.success(),
            rounds = report.rounds,
            "Calibration finished"
        );

        if report.success() {
            if let Some(path) = calibration.file.as_deref() {
                save_calibration(&*backend, Some(path))
                    .with_context(|| format!("Failed to save calibration {}", path.display()))?;
            }
        }
        Ok(report.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SurfaceGeometry, Units};

    fn config(output: PathBuf) -> PipelineConfig {
        let mut blueprint =
            RecorderBlueprint::for_surface(SurfaceGeometry::new(800, 600, Units::Height));
        blueprint.recording.output = Some(output);
        blueprint.recording.stabilization_ms = 0;
        PipelineConfig {
            blueprint,
            duration: Some(Duration::from_millis(150)),
            event_interval: Some(Duration::from_millis(40)),
            save_interval: Some(Duration::from_millis(60)),
            calibrate: false,
            metrics_port: None,
            replay_path: None,
            replay_speed: 1.0,
        }
    }

    #[test]
    fn test_simulated_run_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("sim.csv");
        let stats = Pipeline::new(config(output.clone()))
            .run(Arc::new(AtomicBool::new(false)))
            .unwrap();

        let summary = stats.summary.unwrap();
        assert_eq!(summary.output, output);
        assert!(summary.rows_written > 0);
        assert!(stats.events_recorded >= 1);
        assert!(output.exists());
    }

    #[test]
    fn test_shutdown_flag_stops_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path().join("stopped.csv"));
        cfg.duration = None;
        let stats = Pipeline::new(cfg)
            .run(Arc::new(AtomicBool::new(true)))
            .unwrap();
        assert_eq!(stats.events_recorded, 0);
        assert!(stats.summary.is_some());
    }

    #[test]
    fn test_calibration_saved_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path().join("calibrated.csv"));
        let calib = dir.path().join("calib.dat");
        cfg.calibrate = true;
        cfg.duration = Some(Duration::from_millis(20));
        cfg.blueprint.calibration.focus_time_ms = 0;
        cfg.blueprint.calibration.file = Some(calib.clone());

        let stats = Pipeline::new(cfg)
            .run(Arc::new(AtomicBool::new(false)))
            .unwrap();
        assert!(stats.calibration.is_some());
        if stats.calibration == Some(true) {
            assert!(calib.exists());
        }
    }
}
