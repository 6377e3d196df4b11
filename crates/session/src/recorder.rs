//! RecordingSession - the recording state machine.

use std::mem;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use contracts::{
    AggregationMethod, ContractError, FileFormat, GazeCallback, GazeSource, MissingGaze, Point2,
    RecorderBlueprint, RecordingConfig, RollingConfig, SourceKind,
};
use coords::SurfaceTransform;
use observability::{metrics, warnings, SessionMetricsAggregator};
use persistence::{resolve_output_path, PersistenceEngine, SaveReport};
use sample_buffer::{aggregate, window_len, CatchUp, SampleBuffer};
use tracing::{debug, error, info, instrument};

use crate::{RecordingGuard, SessionSummary};

/// Off-surface position reported when no gaze is available (hardware coordinates)
const OFF_SURFACE: Point2 = Point2 { x: 2.0, y: 2.0 };

/// Public view of the session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
}

/// Per-recording state, created by `start` and consumed by `stop`
struct ActiveRecording {
    engine: PersistenceEngine,
    started: Instant,
    metrics: SessionMetricsAggregator,
}

enum State {
    Idle,
    Active(Box<ActiveRecording>),
}

/// Orchestrates one gaze source, the shared buffer and the output file
///
/// # Example
///
/// ```ignore
/// let mut session = RecordingSession::from_blueprint(source, &blueprint)?;
/// let mut recording = session.begin()?;
/// recording.record_event("stimulus_onset")?;
/// let summary = recording.finish()?;
/// ```
pub struct RecordingSession {
    source: Arc<dyn GazeSource>,
    transform: SurfaceTransform,
    config: RecordingConfig,
    buffer: Arc<SampleBuffer>,
    rolling: Option<RollingConfig>,
    gaze_missing: AtomicBool,
    state: State,
}

impl std::fmt::Debug for RecordingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSession")
            .field("source", &self.source.name())
            .field("state", &self.state())
            .field("output", &self.output_path())
            .field("rolling", &self.rolling)
            .finish()
    }
}

impl RecordingSession {
    pub fn new(
        source: Arc<dyn GazeSource>,
        transform: SurfaceTransform,
        config: RecordingConfig,
    ) -> Self {
        Self {
            source,
            transform,
            config,
            buffer: Arc::new(SampleBuffer::new()),
            rolling: None,
            gaze_missing: AtomicBool::new(false),
            state: State::Idle,
        }
    }

    /// Session for the blueprint's surface and recording settings, with the
    /// rolling window installed when the blueprint has one.
    pub fn from_blueprint(
        source: Arc<dyn GazeSource>,
        blueprint: &RecorderBlueprint,
    ) -> Result<Self, ContractError> {
        let mut session = Self::new(
            source,
            SurfaceTransform::new(blueprint.surface),
            blueprint.recording.clone(),
        );
        if let Some(rolling) = &blueprint.rolling {
            session.configure_rolling(rolling)?;
        }
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        match self.state {
            State::Idle => SessionState::Idle,
            State::Active(_) => SessionState::Active,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    pub fn transform(&self) -> &SurfaceTransform {
        &self.transform
    }

    pub fn source(&self) -> &Arc<dyn GazeSource> {
        &self.source
    }

    /// Output file of the active recording
    pub fn output_path(&self) -> Option<PathBuf> {
        match &self.state {
            State::Active(active) => Some(active.engine.path().to_path_buf()),
            State::Idle => None,
        }
    }

    /// Producer error, if the source stopped on its own
    pub fn producer_fault(&self) -> Option<String> {
        self.source.fault()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start recording
    ///
    /// Returns false, with a usage warning and without touching the buffers,
    /// when a recording is already active.
    #[instrument(name = "session_start", skip(self), fields(source = %self.source.name()))]
    pub fn start(&mut self) -> Result<bool, ContractError> {
        if self.is_recording() {
            warnings::usage("start", "recording is already in progress");
            return Ok(false);
        }

        let resolved = resolve_output_path(self.config.output.as_deref(), &Local::now())?;
        let engine = PersistenceEngine::new(
            resolved.path,
            self.config.schema,
            self.transform,
            self.source.frequency_hz(),
        )?;

        self.buffer.deactivate();
        self.buffer.reset();
        self.gaze_missing.store(false, Ordering::Relaxed);

        let buffer = Arc::clone(&self.buffer);
        let source_name = self.source.name().to_string();
        let callback: GazeCallback = Arc::new(move |sample| {
            if buffer.append_sample(sample) {
                metrics::record_sample_received(&source_name);
            }
        });
        let settle = self.source.kind() == SourceKind::Hardware;
        if !settle {
            self.buffer.activate();
        }
        self.source.subscribe(callback);

        if settle {
            // Samples delivered while settling are discarded by the inactive buffer
            debug!(
                stabilization_ms = self.config.stabilization_ms,
                "Waiting for the subscription to settle"
            );
            std::thread::sleep(self.config.stabilization());
            self.buffer.activate();
        }

        info!(
            path = %engine.path().display(),
            format = ?engine.format(),
            schema = ?engine.schema(),
            frequency_hz = self.source.frequency_hz(),
            "Recording started"
        );
        self.state = State::Active(Box::new(ActiveRecording {
            engine,
            started: Instant::now(),
            metrics: SessionMetricsAggregator::new(),
        }));
        Ok(true)
    }

    /// Start recording and return a guard that stops it on drop
    pub fn begin(&mut self) -> Result<RecordingGuard<'_>, ContractError> {
        if self.is_recording() {
            return Err(ContractError::while_recording("begin a new recording"));
        }
        self.start()?;
        Ok(RecordingGuard::new(self))
    }

    /// Stop recording, flush everything and report the session
    ///
    /// Returns `None`, with a usage warning, when no recording is active.
    /// The producer is given `stop_timeout` to finish; if it does not, the
    /// final flush happens anyway. When the flush fails the unsaved data goes
    /// back into the buffer and the session stays active.
    #[instrument(name = "session_stop", skip(self), fields(source = %self.source.name()))]
    pub fn stop(&mut self) -> Result<Option<SessionSummary>, ContractError> {
        let mut active = match mem::replace(&mut self.state, State::Idle) {
            State::Active(active) => active,
            State::Idle => {
                warnings::usage("stop", "no recording is active");
                return Ok(None);
            }
        };

        self.wait_for_catch_up();
        let stopped = self.source.unsubscribe(self.config.stop_timeout());
        if !stopped {
            warnings::resource(
                "stop",
                format!(
                    "gaze producer did not stop within {} ms; saving what was recorded",
                    self.config.stop_timeout_ms
                ),
            );
        }
        self.buffer.deactivate();

        let drained = self.buffer.drain();
        let report = match active.engine.save(&drained.samples, &drained.events) {
            Ok(report) => report,
            Err(err) => {
                // Keep the batch and the session so stop can be retried
                self.buffer.restore(drained);
                self.state = State::Active(active);
                return Err(err);
            }
        };
        active
            .metrics
            .update(report.rows_written, report.events_written, report.elapsed_ms);

        let continuity = if self.config.analyze_continuity {
            active.engine.analyze_continuity()?
        } else {
            None
        };

        let fault = self.source.fault();
        if let Some(message) = &fault {
            warnings::data_integrity(
                "stop",
                format!("recording truncated, gaze producer failed: {message}"),
            );
        }

        let metrics = active.metrics.summary();
        let summary = SessionSummary {
            output: active.engine.path().to_path_buf(),
            format: active.engine.format(),
            duration: active.started.elapsed(),
            rows_written: metrics.total_rows,
            events_written: metrics.total_events,
            saves: metrics.total_saves,
            continuity,
            truncated: fault.is_some(),
            fault,
            metrics,
        };
        info!(
            path = %summary.output.display(),
            rows = summary.rows_written,
            events = summary.events_written,
            duration_s = summary.duration.as_secs_f64(),
            truncated = summary.truncated,
            "Recording stopped"
        );
        Ok(Some(summary))
    }

    /// Flush buffered data without stopping
    ///
    /// Waits (bounded) for gaze to catch up with the last event first so the
    /// event has a sample to attach to.
    #[instrument(name = "session_save", skip(self))]
    pub fn save(&mut self) -> Result<SaveReport, ContractError> {
        if !self.is_recording() {
            return Err(ContractError::not_recording("save"));
        }
        if let Some(message) = self.source.fault() {
            warnings::data_integrity(
                "save",
                format!("gaze producer failed, no new samples will arrive: {message}"),
            );
        }
        self.wait_for_catch_up();
        let drained = self.buffer.drain();

        let State::Active(active) = &mut self.state else {
            return Err(ContractError::not_recording("save"));
        };
        let report = match active.engine.save(&drained.samples, &drained.events) {
            Ok(report) => report,
            Err(err) => {
                self.buffer.restore(drained);
                return Err(err);
            }
        };
        active
            .metrics
            .update(report.rows_written, report.events_written, report.elapsed_ms);
        Ok(report)
    }

    fn wait_for_catch_up(&self) {
        let interval = sample_interval(self.source.frequency_hz());
        if self.buffer.wait_for_catch_up(interval, self.config.catch_up_timeout()) == CatchUp::TimedOut
        {
            debug!(
                timeout_ms = self.config.catch_up_timeout_ms,
                "Gaze did not catch up with the last event"
            );
        }
    }

    // ========================================================================
    // Foreground operations
    // ========================================================================

    /// Mark an event at the current time of the sample clock
    pub fn record_event(&self, label: impl Into<String>) -> Result<(), ContractError> {
        if !self.is_recording() {
            return Err(ContractError::not_recording("record_event"));
        }
        self.buffer
            .append_event(label, self.source.system_time_us())?;
        metrics::record_event_recorded();
        Ok(())
    }

    /// Install the rolling window used by [`Self::get_gaze_position`]
    ///
    /// The window size is fixed once; a second call keeps the existing
    /// window, warns and returns false.
    pub fn configure_rolling(&mut self, config: &RollingConfig) -> Result<bool, ContractError> {
        let capacity = window_len(config.window, self.source.frequency_hz())?;
        let installed = self.buffer.configure_rolling(capacity)?;
        if installed {
            self.rolling = Some(config.clone());
        }
        Ok(installed)
    }

    pub fn rolling_config(&self) -> Option<&RollingConfig> {
        self.rolling.as_ref()
    }

    /// Current gaze position in surface units, using the configured method
    pub fn gaze_position(&self) -> Result<Option<Point2>, ContractError> {
        let (method, on_missing) = self
            .rolling
            .as_ref()
            .map(|r| (r.method, r.on_missing))
            .unwrap_or_default();
        self.get_gaze_position(method, on_missing)
    }

    /// Aggregate the rolling window into one surface position
    ///
    /// Fails with `NotConfigured` when no rolling window was installed. An
    /// empty or all-invalid window yields the off-surface position or `None`
    /// according to `on_missing`.
    pub fn get_gaze_position(
        &self,
        method: AggregationMethod,
        on_missing: MissingGaze,
    ) -> Result<Option<Point2>, ContractError> {
        let window = self.buffer.read_rolling_snapshot()?;
        let position = aggregate(&window, method);
        metrics::record_rolling_query(position.is_some());

        let hardware = match position {
            Some(p) => {
                self.gaze_missing.store(false, Ordering::Relaxed);
                p
            }
            None => {
                if !window.is_empty() && !self.gaze_missing.swap(true, Ordering::Relaxed) {
                    warnings::data_integrity(
                        "get_gaze_position",
                        "no valid gaze in the rolling window",
                    );
                }
                match on_missing {
                    MissingGaze::OffSurface => OFF_SURFACE,
                    MissingGaze::Nothing => return Ok(None),
                }
            }
        };
        self.transform.to_surface(hardware).map(Some)
    }

    /// Change the source's sampling frequency
    ///
    /// Ignored with a usage warning while recording.
    pub fn set_sampling_frequency(&self, hz: f64) -> Result<bool, ContractError> {
        if self.is_recording() {
            warnings::usage(
                "set_sampling_frequency",
                "cannot change the sampling frequency while recording",
            );
            return Ok(false);
        }
        self.source.set_frequency_hz(hz)?;
        info!(frequency_hz = hz, "Sampling frequency changed");
        Ok(true)
    }

    /// Buffered (samples, events) not yet flushed
    pub fn buffered(&self) -> (usize, usize) {
        self.buffer.len()
    }

    /// Current output format, if recording
    pub fn output_format(&self) -> Option<FileFormat> {
        match &self.state {
            State::Active(active) => Some(active.engine.format()),
            State::Idle => None,
        }
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if self.is_recording() {
            if let Err(e) = self.stop() {
                error!(error = %e, "Final flush failed while dropping the session");
            }
        }
    }
}

fn sample_interval(frequency_hz: f64) -> Duration {
    if frequency_hz.is_finite() && frequency_hz > 0.0 {
        Duration::from_secs_f64(1.0 / frequency_hz)
    } else {
        Duration::from_millis(1)
    }
}
