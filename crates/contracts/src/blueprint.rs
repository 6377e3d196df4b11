//! RecorderBlueprint - Config Loader output
//!
//! Describes a complete recording setup: presentation surface, recording
//! output, simulation, rolling window, calibration and UI settings.
//! Passed explicitly to the components that need it; nothing here is global.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::{Point2, SchemaVariant, SurfaceGeometry, Units};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete recorder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderBlueprint {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Presentation surface every coordinate conversion refers to
    pub surface: SurfaceGeometry,

    #[serde(default)]
    pub recording: RecordingConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Rolling window for real-time gaze queries (disabled when absent)
    #[serde(default)]
    pub rolling: Option<RollingConfig>,

    #[serde(default)]
    pub calibration: CalibrationConfig,

    #[serde(default)]
    pub ui: UiSettings,
}

impl RecorderBlueprint {
    /// Blueprint with defaults for everything but the surface
    pub fn for_surface(surface: SurfaceGeometry) -> Self {
        Self {
            version: ConfigVersion::V1,
            surface,
            recording: RecordingConfig::default(),
            simulation: SimulationConfig::default(),
            rolling: None,
            calibration: CalibrationConfig::default(),
            ui: UiSettings::default(),
        }
    }
}

/// Recording session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Output file (.csv, .db, .sqlite). Timestamped .csv when absent.
    #[serde(default)]
    pub output: Option<PathBuf>,

    #[serde(default)]
    pub schema: SchemaVariant,

    /// Run the continuity scan after the final flush
    #[serde(default = "default_true")]
    pub analyze_continuity: bool,

    /// Hardware subscription settle time before recording becomes active
    #[serde(default = "default_stabilization_ms")]
    pub stabilization_ms: u64,

    /// Bound on waiting for the producer to stop
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,

    /// Bound on waiting for gaze to catch up with the last event before a drain
    #[serde(default = "default_catch_up_timeout_ms")]
    pub catch_up_timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_stabilization_ms() -> u64 {
    1000
}

fn default_stop_timeout_ms() -> u64 {
    1000
}

fn default_catch_up_timeout_ms() -> u64 {
    500
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output: None,
            schema: SchemaVariant::default(),
            analyze_continuity: true,
            stabilization_ms: default_stabilization_ms(),
            stop_timeout_ms: default_stop_timeout_ms(),
            catch_up_timeout_ms: default_catch_up_timeout_ms(),
        }
    }
}

impl RecordingConfig {
    pub fn stabilization(&self) -> Duration {
        Duration::from_millis(self.stabilization_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn catch_up_timeout(&self) -> Duration {
        Duration::from_millis(self.catch_up_timeout_ms)
    }
}

/// Simulated producer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Target sampling rate (Hz)
    #[serde(default = "default_simulation_hz")]
    pub frequency_hz: f64,

    /// Uniform timing jitter added to each tick (µs)
    #[serde(default)]
    pub jitter_us: u64,
}

fn default_simulation_hz() -> f64 {
    120.0
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            frequency_hz: default_simulation_hz(),
            jitter_us: 0,
        }
    }
}

/// Size of the rolling window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollingWindow {
    /// Explicit sample count
    Samples(usize),
    /// Time window (ms), converted with the sampling frequency
    DurationMs(f64),
}

/// How the rolling window collapses into one position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethod {
    /// Robust to outliers
    #[default]
    Median,
    Mean,
    /// Most recent sample only, both eyes averaged
    Last,
}

/// What a gaze query returns when the window holds no valid data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingGaze {
    /// Deterministic position outside the surface
    #[default]
    OffSurface,
    /// No position at all
    Nothing,
}

/// Rolling window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingConfig {
    pub window: RollingWindow,

    #[serde(default)]
    pub method: AggregationMethod,

    #[serde(default)]
    pub on_missing: MissingGaze,
}

/// Calibration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Targets in surface units
    #[serde(default = "default_calibration_points")]
    pub points: Vec<Point2>,

    /// Units the points are expressed in (surface units when absent)
    #[serde(default)]
    pub units: Option<Units>,

    /// Fixation wait before collecting at a point
    #[serde(default = "default_focus_time_ms")]
    pub focus_time_ms: u64,

    /// Pointer samples per point in simulation
    #[serde(default = "default_samples_per_point")]
    pub samples_per_point: usize,

    /// Calibration blob to load or save
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_calibration_points() -> Vec<Point2> {
    vec![
        Point2::new(-0.4, 0.4),
        Point2::new(0.4, 0.4),
        Point2::new(0.0, 0.0),
        Point2::new(-0.4, -0.4),
        Point2::new(0.4, -0.4),
    ]
}

fn default_focus_time_ms() -> u64 {
    500
}

fn default_samples_per_point() -> usize {
    5
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            points: default_calibration_points(),
            units: Some(Units::Height),
            focus_time_ms: default_focus_time_ms(),
            samples_per_point: default_samples_per_point(),
            file: None,
        }
    }
}

/// Animation parameters for calibration stimuli (sizes in height units)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub zoom_speed: f64,
    pub max_zoom_size: f64,
    pub min_zoom_size: f64,
    pub trill_size: f64,
    /// Degrees
    pub trill_rotation_range: f64,
    /// Seconds, active + pause
    pub trill_cycle_duration: f64,
    /// Seconds of rotation within each cycle
    pub trill_active_duration: f64,
    /// Oscillations per second while active
    pub trill_frequency: f64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            zoom_speed: 6.0,
            max_zoom_size: 0.11,
            min_zoom_size: 0.05,
            trill_size: 0.075,
            trill_rotation_range: 20.0,
            trill_cycle_duration: 1.5,
            trill_active_duration: 1.1,
            trill_frequency: 3.0,
        }
    }
}

/// Feedback element sizes (height units)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSizes {
    pub highlight: f64,
    pub line_width: f64,
    pub marker: f64,
    pub border: f64,
    pub text: f64,
    pub target_circle: f64,
}

impl Default for UiSizes {
    fn default() -> Self {
        Self {
            highlight: 0.04,
            line_width: 0.003,
            marker: 0.02,
            border: 0.005,
            text: 0.025,
            target_circle: 0.012,
        }
    }
}

/// UI settings passed to calibration and feedback components
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiSettings {
    #[serde(default)]
    pub animation: AnimationSettings,
    #[serde(default)]
    pub sizes: UiSizes,
}
