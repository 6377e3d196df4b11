//! GazeSource trait - sample producer abstraction
//!
//! Unifies real eye-tracker subscriptions and simulated producers behind a
//! callback interface, consistent with how tracker SDKs deliver data.

use std::sync::Arc;
use std::time::Duration;

use crate::{ContractError, GazeSample, Point2};

/// Gaze data callback type
///
/// Invoked on the producer's own thread for every sample.
pub type GazeCallback = Arc<dyn Fn(GazeSample) + Send + Sync>;

/// Kind of producer behind a [`GazeSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Real hardware subscription; needs a stabilization interval
    Hardware,
    /// Simulated or replayed data
    Simulated,
}

/// Sample producer
///
/// # Example
///
/// ```ignore
/// let source: Arc<dyn GazeSource> = get_source();
/// source.subscribe(Arc::new(|sample| buffer.append_sample(sample)));
/// // ... record ...
/// source.unsubscribe(Duration::from_secs(1));
/// ```
pub trait GazeSource: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    fn kind(&self) -> SourceKind;

    /// Sampling frequency (Hz), queried from hardware or assumed for simulation
    fn frequency_hz(&self) -> f64;

    /// Change the sampling frequency. Only legal while not streaming.
    fn set_frequency_hz(&self, hz: f64) -> Result<(), ContractError>;

    /// Current time in the sample clock domain (µs)
    fn system_time_us(&self) -> i64;

    /// Start delivering samples to `callback`.
    ///
    /// Idempotent: a second call while streaming registers nothing.
    fn subscribe(&self, callback: GazeCallback);

    /// Stop delivering samples and wait up to `timeout` for in-flight
    /// callbacks to finish. Returns false when the producer did not confirm
    /// the stop in time.
    fn unsubscribe(&self, timeout: Duration) -> bool;

    /// Whether the source is currently providing data
    fn is_streaming(&self) -> bool;

    /// Error that stopped the producer, if any
    fn fault(&self) -> Option<String>;
}

/// Pointer input used to simulate gaze (presentation units)
pub trait PointerDevice: Send + Sync {
    fn position(&self) -> Result<Point2, ContractError>;
}
