//! Simulated eye tracker driven by a pointer device
//!
//! Reads the pointer position (presentation units) at a fixed rate, converts
//! it to hardware-normalized coordinates and emits a sample with both eyes
//! looking at that point. Used for development and tests without hardware.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{
    ContractError, EyeData, GazeCallback, GazeSample, GazeSource, Point2, Point3, PointerDevice,
    SimulationConfig, SourceKind, UserPosition,
};
use coords::SurfaceTransform;
use rand::Rng;
use tracing::{debug, info};

use crate::worker::{sleep_until, Producer};

/// Pupil diameter reported by the simulation (mm)
const SIMULATED_PUPIL_MM: f64 = 3.0;

/// Build the sample the simulation emits for a hardware-normalized point
pub fn simulated_sample(hardware: Point2, system_time_stamp: i64) -> GazeSample {
    let eye = EyeData {
        pupil_diameter: SIMULATED_PUPIL_MM,
        pupil_validity: true,
        ..EyeData::looking_at(hardware)
    };
    let head = Point3::new(0.0, 0.0, 0.6);
    GazeSample {
        device_time_stamp: system_time_stamp,
        system_time_stamp,
        left: eye,
        right: eye,
        user_position: Some(UserPosition {
            left: head,
            left_validity: true,
            right: head,
            right_validity: true,
        }),
    }
}

/// Pointer-driven gaze producer
///
/// Its clock is the time elapsed since the source was created, in µs.
pub struct SimulatedGazeSource {
    name: String,
    pointer: Arc<dyn PointerDevice>,
    transform: SurfaceTransform,
    frequency_bits: AtomicU64,
    jitter_us: u64,
    epoch: Instant,
    producer: Producer,
}

impl std::fmt::Debug for SimulatedGazeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedGazeSource")
            .field("name", &self.name)
            .field("frequency_hz", &self.frequency_hz())
            .field("streaming", &self.producer.is_streaming())
            .finish()
    }
}

impl SimulatedGazeSource {
    pub fn new(
        pointer: Arc<dyn PointerDevice>,
        transform: SurfaceTransform,
        config: &SimulationConfig,
    ) -> Self {
        Self {
            name: "simulated".to_string(),
            pointer,
            transform,
            frequency_bits: AtomicU64::new(config.frequency_hz.to_bits()),
            jitter_us: config.jitter_us,
            epoch: Instant::now(),
            producer: Producer::default(),
        }
    }

    /// Rename the source (used in logs and metrics)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl GazeSource for SimulatedGazeSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Simulated
    }

    fn frequency_hz(&self) -> f64 {
        f64::from_bits(self.frequency_bits.load(Ordering::Relaxed))
    }

    fn set_frequency_hz(&self, hz: f64) -> Result<(), ContractError> {
        if self.producer.is_streaming() {
            return Err(ContractError::while_recording("change the sampling frequency"));
        }
        if !hz.is_finite() || hz <= 0.0 {
            return Err(ContractError::config_validation(
                "simulation.frequency_hz",
                format!("must be positive, got {hz}"),
            ));
        }
        self.frequency_bits.store(hz.to_bits(), Ordering::Relaxed);
        info!(source = %self.name, frequency_hz = hz, "Sampling frequency set");
        Ok(())
    }

    fn system_time_us(&self) -> i64 {
        self.epoch.elapsed().as_micros() as i64
    }

    fn subscribe(&self, callback: GazeCallback) {
        let pointer = Arc::clone(&self.pointer);
        let transform = self.transform;
        let frequency_hz = self.frequency_hz();
        let jitter_us = self.jitter_us;
        let epoch = self.epoch;
        let interval = Duration::from_secs_f64(1.0 / frequency_hz);

        let started = self.producer.start(&self.name, move |ctx| {
            debug!(frequency_hz, jitter_us, "Simulation thread started");
            let mut rng = rand::rng();
            let mut next = Instant::now();
            let mut emitted: u64 = 0;

            while ctx.running() {
                let hardware = match pointer
                    .position()
                    .and_then(|p| transform.to_hardware(p))
                {
                    Ok(p) => p,
                    Err(e) => {
                        ctx.fail(format!("pointer read failed: {e}"));
                        break;
                    }
                };
                let ts = epoch.elapsed().as_micros() as i64;
                if !ctx.deliver(&callback, simulated_sample(hardware, ts)) {
                    break;
                }
                emitted += 1;

                next += interval;
                if jitter_us > 0 {
                    next += Duration::from_micros(rng.random_range(0..=jitter_us));
                }
                let now = Instant::now();
                if next < now {
                    next = now;
                }
                sleep_until(next);
            }

            debug!(emitted, "Simulation thread exiting");
            ctx.finish();
        });

        if started {
            info!(source = %self.name, frequency_hz, "Gaze simulation subscribed");
        }
    }

    fn unsubscribe(&self, timeout: Duration) -> bool {
        self.producer.stop(&self.name, timeout)
    }

    fn is_streaming(&self) -> bool {
        self.producer.is_streaming()
    }

    fn fault(&self) -> Option<String> {
        self.producer.fault()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixedPointer;
    use contracts::{SurfaceGeometry, Units};
    use std::sync::Mutex;
    use std::thread;

    struct BrokenPointer;

    impl PointerDevice for BrokenPointer {
        fn position(&self) -> Result<Point2, ContractError> {
            Err(ContractError::Other("pointer unplugged".into()))
        }
    }

    fn source(pointer: Arc<dyn PointerDevice>, hz: f64) -> SimulatedGazeSource {
        let transform = SurfaceTransform::new(SurfaceGeometry::new(1920, 1080, Units::Height));
        SimulatedGazeSource::new(
            pointer,
            transform,
            &SimulationConfig {
                frequency_hz: hz,
                jitter_us: 0,
            },
        )
    }

    fn collector() -> (Arc<Mutex<Vec<GazeSample>>>, GazeCallback) {
        let samples = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&samples);
        let callback: GazeCallback = Arc::new(move |s| sink.lock().unwrap().push(s));
        (samples, callback)
    }

    #[test]
    fn test_simulated_samples() {
        let src = source(Arc::new(FixedPointer(Point2::new(0.0, 0.0))), 200.0);
        let (samples, callback) = collector();

        src.subscribe(callback);
        assert!(src.is_streaming());
        thread::sleep(Duration::from_millis(100));
        assert!(src.unsubscribe(Duration::from_secs(1)));
        assert!(!src.is_streaming());

        let samples = samples.lock().unwrap();
        assert!(samples.len() >= 5, "got {} samples", samples.len());
        for s in samples.iter() {
            assert_eq!(s.left.gaze_point_on_display_area, Point2::new(0.5, 0.5));
            assert_eq!(s.right.gaze_point_on_display_area, Point2::new(0.5, 0.5));
            assert_eq!(s.left.pupil_diameter, 3.0);
            assert!(s.left.gaze_point_validity && s.right.pupil_validity);
        }
        assert!(samples
            .windows(2)
            .all(|w| w[0].system_time_stamp < w[1].system_time_stamp));
        assert!(src.fault().is_none());
    }

    #[test]
    fn test_subscribe_idempotent() {
        let src = source(Arc::new(FixedPointer(Point2::new(0.0, 0.0))), 200.0);
        let (first, cb1) = collector();
        let (second, cb2) = collector();

        src.subscribe(cb1);
        src.subscribe(cb2);
        thread::sleep(Duration::from_millis(30));
        src.unsubscribe(Duration::from_secs(1));

        assert!(!first.lock().unwrap().is_empty());
        assert!(second.lock().unwrap().is_empty());
    }

    #[test]
    fn test_pointer_failure_stops_producer() {
        let src = source(Arc::new(BrokenPointer), 100.0);
        let (samples, callback) = collector();

        src.subscribe(callback);
        thread::sleep(Duration::from_millis(30));

        assert!(!src.is_streaming());
        assert!(src.fault().unwrap().contains("pointer unplugged"));
        assert!(samples.lock().unwrap().is_empty());
        assert!(src.unsubscribe(Duration::from_secs(1)));
    }

    #[test]
    fn test_callback_panic_is_contained() {
        let src = source(Arc::new(FixedPointer(Point2::new(0.0, 0.0))), 100.0);
        src.subscribe(Arc::new(|_| panic!("consumer bug")));
        thread::sleep(Duration::from_millis(30));

        assert!(!src.is_streaming());
        assert_eq!(src.fault().as_deref(), Some("gaze callback panicked"));
        assert!(src.unsubscribe(Duration::from_secs(1)));
    }

    #[test]
    fn test_frequency_locked_while_streaming() {
        let src = source(Arc::new(FixedPointer(Point2::new(0.0, 0.0))), 100.0);
        src.set_frequency_hz(60.0).unwrap();
        assert_eq!(src.frequency_hz(), 60.0);
        assert!(src.set_frequency_hz(0.0).is_err());

        src.subscribe(Arc::new(|_| {}));
        assert!(matches!(
            src.set_frequency_hz(300.0),
            Err(ContractError::WhileRecording { .. })
        ));
        src.unsubscribe(Duration::from_secs(1));
        assert_eq!(src.frequency_hz(), 60.0);
    }
}
