//! Replay source - 从录制文件回放注视数据
//!
//! 读取 JSONL 文件 (每行一个 `GazeSample`)，
//! 按原始时间戳间隔回放，可设置速度倍率。

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use contracts::{ContractError, GazeCallback, GazeSample, GazeSource, SourceKind};
use tracing::{debug, info};

use crate::worker::{sleep_until, Producer};

/// Replay 配置
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// 回放速度倍率 (1.0 = 原速)
    pub speed_multiplier: f64,

    /// 采样率 (None = 从时间戳估计)
    pub frequency_hz: Option<f64>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            frequency_hz: None,
        }
    }
}

/// Replays recorded samples through the `GazeSource` interface
///
/// The clock follows the recording: it reads the first recorded timestamp
/// plus the (speed-scaled) time since playback started.
pub struct ReplayGazeSource {
    name: String,
    samples: Arc<Vec<GazeSample>>,
    speed: f64,
    frequency_bits: AtomicU64,
    playback_started: Arc<Mutex<Option<Instant>>>,
    producer: Producer,
}

impl std::fmt::Debug for ReplayGazeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayGazeSource")
            .field("name", &self.name)
            .field("samples", &self.samples.len())
            .field("speed", &self.speed)
            .finish()
    }
}

impl ReplayGazeSource {
    /// 从 JSONL 文件加载
    pub fn load(path: &Path, config: ReplayConfig) -> Result<Self, ContractError> {
        let read_err =
            |message: String| ContractError::sink_read(path.display().to_string(), message);
        let file = File::open(path).map_err(|e| read_err(e.to_string()))?;

        let mut samples = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let sample: GazeSample = serde_json::from_str(&line)
                .map_err(|e| read_err(format!("line {}: {e}", lineno + 1)))?;
            samples.push(sample);
        }

        // 按时间戳排序
        samples.sort_by_key(|s| s.system_time_stamp);

        info!(path = %path.display(), samples = samples.len(), "Loaded replay source");
        Ok(Self::from_samples(samples, config))
    }

    /// 直接从内存中的采样构建
    pub fn from_samples(samples: Vec<GazeSample>, config: ReplayConfig) -> Self {
        let frequency_hz = config
            .frequency_hz
            .unwrap_or_else(|| estimate_frequency(&samples));
        Self {
            name: "replay".to_string(),
            samples: Arc::new(samples),
            speed: config.speed_multiplier.max(0.1),
            frequency_bits: AtomicU64::new(frequency_hz.to_bits()),
            playback_started: Arc::new(Mutex::new(None)),
            producer: Producer::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn first_timestamp(&self) -> i64 {
        self.samples.first().map_or(0, |s| s.system_time_stamp)
    }
}

/// Mean rate over the recording; 0 with fewer than two samples
fn estimate_frequency(samples: &[GazeSample]) -> f64 {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) if last.system_time_stamp > first.system_time_stamp => {
            let span_s = (last.system_time_stamp - first.system_time_stamp) as f64 / 1e6;
            (samples.len() - 1) as f64 / span_s
        }
        _ => 0.0,
    }
}

impl GazeSource for ReplayGazeSource {
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
                "frequency_hz",
                format!("must be positive, got {hz}"),
            ));
        }
        self.frequency_bits.store(hz.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    fn system_time_us(&self) -> i64 {
        let started = *self
            .playback_started
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let offset = started.map_or(0.0, |t| t.elapsed().as_micros() as f64 * self.speed);
        self.first_timestamp() + offset as i64
    }

    fn subscribe(&self, callback: GazeCallback) {
        let samples = Arc::clone(&self.samples);
        let speed = self.speed;
        let playback_started = Arc::clone(&self.playback_started);

        self.producer.start(&self.name, move |ctx| {
            let Some(first) = samples.first().map(|s| s.system_time_stamp) else {
                ctx.fail("no samples to replay");
                return;
            };
            let start = Instant::now();
            *playback_started
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(start);
            debug!(samples = samples.len(), speed, "Replay thread started");

            for sample in samples.iter() {
                if !ctx.running() {
                    debug!("Replay stopped");
                    break;
                }
                // 计算等待时间
                let offset_us = (sample.system_time_stamp - first) as f64 / speed;
                sleep_until(start + Duration::from_micros(offset_us.max(0.0) as u64));

                if !ctx.deliver(&callback, sample.clone()) {
                    break;
                }
            }

            info!("Replay completed");
            ctx.finish();
        });
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
    use crate::simulated_sample;
    use contracts::{EyeData, Point2};
    use std::io::Write;
    use std::thread;
    use tempfile::NamedTempFile;

    fn recording(n: i64, step: i64) -> Vec<GazeSample> {
        (0..n)
            .map(|i| simulated_sample(Point2::new(0.5, 0.5), 1_000_000 + i * step))
            .collect()
    }

    #[test]
    fn test_load_jsonl_and_estimate_rate() {
        let mut file = NamedTempFile::new().unwrap();
        for s in recording(5, 10_000).iter().rev() {
            writeln!(file, "{}", serde_json::to_string(s).unwrap()).unwrap();
        }
        writeln!(file).unwrap();

        let src = ReplayGazeSource::load(file.path(), ReplayConfig::default()).unwrap();
        assert_eq!(src.len(), 5);
        assert!((src.frequency_hz() - 100.0).abs() < 1e-9);
        assert_eq!(src.system_time_us(), 1_000_000);
    }

    #[test]
    fn test_load_recording_with_blink() {
        let mut samples = recording(3, 10_000);
        samples[1].left = EyeData::invalid();
        samples[1].right = EyeData::invalid();
        let mut file = NamedTempFile::new().unwrap();
        for s in &samples {
            writeln!(file, "{}", serde_json::to_string(s).unwrap()).unwrap();
        }

        let src = ReplayGazeSource::load(
            file.path(),
            ReplayConfig {
                speed_multiplier: 4.0,
                frequency_hz: None,
            },
        )
        .unwrap();
        assert_eq!(src.len(), 3);

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        src.subscribe(Arc::new(move |s: GazeSample| sink.lock().unwrap().push(s)));
        let deadline = Instant::now() + Duration::from_secs(2);
        while src.is_streaming() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        assert!(src.unsubscribe(Duration::from_secs(1)));

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 3);
        assert!(received[0].left.gaze_point_on_display_area.is_valid());
        assert!(!received[1].left.gaze_point_on_display_area.is_valid());
        assert!(!received[1].right.gaze_point_validity);
        assert!(received[1].right.pupil_diameter.is_nan());
    }

    #[test]
    fn test_bad_line_reports_position() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{not json").unwrap();
        let err = ReplayGazeSource::load(file.path(), ReplayConfig::default()).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_replay_delivers_in_order() {
        let src = ReplayGazeSource::from_samples(
            recording(20, 1_000),
            ReplayConfig {
                speed_multiplier: 4.0,
                frequency_hz: Some(1000.0),
            },
        );
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        src.subscribe(Arc::new(move |s: GazeSample| {
            sink.lock().unwrap().push(s.system_time_stamp)
        }));

        let deadline = Instant::now() + Duration::from_secs(2);
        while src.is_streaming() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        assert!(src.unsubscribe(Duration::from_secs(1)));

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 20);
        assert!(received.windows(2).all(|w| w[0] < w[1]));
        assert!(src.system_time_us() >= 1_000_000);
    }

    #[test]
    fn test_empty_replay_faults() {
        let src = ReplayGazeSource::from_samples(Vec::new(), ReplayConfig::default());
        src.subscribe(Arc::new(|_| {}));
        assert!(src.unsubscribe(Duration::from_secs(1)));
        assert_eq!(src.fault().as_deref(), Some("no samples to replay"));
    }
}
