//! Session summary reported by `stop`.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use contracts::FileFormat;
use observability::MetricsSummary;
use persistence::ContinuityReport;

/// What one recording produced
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub output: PathBuf,
    pub format: FileFormat,

    /// From start to the end of the final flush
    pub duration: Duration,

    pub rows_written: u64,
    pub events_written: u64,

    /// Number of flushes, including the final one
    pub saves: u64,

    /// Continuity scan of the whole file, when enabled and data was written
    pub continuity: Option<ContinuityReport>,

    /// The producer faulted before `stop`; the recording ends early
    pub truncated: bool,

    /// Producer error message, if any
    pub fault: Option<String>,

    /// Save batch and latency statistics
    pub metrics: MetricsSummary,
}

impl SessionSummary {
    /// Rows per second of recording
    pub fn sample_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.rows_written as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Recording Summary ===")?;
        writeln!(f, "  output:      {} ({:?})", self.output.display(), self.format)?;
        writeln!(f, "  duration:    {:.2}s", self.duration.as_secs_f64())?;
        writeln!(
            f,
            "  rows:        {} ({:.1}/s)",
            self.rows_written,
            self.sample_rate()
        )?;
        writeln!(f, "  events:      {}", self.events_written)?;
        writeln!(f, "  saves:       {}", self.saves)?;
        match &self.continuity {
            Some(report) => writeln!(f, "  continuity:  {report}")?,
            None => writeln!(f, "  continuity:  not analyzed")?,
        }
        if self.truncated {
            writeln!(
                f,
                "  TRUNCATED:   {}",
                self.fault.as_deref().unwrap_or("producer stopped early")
            )?;
        }
        write!(f, "{}", self.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use observability::SessionMetricsAggregator;

    fn summary(truncated: bool) -> SessionSummary {
        SessionSummary {
            output: PathBuf::from("out.csv"),
            format: FileFormat::Csv,
            duration: Duration::from_secs(2),
            rows_written: 240,
            events_written: 2,
            saves: 1,
            continuity: None,
            truncated,
            fault: truncated.then(|| "pointer unavailable".to_string()),
            metrics: SessionMetricsAggregator::new().summary(),
        }
    }

    #[test]
    fn test_sample_rate() {
        assert!((summary(false).sample_rate() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_display_flags_truncation() {
        let text = summary(true).to_string();
        assert!(text.contains("out.csv"));
        assert!(text.contains("TRUNCATED:   pointer unavailable"));
        assert!(!summary(false).to_string().contains("TRUNCATED"));
    }
}
