//! Pipeline statistics and summary output.

use gaze_source::DeviceInfo;
use session::SessionSummary;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Summary of the recording (None if it never started)
    pub summary: Option<SessionSummary>,

    /// Tracker the run was connected to
    pub device: Option<DeviceInfo>,

    /// Events inserted by the pipeline
    pub events_recorded: u64,

    /// Rolling gaze queries issued
    pub gaze_queries: u64,

    /// Queries that found no valid gaze
    pub gaze_missing: u64,

    /// Calibration outcome, when calibration ran
    pub calibration: Option<bool>,
}

impl PipelineStats {
    /// Share of gaze queries without valid data, in percent
    pub fn missing_rate(&self) -> f64 {
        if self.gaze_queries > 0 {
            (self.gaze_missing as f64 / self.gaze_queries as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Recording Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        if let Some(device) = &self.device {
            println!("🔌 Device");
            println!("   ├─ Model: {}", device.model);
            println!("   ├─ Serial: {}", device.serial_number);
            println!("   └─ Address: {}", device.address);
        }

        match &self.summary {
            Some(summary) => {
                println!("\n📊 Overview");
                println!("   ├─ Output: {} ({:?})", summary.output.display(), summary.format);
                println!("   ├─ Duration: {:.2}s", summary.duration.as_secs_f64());
                println!("   ├─ Rows written: {}", summary.rows_written);
                println!("   ├─ Sample rate: {:.2}/s", summary.sample_rate());
                println!("   ├─ Events written: {}", summary.events_written);
                println!("   └─ Saves: {}", summary.saves);

                let metrics = &summary.metrics;
                println!("\n📈 Save Metrics");
                println!("   ├─ Empty saves: {}", metrics.empty_saves);
                println!(
                    "   ├─ Batch rows: mean {:.1}, max {:.0}",
                    metrics.batch_rows.mean, metrics.batch_rows.max
                );
                println!(
                    "   └─ Save latency (ms): mean {:.2}, max {:.2}",
                    metrics.save_latency_ms.mean, metrics.save_latency_ms.max
                );

                if let Some(report) = &summary.continuity {
                    println!("\n🔍 Continuity");
                    println!("   ├─ Gaps: {}", report.gaps);
                    println!(
                        "   ├─ Dropped samples: {} ({:.2}%)",
                        report.dropped_samples,
                        report.loss_percent()
                    );
                    println!("   └─ Max interval: {} µs", report.max_interval_us);
                }

                if summary.truncated {
                    println!(
                        "\n⚠️  Recording truncated: {}",
                        summary.fault.as_deref().unwrap_or("producer stopped early")
                    );
                }
            }
            None => println!("\n⚠️  No recording summary"),
        }

        println!("\n🎯 Session");
        println!("   ├─ Events inserted: {}", self.events_recorded);
        println!(
            "   ├─ Gaze queries: {} ({:.2}% missing)",
            self.gaze_queries,
            self.missing_rate()
        );
        match self.calibration {
            Some(true) => println!("   └─ Calibration: success"),
            Some(false) => println!("   └─ Calibration: not successful"),
            None => println!("   └─ Calibration: skipped"),
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_rate() {
        let stats = PipelineStats {
            gaze_queries: 200,
            gaze_missing: 50,
            ..Default::default()
        };
        assert!((stats.missing_rate() - 25.0).abs() < 1e-9);
        assert_eq!(PipelineStats::default().missing_rate(), 0.0);
    }
}
