//! Post-hoc continuity estimate from persisted timestamps.
//!
//! The dropped-sample count is a heuristic: an interval longer than 1.5x the
//! expected interval is a gap, and each gap contributes
//! `round(interval / expected) - 1` missing samples. It is an estimate, not a
//! ground-truth count.

use std::fmt;
use std::path::Path;

use contracts::{ContractError, FileFormat};
use serde::Serialize;
use tracing::debug;

use crate::writer::{read_csv_timestamps, read_sqlite_timestamps};

/// Tolerated jitter before an interval counts as a gap
const GAP_FACTOR: f64 = 1.5;

/// Result of a continuity scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinuityReport {
    pub total_samples: u64,
    /// Estimated number of samples missing from the recording
    pub dropped_samples: u64,
    /// Number of intervals flagged as gaps
    pub gaps: u64,
    pub expected_interval_us: f64,
    pub max_interval_us: i64,
}

impl ContinuityReport {
    /// Estimated share of samples lost, in percent
    pub fn loss_percent(&self) -> f64 {
        let expected = self.total_samples + self.dropped_samples;
        if expected == 0 {
            0.0
        } else {
            self.dropped_samples as f64 / expected as f64 * 100.0
        }
    }
}

impl fmt::Display for ContinuityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} samples, ~{} dropped ({:.2}%) across {} gaps (max interval {} µs, expected {:.0} µs)",
            self.total_samples,
            self.dropped_samples,
            self.loss_percent(),
            self.gaps,
            self.max_interval_us,
            self.expected_interval_us
        )
    }
}

/// Scan µs timestamps recorded at `frequency_hz`
///
/// Returns `None` with fewer than two timestamps.
pub fn analyze_timestamps(timestamps: &[i64], frequency_hz: f64) -> Option<ContinuityReport> {
    if timestamps.len() < 2 || !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return None;
    }
    let expected = 1_000_000.0 / frequency_hz;
    let threshold = expected * GAP_FACTOR;

    let mut report = ContinuityReport {
        total_samples: timestamps.len() as u64,
        dropped_samples: 0,
        gaps: 0,
        expected_interval_us: expected,
        max_interval_us: 0,
    };

    for pair in timestamps.windows(2) {
        let interval = pair[1] - pair[0];
        report.max_interval_us = report.max_interval_us.max(interval);
        if interval as f64 > threshold {
            report.gaps += 1;
            let missing = (interval as f64 / expected).round() as u64;
            report.dropped_samples += missing.saturating_sub(1);
        }
    }
    Some(report)
}

/// Scan the full timestamp column of a persisted recording
pub fn analyze_file(
    path: &Path,
    frequency_hz: f64,
) -> Result<Option<ContinuityReport>, ContractError> {
    let timestamps = match FileFormat::from_path(path)? {
        FileFormat::Csv => read_csv_timestamps(path)?,
        FileFormat::Table => read_sqlite_timestamps(path)?,
    };
    debug!(path = %path.display(), rows = timestamps.len(), "Timestamps loaded");
    Ok(analyze_timestamps(&timestamps, frequency_hz))
}
