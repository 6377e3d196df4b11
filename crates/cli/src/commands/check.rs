//! `check` command implementation.

use anyhow::{Context, Result};
use persistence::ContinuityReport;
use serde::Serialize;
use tracing::info;

use crate::cli::CheckArgs;

/// Check result for JSON output
#[derive(Serialize)]
struct CheckResult {
    file: String,
    frequency_hz: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ContinuityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    loss_percent: Option<f64>,
}

/// Execute the `check` command
pub fn run_check(args: &CheckArgs) -> Result<()> {
    info!(file = %args.file.display(), frequency_hz = args.frequency, "Checking recording");

    if !args.file.exists() {
        anyhow::bail!("Recording not found: {}", args.file.display());
    }
    if !args.frequency.is_finite() || args.frequency <= 0.0 {
        anyhow::bail!("Frequency must be positive, got {}", args.frequency);
    }

    let report = persistence::analyze_file(&args.file, args.frequency)
        .with_context(|| format!("Failed to analyze {}", args.file.display()))?;

    let result = CheckResult {
        file: args.file.display().to_string(),
        frequency_hz: args.frequency,
        loss_percent: report.as_ref().map(ContinuityReport::loss_percent),
        report,
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&result).context("Failed to serialize check result")?;
        println!("{}", json);
    } else {
        print_check_result(&result);
    }
    Ok(())
}

fn print_check_result(result: &CheckResult) {
    match &result.report {
        Some(report) => {
            let mark = if report.gaps == 0 { "✓" } else { "⚠" };
            println!("{} {}", mark, result.file);
            println!("\n  Expected rate: {} Hz", result.frequency_hz);
            println!("  Samples: {}", report.total_samples);
            println!("  Gaps: {}", report.gaps);
            println!(
                "  Dropped samples: ~{} ({:.2}%)",
                report.dropped_samples,
                report.loss_percent()
            );
            println!("  Max interval: {} µs", report.max_interval_us);
        }
        None => {
            println!("✗ {}", result.file);
            println!("\n  Fewer than two samples, nothing to analyze");
        }
    }
}
