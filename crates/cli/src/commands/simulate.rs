//! `simulate` command implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::SimulateArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `simulate` command
pub async fn run_simulate(args: &SimulateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref output) = args.output {
        info!(output = %output.display(), "Overriding output file from CLI");
        blueprint.recording.output = Some(output.clone());
        config_loader::ConfigLoader::validate(&blueprint)
            .context("Output override is not a supported file type")?;
    }

    info!(
        width = blueprint.surface.width_px,
        height = blueprint.surface.height_px,
        units = %blueprint.surface.units,
        frequency_hz = blueprint.simulation.frequency_hz,
        rolling = blueprint.rolling.is_some(),
        "Configuration loaded"
    );

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        blueprint,
        duration: seconds(args.duration),
        event_interval: seconds(args.event_interval),
        save_interval: seconds(args.save_interval),
        calibrate: args.calibrate,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
        replay_path: args.replay.clone(),
        replay_speed: args.replay_speed,
    };

    let pipeline = Pipeline::new(pipeline_config);
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);

    info!("Starting recording pipeline...");
    let mut handle = tokio::task::spawn_blocking(move || pipeline.run(flag));

    // A signal only raises the flag; the pipeline stops and flushes itself
    let joined = tokio::select! {
        joined = &mut handle => joined,
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping recording...");
            shutdown.store(true, Ordering::SeqCst);
            handle.await
        }
    };

    let stats = joined
        .context("Pipeline thread panicked")?
        .context("Pipeline execution failed")?;

    if let Some(summary) = &stats.summary {
        info!(
            rows = summary.rows_written,
            events = summary.events_written,
            duration_secs = summary.duration.as_secs_f64(),
            rate = format!("{:.2}", summary.sample_rate()),
            "Recording completed successfully"
        );
    }
    stats.print_summary();

    info!("Gaze Recorder finished");
    Ok(())
}

/// `None` for zero or negative values
fn seconds(value: f64) -> Option<Duration> {
    (value.is_finite() && value > 0.0).then(|| Duration::from_secs_f64(value))
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds() {
        assert_eq!(seconds(0.0), None);
        assert_eq!(seconds(-1.0), None);
        assert_eq!(seconds(1.5), Some(Duration::from_millis(1500)));
    }
}
