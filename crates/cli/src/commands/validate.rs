//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{RecorderBlueprint, Units};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    surface: String,
    units: String,
    output: String,
    schema: String,
    frequency_hz: f64,
    rolling: bool,
    calibration_points: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    surface: format!(
                        "{}x{}",
                        blueprint.surface.width_px, blueprint.surface.height_px
                    ),
                    units: blueprint.surface.units.to_string(),
                    output: blueprint
                        .recording
                        .output
                        .as_ref()
                        .map_or_else(|| "(timestamped .csv)".to_string(), |p| {
                            p.display().to_string()
                        }),
                    schema: blueprint.recording.schema.as_str().to_string(),
                    frequency_hz: blueprint.simulation.frequency_hz,
                    rolling: blueprint.rolling.is_some(),
                    calibration_points: blueprint.calibration.points.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &RecorderBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.recording.output.is_none() {
        warnings.push(
            "recording.output not set - each session writes a new timestamped .csv".to_string(),
        );
    }

    if blueprint.rolling.is_none() {
        warnings.push("No rolling window configured - gaze queries are unavailable".to_string());
    }

    if blueprint.calibration.file.is_none() {
        warnings.push("calibration.file not set - calibrations are not persisted".to_string());
    }

    if blueprint.calibration.units.is_none() && blueprint.surface.units == Units::Pixel {
        warnings.push(
            "calibration points use pixel units - they will not follow a resolution change"
                .to_string(),
        );
    }

    if blueprint.recording.stop_timeout_ms == 0 {
        warnings.push(
            "recording.stop_timeout_ms is 0 - the producer is never waited for".to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Surface: {} ({})", summary.surface, summary.units);
            println!("  Output: {} ({} schema)", summary.output, summary.schema);
            println!("  Sampling: {} Hz", summary.frequency_hz);
            println!("  Rolling window: {}", if summary.rolling { "yes" } else { "no" });
            println!("  Calibration points: {}", summary.calibration_points);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
