//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{AnimationSettings, Point2, RecorderBlueprint, RollingWindow, UiSizes};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    surface: SurfaceInfo,
    recording: RecordingInfo,
    simulation: SimulationInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    rolling: Option<RollingInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    calibration: Option<CalibrationInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ui: Option<UiInfo>,
}

#[derive(Serialize)]
struct SurfaceInfo {
    width_px: u32,
    height_px: u32,
    units: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    monitor: Option<String>,
}

#[derive(Serialize)]
struct RecordingInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    schema: String,
    analyze_continuity: bool,
    stabilization_ms: u64,
    stop_timeout_ms: u64,
    catch_up_timeout_ms: u64,
}

#[derive(Serialize)]
struct SimulationInfo {
    frequency_hz: f64,
    jitter_us: u64,
}

#[derive(Serialize)]
struct RollingInfo {
    window: String,
    method: String,
    on_missing: String,
}

#[derive(Serialize)]
struct CalibrationInfo {
    points: Vec<Point2>,
    units: String,
    focus_time_ms: u64,
    samples_per_point: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
}

#[derive(Serialize)]
struct UiInfo {
    animation: AnimationSettings,
    sizes: UiSizes,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn window_description(window: &RollingWindow) -> String {
    match window {
        RollingWindow::Samples(n) => format!("{n} samples"),
        RollingWindow::DurationMs(ms) => format!("{ms} ms"),
    }
}

fn calibration_units(blueprint: &RecorderBlueprint) -> String {
    blueprint
        .calibration
        .units
        .unwrap_or(blueprint.surface.units)
        .to_string()
}

fn build_config_info(blueprint: &RecorderBlueprint, args: &InfoArgs) -> ConfigInfo {
    let surface = &blueprint.surface;
    let recording = &blueprint.recording;

    let calibration = args.calibration.then(|| CalibrationInfo {
        points: blueprint.calibration.points.clone(),
        units: calibration_units(blueprint),
        focus_time_ms: blueprint.calibration.focus_time_ms,
        samples_per_point: blueprint.calibration.samples_per_point,
        file: blueprint
            .calibration
            .file
            .as_ref()
            .map(|p| p.display().to_string()),
    });

    let ui = args.ui.then(|| UiInfo {
        animation: blueprint.ui.animation.clone(),
        sizes: blueprint.ui.sizes.clone(),
    });

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        surface: SurfaceInfo {
            width_px: surface.width_px,
            height_px: surface.height_px,
            units: surface.units.to_string(),
            monitor: surface.monitor.map(|m| {
                format!(
                    "{} cm wide at {} cm, {} px",
                    m.width_cm, m.distance_cm, m.width_px
                )
            }),
        },
        recording: RecordingInfo {
            output: recording.output.as_ref().map(|p| p.display().to_string()),
            schema: recording.schema.as_str().to_string(),
            analyze_continuity: recording.analyze_continuity,
            stabilization_ms: recording.stabilization_ms,
            stop_timeout_ms: recording.stop_timeout_ms,
            catch_up_timeout_ms: recording.catch_up_timeout_ms,
        },
        simulation: SimulationInfo {
            frequency_hz: blueprint.simulation.frequency_hz,
            jitter_us: blueprint.simulation.jitter_us,
        },
        rolling: blueprint.rolling.as_ref().map(|r| RollingInfo {
            window: window_description(&r.window),
            method: format!("{:?}", r.method),
            on_missing: format!("{:?}", r.on_missing),
        }),
        calibration,
        ui,
    }
}

fn print_config_info(blueprint: &RecorderBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Gaze Recorder Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Surface
    let surface = &blueprint.surface;
    println!("🖥️  Surface");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Size: {}x{} px", surface.width_px, surface.height_px);
    match &surface.monitor {
        Some(m) => {
            println!("   ├─ Units: {}", surface.units);
            println!(
                "   └─ Monitor: {} cm wide at {} cm ({} px)",
                m.width_cm, m.distance_cm, m.width_px
            );
        }
        None => {
            println!("   └─ Units: {}", surface.units);
        }
    }

    // Recording
    let recording = &blueprint.recording;
    println!("\n📼 Recording");
    match &recording.output {
        Some(path) => println!("   ├─ Output: {}", path.display()),
        None => println!("   ├─ Output: (timestamped .csv)"),
    }
    println!("   ├─ Schema: {}", recording.schema.as_str());
    println!(
        "   ├─ Sampling: {} Hz (jitter {} µs)",
        blueprint.simulation.frequency_hz, blueprint.simulation.jitter_us
    );
    println!(
        "   ├─ Continuity scan: {}",
        if recording.analyze_continuity { "on" } else { "off" }
    );
    println!(
        "   └─ Timeouts: stabilization {} ms, stop {} ms, catch-up {} ms",
        recording.stabilization_ms, recording.stop_timeout_ms, recording.catch_up_timeout_ms
    );

    // Rolling window
    match &blueprint.rolling {
        Some(rolling) => {
            println!("\n👁️  Rolling Gaze");
            println!("   ├─ Window: {}", window_description(&rolling.window));
            println!("   ├─ Method: {:?}", rolling.method);
            println!("   └─ On missing: {:?}", rolling.on_missing);
        }
        None => println!("\n👁️  Rolling Gaze: disabled"),
    }

    // Calibration
    let calibration = &blueprint.calibration;
    println!("\n🎯 Calibration ({} points)", calibration.points.len());
    if args.calibration {
        for (i, point) in calibration.points.iter().enumerate() {
            println!("   ├─ #{}: ({:.3}, {:.3})", i, point.x, point.y);
        }
        println!("   ├─ Units: {}", calibration_units(blueprint));
        println!(
            "   ├─ Focus time: {} ms, {} samples/point",
            calibration.focus_time_ms, calibration.samples_per_point
        );
    }
    match &calibration.file {
        Some(path) => println!("   └─ File: {}", path.display()),
        None => println!("   └─ File: (not persisted)"),
    }

    // UI
    if args.ui {
        let animation = &blueprint.ui.animation;
        let sizes = &blueprint.ui.sizes;
        println!("\n🎨 UI (height units)");
        println!(
            "   ├─ Zoom: {} → {} at speed {}",
            animation.max_zoom_size, animation.min_zoom_size, animation.zoom_speed
        );
        println!(
            "   ├─ Trill: size {}, ±{}° at {} Hz, {}s of every {}s",
            animation.trill_size,
            animation.trill_rotation_range,
            animation.trill_frequency,
            animation.trill_active_duration,
            animation.trill_cycle_duration
        );
        println!(
            "   └─ Sizes: marker {}, target {}, highlight {}, line {}, border {}, text {}",
            sizes.marker,
            sizes.target_circle,
            sizes.highlight,
            sizes.line_width,
            sizes.border,
            sizes.text
        );
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SurfaceGeometry, Units};
    use std::path::PathBuf;

    fn args(calibration: bool, ui: bool) -> InfoArgs {
        InfoArgs {
            config: PathBuf::from("recorder.toml"),
            json: true,
            calibration,
            ui,
        }
    }

    #[test]
    fn test_sections_follow_flags() {
        let blueprint =
            RecorderBlueprint::for_surface(SurfaceGeometry::new(1280, 1024, Units::Pixel));
        let info = build_config_info(&blueprint, &args(false, false));
        assert!(info.calibration.is_none());
        assert!(info.ui.is_none());

        let info = build_config_info(&blueprint, &args(true, true));
        let calibration = info.calibration.unwrap();
        assert_eq!(calibration.points.len(), 5);
        assert_eq!(calibration.units, "height");
        assert!(info.ui.is_some());
    }

    #[test]
    fn test_window_description() {
        assert_eq!(window_description(&RollingWindow::Samples(12)), "12 samples");
        assert_eq!(window_description(&RollingWindow::DurationMs(100.0)), "100 ms");
    }
}
