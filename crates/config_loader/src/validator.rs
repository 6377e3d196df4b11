//! 配置校验模块
//!
//! 校验规则：
//! - surface 像素尺寸 > 0
//! - 物理单位 (cm / deg) 需要 monitor 配置
//! - frequency_hz > 0
//! - rolling 窗口 > 0
//! - 校准点数量 2..=9 且位于屏幕内
//! - 输出文件扩展名受支持

use contracts::{ContractError, FileFormat, RecorderBlueprint, RollingWindow};
use coords::SurfaceTransform;

/// 校验 RecorderBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    validate_surface(blueprint)?;
    validate_simulation(blueprint)?;
    validate_rolling(blueprint)?;
    validate_calibration(blueprint)?;
    validate_recording(blueprint)?;
    Ok(())
}

/// 校验屏幕尺寸与单位
fn validate_surface(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    let surface = &blueprint.surface;
    if surface.width_px == 0 || surface.height_px == 0 {
        return Err(ContractError::config_validation(
            "surface.width_px / surface.height_px",
            format!(
                "surface size must be > 0, got {}x{}",
                surface.width_px, surface.height_px
            ),
        ));
    }

    if surface.units.is_physical() {
        let Some(monitor) = &surface.monitor else {
            return Err(ContractError::config_validation(
                "surface.monitor",
                format!("units '{}' need a monitor profile", surface.units),
            ));
        };
        if monitor.width_cm <= 0.0 || monitor.distance_cm <= 0.0 || monitor.width_px == 0 {
            return Err(ContractError::config_validation(
                "surface.monitor",
                "width_cm, distance_cm and width_px must be > 0",
            ));
        }
    }
    Ok(())
}

/// 校验模拟采样率
fn validate_simulation(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    let hz = blueprint.simulation.frequency_hz;
    if !hz.is_finite() || hz <= 0.0 {
        return Err(ContractError::config_validation(
            "simulation.frequency_hz",
            format!("frequency_hz must be > 0, got {hz}"),
        ));
    }
    Ok(())
}

/// 校验滚动窗口
fn validate_rolling(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    let Some(rolling) = &blueprint.rolling else {
        return Ok(());
    };
    match rolling.window {
        RollingWindow::Samples(0) => Err(ContractError::config_validation(
            "rolling.window.samples",
            "rolling window must hold at least 1 sample",
        )),
        RollingWindow::DurationMs(ms) if !ms.is_finite() || ms <= 0.0 => {
            Err(ContractError::config_validation(
                "rolling.window.duration_ms",
                format!("rolling window must be > 0 ms, got {ms}"),
            ))
        }
        _ => Ok(()),
    }
}

/// 校验校准点
fn validate_calibration(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    let calibration = &blueprint.calibration;
    let count = calibration.points.len();
    if !(2..=9).contains(&count) {
        return Err(ContractError::config_validation(
            "calibration.points",
            format!("calibration needs 2 to 9 points, got {count}"),
        ));
    }

    let transform = SurfaceTransform::new(blueprint.surface);
    let units = calibration.units.unwrap_or(blueprint.surface.units);
    for (idx, point) in calibration.points.iter().enumerate() {
        let field = format!("calibration.points[{idx}]");
        let hardware = transform
            .to_hardware_from(*point, units)
            .map_err(|e| ContractError::config_validation(&field, e.to_string()))?;
        let inside = (0.0..=1.0).contains(&hardware.x) && (0.0..=1.0).contains(&hardware.y);
        if !inside {
            return Err(ContractError::config_validation(
                field,
                format!("point ({}, {}) {units} lies outside the surface", point.x, point.y),
            ));
        }
    }
    Ok(())
}

/// 校验输出文件
fn validate_recording(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    if let Some(output) = &blueprint.recording.output {
        FileFormat::from_path(output)
            .map_err(|e| ContractError::config_validation("recording.output", e.to_string()))?;
    }
    Ok(())
}
