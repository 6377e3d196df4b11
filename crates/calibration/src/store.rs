//! Calibration blob persistence.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use contracts::{CalibrationBackend, ContractError};
use tracing::info;

/// `<YYYY-MM-DD_HH-MM-SS>_calibration.dat`
pub fn default_calibration_path(now: &DateTime<Local>) -> PathBuf {
    PathBuf::from(format!(
        "{}_calibration.dat",
        now.format("%Y-%m-%d_%H-%M-%S")
    ))
}

/// Write the backend's applied calibration to `path` (or the default name).
pub fn save_calibration(
    backend: &dyn CalibrationBackend,
    path: Option<&Path>,
) -> Result<PathBuf, ContractError> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_calibration_path(&Local::now()));
    let blob = backend.retrieve()?;
    if blob.is_empty() {
        return Err(ContractError::calibration_file(
            path.display().to_string(),
            "no calibration data available",
        ));
    }

    let write_err = |e: std::io::Error| {
        ContractError::calibration_file(path.display().to_string(), e.to_string())
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(&path, &blob).map_err(write_err)?;
    info!(path = %path.display(), bytes = blob.len(), "Calibration saved");
    Ok(path)
}

/// Read a calibration blob and apply it to the backend.
pub fn load_calibration(
    backend: &mut dyn CalibrationBackend,
    path: &Path,
) -> Result<(), ContractError> {
    let name = path.display().to_string();
    if !path.exists() {
        return Err(ContractError::calibration_file(name, "file not found"));
    }
    let blob = fs::read(path).map_err(|e| ContractError::calibration_file(&name, e.to_string()))?;
    if blob.is_empty() {
        return Err(ContractError::calibration_file(name, "file is empty"));
    }

    backend
        .apply(&blob)
        .map_err(|e| ContractError::calibration_file(&name, format!("unreadable: {e}")))?;
    info!(path = %name, bytes = blob.len(), "Calibration loaded");
    Ok(())
}
