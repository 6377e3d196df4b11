//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `RecorderBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("recorder.toml")).unwrap();
//! println!("Surface: {}x{}", blueprint.surface.width_px, blueprint.surface.height_px);
//! ```

mod parser;
mod validator;

pub use contracts::RecorderBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<RecorderBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<RecorderBlueprint, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an already-built blueprint
    pub fn validate(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    /// Serialize RecorderBlueprint to TOML string
    pub fn to_toml(blueprint: &RecorderBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize RecorderBlueprint to JSON string
    pub fn to_json(blueprint: &RecorderBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<RecorderBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AggregationMethod, RollingWindow, SchemaVariant};

    const MINIMAL_TOML: &str = r#"
[surface]
width_px = 1920
height_px = 1080
units = "height"

[recording]
output = "session.csv"
schema = "raw"

[rolling]
window = { samples = 12 }
method = "last"

[calibration]
points = [{ x = -0.4, y = 0.4 }, { x = 0.4, y = -0.4 }]
focus_time_ms = 250
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.surface.height_px, 1080);
        assert_eq!(bp.calibration.points.len(), 2);
        assert_eq!(bp.calibration.focus_time_ms, 250);
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.surface, bp2.surface);
        assert_eq!(bp2.recording.schema, SchemaVariant::Raw);
        let rolling = bp2.rolling.unwrap();
        assert_eq!(rolling.window, RollingWindow::Samples(12));
        assert_eq!(rolling.method, AggregationMethod::Last);
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.surface, bp2.surface);
        assert_eq!(bp.calibration.points, bp2.calibration.points);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[surface]
width_px = 1920
height_px = 1080
units = "height"

[recording]
output = "session.txt"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("recording.output"));
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recorder.toml");
        std::fs::write(&path, MINIMAL_TOML).unwrap();
        assert!(ConfigLoader::load_from_path(&path).is_ok());

        let bad = dir.path().join("recorder.yaml");
        std::fs::write(&bad, MINIMAL_TOML).unwrap();
        assert!(matches!(
            ConfigLoader::load_from_path(&bad),
            Err(ContractError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_sample_config_is_valid() {
        let blueprint =
            ConfigLoader::load_from_str(include_str!("../../../recorder.toml"), ConfigFormat::Toml)
                .unwrap();
        assert_eq!(blueprint.calibration.points.len(), 5);
        assert!(matches!(
            blueprint.rolling.map(|r| r.window),
            Some(RollingWindow::DurationMs(_))
        ));
    }
}
