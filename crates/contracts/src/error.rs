//! Layered error definitions
//!
//! Categorized by how the caller is expected to react:
//! usage / configuration / resource / data integrity / persistence

use thiserror::Error;

/// Coarse classification of a [`ContractError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Recoverable API misuse, normally reported as a warning and ignored
    Usage,
    /// The call itself is malformed and fails
    Configuration,
    /// A required resource (device, file) is unavailable
    Resource,
    /// Recorded data is incomplete or suspicious
    DataIntegrity,
    /// Writing or reading recorded data failed
    Persistence,
}

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Usage Errors =====
    /// An operation that needs an active recording was called while idle
    #[error("not recording: {operation} requires an active recording session")]
    NotRecording { operation: String },

    /// A setting that is frozen while data is streaming was changed
    #[error("cannot {operation} while recording is active")]
    WhileRecording { operation: String },

    /// Something that may be configured only once was configured again
    #[error("{what} is already configured")]
    AlreadyConfigured { what: String },

    // ===== Configuration Errors =====
    /// Coordinate unit tag not understood
    #[error("unit ({unit}) is not supported")]
    UnsupportedUnit { unit: String },

    /// Output file extension not understood
    #[error("unsupported file format '{extension}' for {path}: use .csv, .db or .sqlite")]
    UnsupportedFormat { path: String, extension: String },

    /// Physical/angular units were requested without a monitor profile
    #[error("units '{unit}' need a monitor profile (width_cm, distance_cm) on the surface")]
    MissingMonitor { unit: String },

    /// Rolling buffer size was zero or negative
    #[error("invalid rolling buffer size: {message}")]
    InvalidBufferSize { message: String },

    /// Rolling buffer queried before configuration
    #[error("{what} is not configured: {remedy}")]
    NotConfigured { what: String, remedy: String },

    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Calibration point list is outside the supported range
    #[error("calibration points must be between 2 and 9, got {count}")]
    CalibrationPoints { count: usize },

    // ===== Resource Errors =====
    /// Calibration file missing, empty or unreadable
    #[error("calibration file '{path}': {message}")]
    CalibrationFile { path: String, message: String },

    /// No eye tracker could be found
    #[error("no eye tracker detected: {message}")]
    NoDevice { message: String },

    /// The sample producer failed
    #[error("gaze producer '{source_name}' failed: {message}")]
    Producer {
        source_name: String,
        message: String,
    },

    // ===== Persistence Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Reading a persisted file back failed
    #[error("failed to read '{path}': {message}")]
    SinkRead { path: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Classify the error for reporting
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotRecording { .. }
            | Self::WhileRecording { .. }
            | Self::AlreadyConfigured { .. } => ErrorCategory::Usage,
            Self::UnsupportedUnit { .. }
            | Self::UnsupportedFormat { .. }
            | Self::MissingMonitor { .. }
            | Self::InvalidBufferSize { .. }
            | Self::NotConfigured { .. }
            | Self::ConfigParse { .. }
            | Self::ConfigValidation { .. }
            | Self::CalibrationPoints { .. } => ErrorCategory::Configuration,
            Self::CalibrationFile { .. } | Self::NoDevice { .. } => ErrorCategory::Resource,
            Self::Producer { .. } => ErrorCategory::DataIntegrity,
            Self::SinkWrite { .. } | Self::SinkRead { .. } | Self::Io(_) => {
                ErrorCategory::Persistence
            }
            Self::Other(_) => ErrorCategory::Resource,
        }
    }

    /// Create not-recording error
    pub fn not_recording(operation: impl Into<String>) -> Self {
        Self::NotRecording {
            operation: operation.into(),
        }
    }

    /// Create while-recording error
    pub fn while_recording(operation: impl Into<String>) -> Self {
        Self::WhileRecording {
            operation: operation.into(),
        }
    }

    /// Create unsupported unit error
    pub fn unsupported_unit(unit: impl Into<String>) -> Self {
        Self::UnsupportedUnit { unit: unit.into() }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create calibration file error
    pub fn calibration_file(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CalibrationFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create sink read error
    pub fn sink_read(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkRead {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            ContractError::not_recording("record_event").category(),
            ErrorCategory::Usage
        );
        assert_eq!(
            ContractError::unsupported_unit("furlong").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            ContractError::NoDevice {
                message: "none".into()
            }
            .category(),
            ErrorCategory::Resource
        );
        assert_eq!(
            ContractError::sink_write("csv", "disk full").category(),
            ErrorCategory::Persistence
        );
    }

    #[test]
    fn test_messages_name_the_problem() {
        let err = ContractError::unsupported_unit("furlong");
        assert_eq!(err.to_string(), "unit (furlong) is not supported");

        let err = ContractError::not_recording("record_event");
        assert!(err.to_string().contains("record_event"));
    }
}
