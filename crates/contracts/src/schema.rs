//! On-disk schema variants and physical file formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::ContractError;

/// Column-schema variant of persisted gaze rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    /// Full vendor field set, tuples expanded to scalar columns
    Raw,
    /// Renamed, unit-converted, reduced column set
    #[default]
    Simplified,
}

impl SchemaVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Simplified => "simplified",
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical file format of a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    /// Flat delimited text, header written once
    Csv,
    /// Table-oriented binary store (SQLite)
    Table,
}

impl FileFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "db" | "sqlite" => Some(Self::Table),
            _ => None,
        }
    }

    /// Infer the format from a path, failing before any I/O
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext).ok_or_else(|| ContractError::UnsupportedFormat {
            path: path.display().to_string(),
            extension: if ext.is_empty() {
                "(none)".to_string()
            } else {
                format!(".{ext}")
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            FileFormat::from_path(Path::new("out/subject1.csv")).unwrap(),
            FileFormat::Csv
        );
        assert_eq!(
            FileFormat::from_path(Path::new("subject1.SQLITE")).unwrap(),
            FileFormat::Table
        );
        assert_eq!(
            FileFormat::from_path(Path::new("subject1.db")).unwrap(),
            FileFormat::Table
        );
    }

    #[test]
    fn test_unsupported_format() {
        let err = FileFormat::from_path(Path::new("subject1.h5")).unwrap_err();
        assert!(matches!(err, ContractError::UnsupportedFormat { .. }));
        assert!(err.to_string().contains(".h5"));

        let err = FileFormat::from_path(Path::new("subject1")).unwrap_err();
        assert!(err.to_string().contains("(none)"));
    }
}
