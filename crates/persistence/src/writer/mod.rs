//! TableWriter trait - physical output formats
//!
//! Writers hold only the destination; every `append` opens the file, writes
//! and closes it again.

mod csv;
mod sqlite;

pub use self::csv::{read_csv_timestamps, CsvTableWriter};
pub use self::sqlite::{read_sqlite_timestamps, SqliteTableWriter};

use std::path::Path;

use contracts::{ContractError, FileFormat, SchemaVariant, Units};

use crate::RowBatch;

/// Session-level attributes stored alongside the table
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMetadata {
    pub surface_width_px: u32,
    pub surface_height_px: u32,
    pub frequency_hz: f64,
    pub schema: SchemaVariant,
    pub units: Units,
}

impl SessionMetadata {
    /// Key/value form, in a fixed order
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("surface_width_px", self.surface_width_px.to_string()),
            ("surface_height_px", self.surface_height_px.to_string()),
            ("frequency_hz", self.frequency_hz.to_string()),
            ("schema", self.schema.to_string()),
            ("units", self.units.to_string()),
        ]
    }
}

/// Raw event row for formats with a separate event table
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    /// ms since the first sample of the session
    pub time_stamp: i64,
    pub label: String,
}

/// Appendable physical table
pub trait TableWriter: Send {
    /// Writer name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Append a batch of rows, plus raw events where the format keeps them
    ///
    /// Returns the number of rows written.
    fn append(&mut self, batch: &RowBatch, events: &[EventRow]) -> Result<usize, ContractError>;
}

/// Writer for `format` at `path`
pub fn open_writer(
    format: FileFormat,
    path: &Path,
    metadata: SessionMetadata,
) -> Box<dyn TableWriter> {
    match format {
        FileFormat::Csv => Box::new(CsvTableWriter::new(path)),
        FileFormat::Table => Box::new(SqliteTableWriter::new(path, metadata)),
    }
}
