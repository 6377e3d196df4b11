//! Flat delimited output.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use contracts::ContractError;
use tracing::{debug, error};

use super::{EventRow, TableWriter};
use crate::RowBatch;

const NAME: &str = "csv";

fn csv_err(e: impl std::fmt::Display) -> ContractError {
    ContractError::sink_write(NAME, e.to_string())
}

/// Append-only CSV file with a header written once
#[derive(Debug)]
pub struct CsvTableWriter {
    path: PathBuf,
}

impl CsvTableWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write_batch(&self, batch: &RowBatch) -> Result<(), ContractError> {
        let needs_header = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = ::csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(batch.column_names()).map_err(csv_err)?;
        }
        for row in &batch.rows {
            writer
                .write_record(row.iter().map(|v| v.to_field()))
                .map_err(csv_err)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl TableWriter for CsvTableWriter {
    fn name(&self) -> &str {
        NAME
    }

    fn append(&mut self, batch: &RowBatch, _events: &[EventRow]) -> Result<usize, ContractError> {
        self.write_batch(batch).map_err(|e| {
            error!(path = %self.path.display(), error = %e, "CSV append failed");
            e
        })?;
        debug!(path = %self.path.display(), rows = batch.len(), "CSV rows appended");
        Ok(batch.len())
    }
}

/// Timestamp column of a CSV recording, in µs
///
/// Uses `system_time_stamp` when present, otherwise `TimeStamp` (ms).
pub fn read_csv_timestamps(path: &Path) -> Result<Vec<i64>, ContractError> {
    let read_err =
        |e: ::csv::Error| ContractError::sink_read(path.display().to_string(), e.to_string());
    let mut reader = ::csv::Reader::from_path(path).map_err(read_err)?;
    let headers = reader.headers().map_err(read_err)?.clone();

    let (index, scale) = match headers
        .iter()
        .position(|h| h == crate::schema::SYSTEM_TIME_STAMP)
    {
        Some(i) => (i, 1),
        None => match headers.iter().position(|h| h == crate::schema::TIMESTAMP) {
            Some(i) => (i, 1000),
            None => {
                return Err(ContractError::sink_read(
                    path.display().to_string(),
                    "no timestamp column",
                ))
            }
        },
    };

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.map_err(read_err)?;
        let Some(field) = record.get(index) else {
            continue;
        };
        let value = field
            .parse::<i64>()
            .or_else(|_| field.parse::<f64>().map(|v| v.round() as i64))
            .map_err(|e| {
                ContractError::sink_read(
                    path.display().to_string(),
                    format!("bad timestamp '{field}': {e}"),
                )
            })?;
        out.push(value * scale);
    }
    Ok(out)
}
