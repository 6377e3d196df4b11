//! Table-oriented output (SQLite).

use std::path::{Path, PathBuf};

use contracts::ContractError;
use rusqlite::types::{Null, ToSqlOutput};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, ToSql, Transaction};
use tracing::{debug, error};

use super::{EventRow, SessionMetadata, TableWriter};
use crate::schema::{SYSTEM_TIME_STAMP, TIMESTAMP};
use crate::{RowBatch, Value};

const NAME: &str = "sqlite";
const GAZE_TABLE: &str = "gaze";
const ATTRS_TABLE: &str = "gaze_attrs";
const EVENTS_TABLE: &str = "events";

fn sql_err(e: rusqlite::Error) -> ContractError {
    ContractError::sink_write(NAME, e.to_string())
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Value::Int(v) => v.to_sql(),
            Value::Real(v) if v.is_nan() => Null.to_sql(),
            Value::Real(v) => v.to_sql(),
            Value::Bool(v) => v.to_sql(),
            Value::Text(v) => v.to_sql(),
        }
    }
}

/// SQLite file with `gaze`, `gaze_attrs` and `events` tables
///
/// Each append runs in its own connection and transaction.
#[derive(Debug)]
pub struct SqliteTableWriter {
    path: PathBuf,
    metadata: SessionMetadata,
}

impl SqliteTableWriter {
    pub fn new(path: impl Into<PathBuf>, metadata: SessionMetadata) -> Self {
        Self {
            path: path.into(),
            metadata,
        }
    }

    fn write_batch(&self, batch: &RowBatch, events: &[EventRow]) -> rusqlite::Result<()> {
        let mut conn = Connection::open(&self.path)?;
        let tx = conn.transaction()?;

        if !table_exists(&tx, GAZE_TABLE)? {
            self.create_tables(&tx, batch)?;
        }

        let names: Vec<String> = batch.column_names().map(|n| format!("\"{n}\"")).collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
        let insert = format!(
            "INSERT INTO {GAZE_TABLE} ({}) VALUES ({})",
            names.join(", "),
            placeholders.join(", ")
        );
        {
            let mut stmt = tx.prepare(&insert)?;
            for row in &batch.rows {
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }

        if !events.is_empty() {
            tx.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {EVENTS_TABLE} (\"{TIMESTAMP}\" INTEGER, \"Event\" TEXT)"
                ),
                [],
            )?;
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {EVENTS_TABLE} (\"{TIMESTAMP}\", \"Event\") VALUES (?1, ?2)"
            ))?;
            for event in events {
                stmt.execute(params![event.time_stamp, event.label])?;
            }
        }

        tx.commit()
    }

    fn create_tables(&self, tx: &Transaction<'_>, batch: &RowBatch) -> rusqlite::Result<()> {
        let defs: Vec<String> = batch
            .columns
            .iter()
            .map(|c| format!("\"{}\" {}", c.name, c.kind.sql_type()))
            .collect();
        tx.execute(
            &format!("CREATE TABLE {GAZE_TABLE} ({})", defs.join(", ")),
            [],
        )?;
        tx.execute(
            &format!("CREATE TABLE IF NOT EXISTS {ATTRS_TABLE} (key TEXT PRIMARY KEY, value TEXT)"),
            [],
        )?;
        let mut stmt = tx.prepare(&format!(
            "INSERT OR REPLACE INTO {ATTRS_TABLE} (key, value) VALUES (?1, ?2)"
        ))?;
        for (key, value) in self.metadata.entries() {
            stmt.execute(params![key, value])?;
        }
        debug!(path = %self.path.display(), "Created gaze tables");
        Ok(())
    }
}

fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
}

impl TableWriter for SqliteTableWriter {
    fn name(&self) -> &str {
        NAME
    }

    fn append(&mut self, batch: &RowBatch, events: &[EventRow]) -> Result<usize, ContractError> {
        self.write_batch(batch, events).map_err(|e| {
            error!(path = %self.path.display(), error = %e, "SQLite append failed");
            sql_err(e)
        })?;
        debug!(
            path = %self.path.display(),
            rows = batch.len(),
            events = events.len(),
            "SQLite rows appended"
        );
        Ok(batch.len())
    }
}

/// Timestamp column of a SQLite recording, in µs
///
/// Uses `system_time_stamp` when the table has it, otherwise `TimeStamp` (ms).
pub fn read_sqlite_timestamps(path: &Path) -> Result<Vec<i64>, ContractError> {
    let read_err =
        |e: rusqlite::Error| ContractError::sink_read(path.display().to_string(), e.to_string());
    if !path.exists() {
        return Err(ContractError::sink_read(
            path.display().to_string(),
            "file does not exist",
        ));
    }
    let conn = Connection::open(path).map_err(read_err)?;

    let columns: Vec<String> = {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({GAZE_TABLE})"))
            .map_err(read_err)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(read_err)?;
        let names: Vec<String> = names.collect::<rusqlite::Result<_>>().map_err(read_err)?;
        names
    };

    let (column, scale) = if columns.iter().any(|c| c == SYSTEM_TIME_STAMP) {
        (SYSTEM_TIME_STAMP, 1)
    } else if columns.iter().any(|c| c == TIMESTAMP) {
        (TIMESTAMP, 1000)
    } else {
        return Err(ContractError::sink_read(
            path.display().to_string(),
            "no gaze table with a timestamp column",
        ));
    };

    let mut stmt = conn
        .prepare(&format!(
            "SELECT \"{column}\" FROM {GAZE_TABLE} ORDER BY rowid"
        ))
        .map_err(read_err)?;
    let values = stmt
        .query_map([], |row| row.get::<_, i64>(0))
        .map_err(read_err)?;
    let timestamps: Vec<i64> = values
        .map(|v| v.map(|ts| ts * scale))
        .collect::<rusqlite::Result<_>>()
        .map_err(read_err)?;
    Ok(timestamps)
}
