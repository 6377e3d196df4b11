//! # Persistence
//!
//! Turns drained `(samples, events)` batches into rows and appends them to
//! the output file, then estimates data continuity from what was written.
//!
//! ## Formats
//!
//! - `.csv`: one header row, append-only, `Events` text column
//! - `.db` / `.sqlite`: `gaze` table, `gaze_attrs` metadata written once at
//!   creation, `events` table when events occurred
//!
//! Each flush opens, appends and closes the file, so a crash between flushes
//! leaves a readable partial recording.

pub mod continuity;
mod engine;
mod merge;
mod naming;
pub mod schema;
mod table;
pub mod writer;

pub use continuity::{analyze_file, analyze_timestamps, ContinuityReport};
pub use engine::{PersistenceEngine, SaveReport};
pub use merge::{merge_events, MergedLabels};
pub use naming::{resolve_output_path, timestamp_name, ResolvedOutput, TIMESTAMP_FORMAT};
pub use table::{ColumnKind, ColumnSpec, RowBatch, Value};
pub use writer::{open_writer, EventRow, SessionMetadata, TableWriter};
