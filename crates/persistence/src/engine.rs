//! PersistenceEngine - drained batch -> on-disk rows

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use contracts::{ContractError, Event, FileFormat, GazeSample, SchemaVariant};
use coords::SurfaceTransform;
use observability::{metrics, warnings};
use tracing::{info, instrument};

use crate::continuity::{analyze_file, ContinuityReport};
use crate::merge::merge_events;
use crate::schema::{self, relative_ms};
use crate::writer::{open_writer, EventRow, SessionMetadata, TableWriter};
use crate::RowBatch;

/// Outcome of one save
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    pub rows_written: usize,
    pub events_written: usize,
    /// Events dropped because the batch had no samples
    pub events_dropped: usize,
    /// Events later than the last sample of the batch
    pub events_past_tail: usize,
    pub elapsed_ms: f64,
}

impl SaveReport {
    /// True when nothing reached the file
    pub fn is_empty(&self) -> bool {
        self.rows_written == 0
    }
}

/// Writes drained batches of one session to one output file
pub struct PersistenceEngine {
    path: PathBuf,
    format: FileFormat,
    schema: SchemaVariant,
    transform: SurfaceTransform,
    frequency_hz: f64,
    /// Latched from the first sample successfully written in this session
    first_timestamp: Option<i64>,
    writer: Box<dyn TableWriter>,
}

impl std::fmt::Debug for PersistenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceEngine")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("schema", &self.schema)
            .field("writer", &self.writer.name())
            .field("first_timestamp", &self.first_timestamp)
            .finish()
    }
}

impl PersistenceEngine {
    /// Create an engine writing to `path`
    ///
    /// Fails with `UnsupportedFormat` before any I/O.
    pub fn new(
        path: impl Into<PathBuf>,
        schema: SchemaVariant,
        transform: SurfaceTransform,
        frequency_hz: f64,
    ) -> Result<Self, ContractError> {
        let path = path.into();
        let format = FileFormat::from_path(&path)?;
        let geometry = transform.geometry();
        let metadata = SessionMetadata {
            surface_width_px: geometry.width_px,
            surface_height_px: geometry.height_px,
            frequency_hz,
            schema,
            units: geometry.units,
        };
        let writer = open_writer(format, &path, metadata);

        Ok(Self {
            path,
            format,
            schema,
            transform,
            frequency_hz,
            first_timestamp: None,
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn schema(&self) -> SchemaVariant {
        self.schema
    }

    pub fn first_timestamp(&self) -> Option<i64> {
        self.first_timestamp
    }

    /// Merge, transform and append one drained batch
    #[instrument(
        name = "persistence_save",
        skip(self, samples, events),
        fields(path = %self.path.display(), samples = samples.len(), events = events.len())
    )]
    pub fn save(
        &mut self,
        samples: &[GazeSample],
        events: &[Event],
    ) -> Result<SaveReport, ContractError> {
        let started = Instant::now();

        if samples.is_empty() {
            if !events.is_empty() {
                warnings::data_integrity(
                    "save",
                    format!(
                        "{} event(s) dropped: no gaze samples to attach them to",
                        events.len()
                    ),
                );
            }
            info!("No gaze data to save");
            return Ok(SaveReport {
                events_dropped: events.len(),
                ..SaveReport::default()
            });
        }

        // Latched only once a batch is on disk
        let first = self
            .first_timestamp
            .unwrap_or(samples[0].system_time_stamp);

        let sample_ts: Vec<i64> = samples.iter().map(|s| s.system_time_stamp).collect();
        let merged = merge_events(&sample_ts, events);
        if merged.past_tail > 0 {
            warnings::data_integrity(
                "save",
                format!(
                    "{} event(s) recorded after the last gaze sample; attached to the final row",
                    merged.past_tail
                ),
            );
        }

        let rows = schema::build_rows(
            self.schema,
            &self.transform,
            samples,
            &merged.labels,
            first,
        )?;
        let batch = RowBatch {
            columns: schema::columns(self.schema),
            rows,
        };
        let event_rows: Vec<EventRow> = events
            .iter()
            .map(|e| EventRow {
                time_stamp: relative_ms(e.system_time_stamp, first),
                label: e.label.clone(),
            })
            .collect();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let rows_written = self.writer.append(&batch, &event_rows)?;
        self.first_timestamp = Some(first);

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        metrics::record_rows_written(self.writer.name(), rows_written);
        metrics::record_save(rows_written, event_rows.len(), elapsed_ms);
        info!(
            rows = rows_written,
            events = event_rows.len(),
            elapsed_ms,
            "Data saved"
        );

        Ok(SaveReport {
            rows_written,
            events_written: event_rows.len(),
            events_dropped: 0,
            events_past_tail: merged.past_tail,
            elapsed_ms,
        })
    }

    /// Continuity scan over everything written so far
    pub fn analyze_continuity(&self) -> Result<Option<ContinuityReport>, ContractError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let report = analyze_file(&self.path, self.frequency_hz)?;
        if let Some(report) = &report {
            metrics::record_dropped_samples(report.dropped_samples, report.total_samples);
            if report.dropped_samples > 0 {
                warnings::data_integrity("analyze_continuity", report);
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{EyeData, Point2, SurfaceGeometry, Units};
    use tempfile::tempdir;

    fn transform() -> SurfaceTransform {
        SurfaceTransform::new(SurfaceGeometry::new(1920, 1080, Units::Height))
    }

    fn sample(ts: i64) -> GazeSample {
        GazeSample {
            device_time_stamp: ts,
            system_time_stamp: ts,
            left: EyeData::looking_at(Point2::new(0.5, 0.5)),
            right: EyeData::looking_at(Point2::new(0.5, 0.5)),
            user_position: None,
        }
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = ::csv::Reader::from_path(path).unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut engine =
            PersistenceEngine::new(&path, SchemaVariant::Simplified, transform(), 120.0).unwrap();

        let report = engine
            .save(&[], &[Event::new(5, "orphan")])
            .unwrap();
        assert!(report.is_empty());
        assert_eq!(report.events_dropped, 1);
        assert!(!path.exists());
        assert!(engine.analyze_continuity().unwrap().is_none());
    }

    #[test]
    fn test_event_merge_written_to_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut engine =
            PersistenceEngine::new(&path, SchemaVariant::Simplified, transform(), 120.0).unwrap();

        let report = engine
            .save(
                &[sample(100_000), sample(200_000), sample(300_000)],
                &[Event::new(150_000, "cue")],
            )
            .unwrap();
        assert_eq!(report.rows_written, 3);
        assert_eq!(report.events_written, 1);

        let rows = read_rows(&path);
        let events: Vec<&str> = rows.iter().map(|r| r[11].as_str()).collect();
        assert_eq!(events, vec!["", "cue", ""]);
        let ts: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(ts, vec!["0", "100", "200"]);
    }

    #[test]
    fn test_first_timestamp_latched_across_saves() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        let mut engine =
            PersistenceEngine::new(&path, SchemaVariant::Raw, transform(), 120.0).unwrap();

        engine.save(&[sample(1_000_000)], &[]).unwrap();
        engine.save(&[sample(1_050_000)], &[]).unwrap();
        assert_eq!(engine.first_timestamp(), Some(1_000_000));

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "50");
    }

    #[test]
    fn test_failed_write_does_not_latch_first_timestamp() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        let path = blocker.join("out.csv");
        let mut engine =
            PersistenceEngine::new(&path, SchemaVariant::Raw, transform(), 120.0).unwrap();

        assert!(engine.save(&[sample(1_000_000)], &[]).is_err());
        assert_eq!(engine.first_timestamp(), None);

        // Once the path is writable the retried batch keeps its own origin
        fs::remove_file(&blocker).unwrap();
        engine.save(&[sample(2_000_000)], &[]).unwrap();
        engine.save(&[sample(2_050_000)], &[]).unwrap();
        assert_eq!(engine.first_timestamp(), Some(2_000_000));
        let rows = read_rows(&path);
        assert_eq!(rows[0][0], "0");
        assert_eq!(rows[1][0], "50");
    }

    #[test]
    fn test_unsupported_format() {
        assert!(matches!(
            PersistenceEngine::new("out.parquet", SchemaVariant::Raw, transform(), 120.0),
            Err(ContractError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_continuity_across_batches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.db");
        let mut engine =
            PersistenceEngine::new(&path, SchemaVariant::Raw, transform(), 120.0).unwrap();

        // Gap straddles the batch boundary
        let first: Vec<GazeSample> = (0..5).map(|i| sample(i * 8333)).collect();
        let second: Vec<GazeSample> = (0..5).map(|i| sample(4 * 8333 + 25_000 + i * 8333)).collect();
        engine.save(&first, &[]).unwrap();
        engine.save(&second, &[]).unwrap();

        let report = engine.analyze_continuity().unwrap().unwrap();
        assert_eq!(report.total_samples, 10);
        assert_eq!(report.dropped_samples, 2);
    }
}
