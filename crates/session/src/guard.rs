//! Scoped recording.

use std::ops::{Deref, DerefMut};

use contracts::ContractError;
use tracing::error;

use crate::{RecordingSession, SessionSummary};

/// An active recording that stops, with a final flush, when dropped
///
/// Created by [`RecordingSession::begin`]. Dereferences to the session so
/// events and gaze queries go through the guard.
pub struct RecordingGuard<'a> {
    session: &'a mut RecordingSession,
    finished: bool,
}

impl<'a> RecordingGuard<'a> {
    pub(crate) fn new(session: &'a mut RecordingSession) -> Self {
        Self {
            session,
            finished: false,
        }
    }

    /// Stop explicitly and get the summary (and any flush error)
    pub fn finish(mut self) -> Result<Option<SessionSummary>, ContractError> {
        self.finished = true;
        self.session.stop()
    }
}

impl Deref for RecordingGuard<'_> {
    type Target = RecordingSession;

    fn deref(&self) -> &Self::Target {
        self.session
    }
}

impl DerefMut for RecordingGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session
    }
}

impl Drop for RecordingGuard<'_> {
    fn drop(&mut self) {
        if self.finished || !self.session.is_recording() {
            return;
        }
        if let Err(e) = self.session.stop() {
            error!(error = %e, "Final flush failed while dropping the recording guard");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{RecordingSession, SessionState};
    use contracts::{
        GazeSource, Point2, RecordingConfig, SimulationConfig, SurfaceGeometry, Units,
    };
    use coords::SurfaceTransform;
    use gaze_source::{FixedPointer, SimulatedGazeSource};
    use std::sync::Arc;
    use std::time::Duration;

    fn session(path: &std::path::Path) -> RecordingSession {
        let transform = SurfaceTransform::new(SurfaceGeometry::new(800, 600, Units::Pixel));
        let source: Arc<dyn GazeSource> = Arc::new(SimulatedGazeSource::new(
            Arc::new(FixedPointer(Point2::new(0.0, 0.0))),
            transform,
            &SimulationConfig::default(),
        ));
        RecordingSession::new(
            source,
            transform,
            RecordingConfig {
                output: Some(path.to_path_buf()),
                stabilization_ms: 0,
                ..RecordingConfig::default()
            },
        )
    }

    #[test]
    fn test_guard_stops_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guard.csv");
        let mut session = session(&path);
        {
            let guard = session.begin().unwrap();
            assert!(guard.is_recording());
            guard.record_event("inside").unwrap();
            std::thread::sleep(Duration::from_millis(50));
        }
        assert_eq!(session.state(), SessionState::Idle);
        assert!(path.exists());
    }

    #[test]
    fn test_guard_stops_on_error_path() {
        fn failing_block(session: &mut RecordingSession) -> Result<(), String> {
            let _guard = session.begin().map_err(|e| e.to_string())?;
            std::thread::sleep(Duration::from_millis(30));
            Err("trial aborted".to_string())
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aborted.csv");
        let mut session = session(&path);
        assert!(failing_block(&mut session).is_err());
        assert!(!session.is_recording());
        assert!(path.exists());
    }

    #[test]
    fn test_finish_returns_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finish.csv");
        let mut session = session(&path);
        let guard = session.begin().unwrap();
        std::thread::sleep(Duration::from_millis(50));
        let summary = guard.finish().unwrap().unwrap();
        assert_eq!(summary.output, path);
        assert!(summary.rows_written > 0);
    }
}
