//! # Session
//!
//! The recording orchestrator: `idle --start--> active --stop--> idle`.
//!
//! A [`RecordingSession`] wires a [`contracts::GazeSource`] into the shared
//! [`sample_buffer::SampleBuffer`], flushes drained batches through a
//! [`persistence::PersistenceEngine`] and answers real-time gaze queries from
//! the rolling window.
//!
//! Recording always ends with a final flush: explicitly through
//! [`RecordingSession::stop`], or implicitly when a [`RecordingGuard`] or the
//! session itself is dropped.

mod guard;
mod recorder;
mod summary;

pub use guard::RecordingGuard;
pub use recorder::{RecordingSession, SessionState};
pub use summary::SessionSummary;
