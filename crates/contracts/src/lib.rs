//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace:
//! the gaze data model, coordinate-system tags, configuration blueprint,
//! collaborator traits and the unified error type.
//! Business crates depend on this crate only, never on each other's internals.
//!
//! ## Time Model
//! - `system_time_stamp` (integer microseconds, monotonic) is the canonical
//!   ordering and merge key for samples and events
//! - `device_time_stamp` is an opaque hardware clock carried through untouched

mod blueprint;
mod calibration;
mod error;
mod event;
mod geometry;
mod sample;
mod schema;
mod source;

pub use blueprint::*;
pub use calibration::*;
pub use error::*;
pub use event::Event;
pub use geometry::*;
pub use sample::*;
pub use schema::*;
pub use source::{GazeCallback, GazeSource, PointerDevice, SourceKind};
