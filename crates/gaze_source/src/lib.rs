//! # Gaze Source
//!
//! Sample producers behind the `GazeSource` callback interface.
//!
//! Responsibilities:
//! - Pointer-driven simulated eye tracker
//! - Replay of recorded JSONL sample streams
//! - Pointer devices for simulation
//! - Device discovery and connection
//!
//! Every producer runs on its own thread and reports failures through
//! `GazeSource::fault` instead of dying silently.

pub mod discovery;
pub mod pointer;
pub mod replay;
pub mod simulated;
mod worker;

pub use discovery::{connect, DeviceDiscovery, DeviceInfo, SimulatedDiscovery};
pub use pointer::{FixedPointer, ScriptedPointer, SharedPointer};
pub use replay::{ReplayConfig, ReplayGazeSource};
pub use simulated::{simulated_sample, SimulatedGazeSource};
