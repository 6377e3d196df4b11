//! # Sample Buffer
//!
//! The single point of mutual exclusion between the gaze producer and the
//! foreground consumer.
//!
//! ## Design
//!
//! - One `Mutex` covers the live sample sequence, the live event sequence and
//!   the rolling window together
//! - Every critical section is O(1): push, swap or copy; no I/O or
//!   conversion happens under the lock
//! - `drain()` swaps the live sequences for empty ones, so consecutive drains
//!   partition the stream without duplicates or gaps

mod aggregate;
mod buffer;
mod rolling;

pub use aggregate::aggregate;
pub use buffer::{CatchUp, Drained, SampleBuffer};
pub use rolling::{window_len, RollingBuffer};
