//! Simulated recording pipeline.

mod operator;
mod orchestrator;
mod stats;

pub use operator::AutoOperator;
pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::PipelineStats;
