//! Event - experimenter-triggered marker

use serde::{Deserialize, Serialize};

/// Discrete labeled marker, same clock domain as [`crate::GazeSample`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// System clock (µs)
    pub system_time_stamp: i64,

    pub label: String,
}

impl Event {
    pub fn new(system_time_stamp: i64, label: impl Into<String>) -> Self {
        Self {
            system_time_stamp,
            label: label.into(),
        }
    }
}
