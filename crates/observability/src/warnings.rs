//! 统一告警格式
//!
//! Every recoverable problem is reported through one of these helpers so
//! that all warnings carry the same `category` / `operation` fields.

use std::fmt::Display;
use tracing::warn;

/// API misuse that is ignored (start twice, stop while idle, ...)
pub fn usage(operation: &str, message: impl Display) {
    warn!(category = "usage", operation, "{message}");
}

/// Recorded data is incomplete or suspicious
pub fn data_integrity(operation: &str, message: impl Display) {
    warn!(category = "data_integrity", operation, "{message}");
}

/// A resource was unavailable but the operation carried on
pub fn resource(operation: &str, message: impl Display) {
    warn!(category = "resource", operation, "{message}");
}
