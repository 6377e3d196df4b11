//! Calibration collaborator contract.
//!
//! All positions are hardware-normalized.

use serde::{Deserialize, Serialize};

use crate::{ContractError, Point2};

/// Overall calibration outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationStatus {
    Success,
    PartialSuccess,
    Failure,
}

/// Validity of one eye in one calibration sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleValidity {
    ValidAndUsed,
    ValidButNotUsed,
    Invalid,
}

/// One eye's estimate for a calibration sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeCalibrationSample {
    pub position: Point2,
    pub validity: SampleValidity,
}

/// Both eyes' estimates for a calibration sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSample {
    pub left: EyeCalibrationSample,
    pub right: EyeCalibrationSample,
}

impl CalibrationSample {
    /// At least one eye was used by the computed calibration
    pub fn is_used(&self) -> bool {
        self.left.validity == SampleValidity::ValidAndUsed
            || self.right.validity == SampleValidity::ValidAndUsed
    }
}

/// Result data for one calibration target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPointResult {
    /// Target position
    pub position: Point2,
    pub samples: Vec<CalibrationSample>,
}

/// Output of `compute_and_apply`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub status: CalibrationStatus,
    pub points: Vec<CalibrationPointResult>,
}

/// Screen-based calibration backend (hardware SDK or simulation)
pub trait CalibrationBackend {
    fn enter_mode(&mut self) -> Result<(), ContractError>;

    /// Collect data for the target at `point`
    fn collect_data(&mut self, point: Point2) -> Result<(), ContractError>;

    /// Drop previously collected data for the target at `point`
    fn discard_data(&mut self, point: Point2) -> Result<(), ContractError>;

    fn compute_and_apply(&mut self) -> Result<CalibrationResult, ContractError>;

    fn leave_mode(&mut self) -> Result<(), ContractError>;

    /// Serialize the applied calibration
    fn retrieve(&self) -> Result<Vec<u8>, ContractError>;

    /// Apply a calibration produced by [`CalibrationBackend::retrieve`]
    fn apply(&mut self, blob: &[u8]) -> Result<(), ContractError>;
}
