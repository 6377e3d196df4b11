//! Calibration backend driven by a pointer device
//!
//! Stands in for the tracker when running without hardware: every collected
//! point samples the pointer a few times and reports those positions as the
//! per-eye estimates.

use std::sync::Arc;
use std::time::Duration;

use contracts::{
    CalibrationBackend, CalibrationPointResult, CalibrationResult, CalibrationSample,
    CalibrationStatus, ContractError, EyeCalibrationSample, Point2, PointerDevice,
    SampleValidity,
};
use coords::SurfaceTransform;
use tracing::debug;

const SAME_POINT_EPSILON: f64 = 1e-9;

pub struct PointerCalibrationBackend {
    pointer: Arc<dyn PointerDevice>,
    transform: SurfaceTransform,
    samples_per_point: usize,
    collection_time: Duration,
    in_mode: bool,
    collected: Vec<CalibrationPointResult>,
    applied: Option<CalibrationResult>,
}

impl std::fmt::Debug for PointerCalibrationBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerCalibrationBackend")
            .field("samples_per_point", &self.samples_per_point)
            .field("in_mode", &self.in_mode)
            .field("collected", &self.collected.len())
            .finish()
    }
}

impl PointerCalibrationBackend {
    /// Samples the pointer `samples_per_point` times over one second per point
    pub fn new(
        pointer: Arc<dyn PointerDevice>,
        transform: SurfaceTransform,
        samples_per_point: usize,
    ) -> Self {
        Self {
            pointer,
            transform,
            samples_per_point: samples_per_point.max(1),
            collection_time: Duration::from_secs(1),
            in_mode: false,
            collected: Vec::new(),
            applied: None,
        }
    }

    pub fn with_collection_time(mut self, collection_time: Duration) -> Self {
        self.collection_time = collection_time;
        self
    }

    /// Calibration currently applied, if any
    pub fn applied(&self) -> Option<&CalibrationResult> {
        self.applied.as_ref()
    }

    fn require_mode(&self) -> Result<(), ContractError> {
        if self.in_mode {
            Ok(())
        } else {
            Err(ContractError::NotConfigured {
                what: "calibration mode".to_string(),
                remedy: "call enter_mode before collecting data".to_string(),
            })
        }
    }

    fn sample_pointer(&self) -> Result<CalibrationSample, ContractError> {
        let position = self.transform.to_hardware(self.pointer.position()?)?;
        let validity = if position.is_valid() {
            SampleValidity::ValidAndUsed
        } else {
            SampleValidity::Invalid
        };
        let eye = EyeCalibrationSample { position, validity };
        Ok(CalibrationSample {
            left: eye,
            right: eye,
        })
    }
}

fn same_point(a: Point2, b: Point2) -> bool {
    (a.x - b.x).abs() < SAME_POINT_EPSILON && (a.y - b.y).abs() < SAME_POINT_EPSILON
}

impl CalibrationBackend for PointerCalibrationBackend {
    fn enter_mode(&mut self) -> Result<(), ContractError> {
        self.in_mode = true;
        self.collected.clear();
        Ok(())
    }

    fn collect_data(&mut self, point: Point2) -> Result<(), ContractError> {
        self.require_mode()?;
        let interval = self.collection_time / self.samples_per_point as u32;
        let mut samples = Vec::with_capacity(self.samples_per_point);
        for i in 0..self.samples_per_point {
            if i > 0 {
                std::thread::sleep(interval);
            }
            samples.push(self.sample_pointer()?);
        }

        self.collected.retain(|p| !same_point(p.position, point));
        self.collected.push(CalibrationPointResult {
            position: point,
            samples,
        });
        debug!(x = point.x, y = point.y, "Pointer calibration point collected");
        Ok(())
    }

    fn discard_data(&mut self, point: Point2) -> Result<(), ContractError> {
        self.require_mode()?;
        self.collected.retain(|p| !same_point(p.position, point));
        Ok(())
    }

    fn compute_and_apply(&mut self) -> Result<CalibrationResult, ContractError> {
        self.require_mode()?;
        let usable = self
            .collected
            .iter()
            .filter(|p| p.samples.iter().any(|s| s.is_used()))
            .count();
        let status = if usable == 0 {
            CalibrationStatus::Failure
        } else if usable == self.collected.len() {
            CalibrationStatus::Success
        } else {
            CalibrationStatus::PartialSuccess
        };

        let result = CalibrationResult {
            status,
            points: self.collected.clone(),
        };
        if status != CalibrationStatus::Failure {
            self.applied = Some(result.clone());
        }
        Ok(result)
    }

    fn leave_mode(&mut self) -> Result<(), ContractError> {
        self.in_mode = false;
        Ok(())
    }

    fn retrieve(&self) -> Result<Vec<u8>, ContractError> {
        match &self.applied {
            Some(result) => serde_json::to_vec(result)
                .map_err(|e| ContractError::Other(format!("calibration encode: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    fn apply(&mut self, blob: &[u8]) -> Result<(), ContractError> {
        let result: CalibrationResult = serde_json::from_slice(blob)
            .map_err(|e| ContractError::Other(format!("calibration decode: {e}")))?;
        self.applied = Some(result);
        Ok(())
    }
}
