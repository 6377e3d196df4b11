//! Calibration retry loop.
//!
//! The operator (experimenter UI) picks points to collect, then reviews the
//! computed result and either accepts it, retries a subset of points,
//! restarts from scratch or aborts.

use std::time::Duration;

use contracts::{
    CalibrationBackend, CalibrationConfig, CalibrationResult, CalibrationStatus, ContractError,
    Point2, Units,
};
use coords::SurfaceTransform;
use observability::warnings;
use tracing::{debug, info, instrument};

const MIN_POINTS: usize = 2;
const MAX_POINTS: usize = 9;

/// Operator input during the collection phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Collect data at the point with this index
    Collect(usize),
    /// Compute the calibration from the collected points
    Finish,
    Abort,
}

/// Operator verdict after a calibration has been computed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Accept,
    /// Discard these points and collect them again
    Retry(Vec<usize>),
    /// Discard every point and start over
    RestartAll,
    Abort,
}

/// What the operator sees while choosing the next command
#[derive(Debug, Clone)]
pub struct CollectionState<'a> {
    /// Targets in surface units
    pub points: &'a [Point2],
    /// Indices that may be collected in this round
    pub pending: &'a [usize],
    /// Per point, whether data is currently held by the backend
    pub collected: &'a [bool],
    pub round: usize,
}

/// Experimenter side of the calibration loop
pub trait CalibrationOperator {
    fn next_command(&mut self, state: &CollectionState<'_>) -> OperatorCommand;

    fn review(&mut self, result: &CalibrationResult) -> ReviewDecision;
}

/// Outcome of [`CalibrationProcedure::run`]
#[derive(Debug, Clone)]
pub struct CalibrationReport {
    /// Last computed result, if the loop got that far
    pub result: Option<CalibrationResult>,
    pub aborted: bool,
    pub rounds: usize,
}

impl CalibrationReport {
    pub fn success(&self) -> bool {
        !self.aborted
            && self
                .result
                .as_ref()
                .is_some_and(|r| r.status == CalibrationStatus::Success)
    }
}

/// Calibration targets plus timing
#[derive(Debug, Clone)]
pub struct CalibrationProcedure {
    points: Vec<Point2>,
    hardware: Vec<Point2>,
    focus_time: Duration,
}

impl CalibrationProcedure {
    /// `points` are in `units`, or in the surface's own units when `None`.
    pub fn new(
        points: &[Point2],
        units: Option<Units>,
        transform: &SurfaceTransform,
        focus_time: Duration,
    ) -> Result<Self, ContractError> {
        if !(MIN_POINTS..=MAX_POINTS).contains(&points.len()) {
            return Err(ContractError::CalibrationPoints {
                count: points.len(),
            });
        }
        let units = units.unwrap_or(transform.units());
        let hardware = points
            .iter()
            .map(|p| transform.to_hardware_from(*p, units))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            points: points.to_vec(),
            hardware,
            focus_time,
        })
    }

    pub fn from_config(
        config: &CalibrationConfig,
        transform: &SurfaceTransform,
    ) -> Result<Self, ContractError> {
        Self::new(
            &config.points,
            config.units,
            transform,
            Duration::from_millis(config.focus_time_ms),
        )
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Targets in hardware-normalized coordinates
    pub fn hardware_points(&self) -> &[Point2] {
        &self.hardware
    }

    /// Run the loop until the operator accepts or aborts.
    ///
    /// Calibration mode is left on every exit path, including errors.
    #[instrument(name = "calibration_run", skip_all, fields(points = self.points.len()))]
    pub fn run(
        &self,
        backend: &mut dyn CalibrationBackend,
        operator: &mut dyn CalibrationOperator,
    ) -> Result<CalibrationReport, ContractError> {
        backend.enter_mode()?;
        let outcome = self.run_rounds(backend, operator);
        let left = backend.leave_mode();
        let report = outcome?;
        left?;

        info!(
            success = report.success(),
            aborted = report.aborted,
            rounds = report.rounds,
            "Calibration finished"
        );
        Ok(report)
    }

    fn run_rounds(
        &self,
        backend: &mut dyn CalibrationBackend,
        operator: &mut dyn CalibrationOperator,
    ) -> Result<CalibrationReport, ContractError> {
        let all: Vec<usize> = (0..self.points.len()).collect();
        let mut pending = all.clone();
        let mut collected = vec![false; self.points.len()];
        let mut report = CalibrationReport {
            result: None,
            aborted: false,
            rounds: 0,
        };

        loop {
            report.rounds += 1;
            if !self.collect_round(backend, operator, &pending, &mut collected, report.rounds)? {
                report.aborted = true;
                return Ok(report);
            }

            let result = backend.compute_and_apply()?;
            self.check_result(&result);
            let decision = operator.review(&result);
            report.result = Some(result);

            match decision {
                ReviewDecision::Accept => return Ok(report),
                ReviewDecision::Abort => {
                    report.aborted = true;
                    return Ok(report);
                }
                ReviewDecision::RestartAll => {
                    self.discard(backend, &all, &mut collected)?;
                    pending = all.clone();
                }
                ReviewDecision::Retry(indices) => {
                    let mut retry: Vec<usize> = indices
                        .into_iter()
                        .filter(|&i| i < self.points.len())
                        .collect();
                    retry.sort_unstable();
                    retry.dedup();
                    if retry.is_empty() {
                        return Ok(report);
                    }
                    self.discard(backend, &retry, &mut collected)?;
                    pending = retry;
                }
            }
        }
    }

    /// Returns false when the operator aborted
    fn collect_round(
        &self,
        backend: &mut dyn CalibrationBackend,
        operator: &mut dyn CalibrationOperator,
        pending: &[usize],
        collected: &mut [bool],
        round: usize,
    ) -> Result<bool, ContractError> {
        loop {
            let state = CollectionState {
                points: &self.points,
                pending,
                collected: &*collected,
                round,
            };
            match operator.next_command(&state) {
                OperatorCommand::Collect(index) => {
                    if !pending.contains(&index) {
                        warnings::usage(
                            "calibration_collect",
                            format!("point {index} is not selectable in this round"),
                        );
                        continue;
                    }
                    let target = self.hardware[index];
                    backend.discard_data(target)?;
                    std::thread::sleep(self.focus_time);
                    backend.collect_data(target)?;
                    collected[index] = true;
                    debug!(index, x = target.x, y = target.y, "Collected calibration point");
                }
                OperatorCommand::Finish => {
                    if collected.iter().any(|&c| c) {
                        return Ok(true);
                    }
                    warnings::usage(
                        "calibration_finish",
                        "no point has data yet, collect at least one point first",
                    );
                }
                OperatorCommand::Abort => return Ok(false),
            }
        }
    }

    fn discard(
        &self,
        backend: &mut dyn CalibrationBackend,
        indices: &[usize],
        collected: &mut [bool],
    ) -> Result<(), ContractError> {
        for &index in indices {
            backend.discard_data(self.hardware[index])?;
            collected[index] = false;
        }
        Ok(())
    }

    fn check_result(&self, result: &CalibrationResult) {
        for point in &result.points {
            if !point.samples.iter().any(|s| s.is_used()) {
                warnings::data_integrity(
                    "calibration_compute",
                    format!(
                        "no valid samples at calibration point ({:.3}, {:.3})",
                        point.position.x, point.position.y
                    ),
                );
            }
        }
    }
}
