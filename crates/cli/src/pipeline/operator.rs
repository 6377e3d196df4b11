//! Unattended calibration operator.

use calibration::{CalibrationOperator, CollectionState, OperatorCommand, ReviewDecision};
use contracts::{CalibrationResult, CalibrationStatus};
use tracing::info;

/// Collects every selectable point in order, then finishes
///
/// A result that is not a full success is restarted once, then accepted.
#[derive(Debug, Default)]
pub struct AutoOperator {
    restarted: bool,
}

impl CalibrationOperator for AutoOperator {
    fn next_command(&mut self, state: &CollectionState<'_>) -> OperatorCommand {
        state
            .pending
            .iter()
            .copied()
            .find(|&i| !state.collected[i])
            .map_or(OperatorCommand::Finish, OperatorCommand::Collect)
    }

    fn review(&mut self, result: &CalibrationResult) -> ReviewDecision {
        if result.status == CalibrationStatus::Success || self.restarted {
            return ReviewDecision::Accept;
        }
        info!(status = ?result.status, "Calibration incomplete, restarting once");
        self.restarted = true;
        ReviewDecision::RestartAll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Point2;

    #[test]
    fn test_collects_pending_in_order() {
        let points = [Point2::new(0.0, 0.0); 3];
        let mut operator = AutoOperator::default();

        let state = CollectionState {
            points: &points,
            pending: &[0, 1, 2],
            collected: &[true, false, false],
            round: 1,
        };
        assert_eq!(operator.next_command(&state), OperatorCommand::Collect(1));

        let done = CollectionState {
            collected: &[true, true, true],
            ..state
        };
        assert_eq!(operator.next_command(&done), OperatorCommand::Finish);
    }

    #[test]
    fn test_restarts_once() {
        let mut operator = AutoOperator::default();
        let failed = CalibrationResult {
            status: CalibrationStatus::Failure,
            points: Vec::new(),
        };
        assert_eq!(operator.review(&failed), ReviewDecision::RestartAll);
        assert_eq!(operator.review(&failed), ReviewDecision::Accept);
    }
}
