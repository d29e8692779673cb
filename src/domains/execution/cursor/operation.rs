use crate::common::ExecutionError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Forward,
    ForwardTo,
    ForwardToNextAction,
    Backward,
    BackwardTo,
    BackwardToPreviousAction,
    Pause,
}

impl OperationType {
    pub fn moves_forward(&self) -> bool {
        matches!(
            self,
            Self::Forward | Self::ForwardTo | Self::ForwardToNextAction
        )
    }

    pub fn moves_backward(&self) -> bool {
        matches!(
            self,
            Self::Backward | Self::BackwardTo | Self::BackwardToPreviousAction
        )
    }
}

/// Lifecycle of the single in-flight operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationPhase {
    Initial,
    Commanded,
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug)]
pub enum OperationOutcome {
    Completed,
    /// Superseded by a newer operation before it finished.
    Cancelled,
    Failed(ExecutionError),
}

/// Resolution of one cursor operation.
#[derive(Debug)]
pub struct OperationResult {
    pub operation_id: Uuid,
    pub operation_type: OperationType,
    pub start_location: f64,
    /// Absent for pause, which has no commanded stop location.
    pub target_location: Option<f64>,
    pub final_location: f64,
    pub overshoot: f64,
    pub outcome: OperationOutcome,
}

impl OperationResult {
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, OperationOutcome::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.outcome, OperationOutcome::Cancelled)
    }

    pub fn error(&self) -> Option<&ExecutionError> {
        match &self.outcome {
            OperationOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementOption {
    CanMoveForward,
    CanMoveBackward,
}

/// Directions the cursor can still move in from `location`.
pub fn movement_options(location: f64, end_location: f64) -> Vec<MovementOption> {
    let mut options = Vec::new();
    if location < end_location {
        options.push(MovementOption::CanMoveForward);
    }
    if location > 0.0 {
        options.push(MovementOption::CanMoveBackward);
    }
    options
}

fn clamp_index(value: i64, action_count: usize) -> usize {
    if action_count == 0 {
        return 0;
    }
    value.clamp(0, action_count as i64 - 1) as usize
}

/// Index of the action the location lies in, clamped to the valid range.
pub fn current_action_index(location: f64, action_count: usize) -> usize {
    clamp_index(location.floor() as i64, action_count)
}

/// Index of the next action boundary ahead of the (overshoot-corrected)
/// location.
pub fn next_action_index(location: f64, overshoot: f64, action_count: usize) -> usize {
    clamp_index((location - overshoot).ceil() as i64, action_count)
}

/// Index of the previous action boundary, or `None` when there is none
/// behind the current location.
pub fn previous_action_index(location: f64, overshoot: f64, action_count: usize) -> Option<usize> {
    let index = (location - 1.0 - overshoot).ceil() as i64;
    if index < 0 {
        None
    } else {
        Some(clamp_index(index, action_count))
    }
}
