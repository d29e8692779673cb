use crate::common::{IoValue, Pose};
use crate::domains::actions::SetIo;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Forward,
    Backward,
}

/// Condition on a digital/analog input evaluated server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoTrigger {
    pub key: String,
    pub value: IoValue,
    pub device: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeMovementRequest {
    pub trajectory_id: String,
    pub initial_location: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeMovementResponse {
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartMovementRequest {
    pub direction: Direction,
    /// Outputs fired at their path location server-side, so they stay in
    /// sync with motion regardless of network latency.
    pub set_ios: Vec<SetIo>,
    pub start_on_io: Option<IoTrigger>,
    pub pause_on_io: Option<IoTrigger>,
    /// Absent for fire-and-forget execution: motion runs to the trajectory end.
    pub target_location: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartMovementResponse {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseMovementRequest {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSpeedRequest {
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementErrorResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MovementRequest {
    Initialize(InitializeMovementRequest),
    Start(StartMovementRequest),
    Pause(PauseMovementRequest),
    PlaybackSpeed(PlaybackSpeedRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MovementResponse {
    Initialize(InitializeMovementResponse),
    Start(StartMovementResponse),
    Error(MovementErrorResponse),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Running,
    PausedByUser,
    Ended,
}

/// Live execution details, present while the controller is driving a
/// loaded trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteInfo {
    pub location: f64,
    pub state: ExecutionState,
}

/// One event on the live motion-group state stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionGroupState {
    pub standstill: bool,
    pub execute: Option<ExecuteInfo>,
    pub joints: Vec<f64>,
    pub tcp_pose: Option<Pose>,
}

impl MotionGroupState {
    pub fn location(&self) -> Option<f64> {
        self.execute.as_ref().map(|e| e.location)
    }

    pub fn execution_state(&self) -> Option<ExecutionState> {
        self.execute.as_ref().map(|e| e.state)
    }
}
