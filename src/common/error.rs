use crate::domains::planning::JointTrajectory;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("Trajectory planning failed: {description}")]
    PlanTrajectoryFailed {
        description: String,
        /// The valid prefix of the path, when the planner managed to produce one.
        partial_trajectory: Option<JointTrajectory>,
    },

    #[error("Loading planned trajectory failed: {description}")]
    LoadPlanFailed { description: String },

    #[error("Actions in one batch reference different collision scenes: {scenes:?}")]
    InconsistentCollisionScenes { scenes: Vec<String> },

    #[error("No inverse kinematics solution found for the requested pose")]
    NoInverseKinematicsSolutionFound,

    #[error("Invalid motion target: {reason}")]
    InvalidTarget { reason: String },

    #[error("Invalid trajectory: {reason}")]
    InvalidTrajectory { reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Planning error: {0}")]
    Planning(#[from] PlanningError),

    #[error("Initializing movement of trajectory {trajectory_id} failed: {reason}")]
    InitMovementFailed {
        trajectory_id: String,
        reason: String,
    },

    #[error("Error during movement of trajectory {trajectory_id} at location {location}: {message}")]
    ErrorDuringMovement {
        trajectory_id: String,
        location: f64,
        message: String,
    },

    #[error("Invalid location {requested}: {reason}")]
    InvalidLocation { requested: f64, reason: String },

    #[error("Async action '{action_name}' triggered at location {trigger_location} failed: {cause}")]
    AsyncActionFailed {
        action_name: String,
        trigger_location: f64,
        completion_location: Option<f64>,
        was_blocking: bool,
        cause: String,
    },

    #[error("Connection to the motion controller was lost: {0}")]
    ConnectionLost(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(#[from] anyhow::Error),
}

pub type PlanningResult<T> = Result<T, PlanningError>;
pub type ExecutionResult<T> = Result<T, ExecutionError>;
