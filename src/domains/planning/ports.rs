use crate::common::{MotionSettings, PlanningResult, Pose};
use crate::domains::actions::MotionTarget;
use crate::domains::planning::JointTrajectory;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionKind {
    Linear,
    CartesianPtp,
    Circular,
    JointPtp,
    Spline,
    CollisionFree,
}

/// One motion in the planner's wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionCommand {
    pub kind: MotionKind,
    pub target: MotionTarget,
    pub intermediate: Option<Pose>,
    pub waypoints: Vec<Pose>,
    pub settings: MotionSettings,
}

/// Candidate joint configurations reaching one pose.
pub type JointSolutions = Vec<Vec<f64>>;

/// Port to the remote trajectory-planning / inverse-kinematics / collision
/// service. Implementations (adapters) speak whatever transport the service
/// exposes; the batching pipeline only sees these four calls.
#[async_trait]
pub trait TrajectoryPlanner: Send + Sync {
    /// Interpolate a batch of plain motions starting from the given joints.
    async fn plan_trajectory(
        &self,
        start_joints: &[f64],
        commands: &[MotionCommand],
    ) -> PlanningResult<JointTrajectory>;

    /// Plan a collision-free motion to a joint-space target.
    async fn plan_collision_free(
        &self,
        start_joints: &[f64],
        target_joints: &[f64],
    ) -> PlanningResult<JointTrajectory>;

    /// One solution set per pose; a set may be empty.
    async fn inverse_kinematics(&self, poses: &[Pose]) -> PlanningResult<Vec<JointSolutions>>;

    /// Load a stitched trajectory onto the controller, returning the
    /// identifier the movement protocol refers to it by.
    async fn load_trajectory(&self, trajectory: &JointTrajectory) -> PlanningResult<String>;
}
