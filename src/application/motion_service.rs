use crate::adapters::outbound::ChannelTransport;
use crate::common::{ExecutionResult, PlanningResult};
use crate::config::Config;
use crate::domains::actions::CombinedActions;
use crate::domains::execution::{
    AttachedCursor, MovementControllerContext, MovementProtocolDriver, TrajectoryCursor,
};
use crate::domains::planning::{BatchPlanner, JointTrajectory, TrajectoryPlanner};
use std::sync::Arc;

/// Application service tying the pieces together: plan an action sequence,
/// load the stitched trajectory, and hand it to one of the two drivers.
pub struct MotionService {
    planner: Arc<dyn TrajectoryPlanner>,
    batch_planner: BatchPlanner,
    config: Config,
}

impl MotionService {
    pub fn new(planner: Arc<dyn TrajectoryPlanner>) -> Self {
        Self::with_config(planner, Config::default())
    }

    pub fn with_config(planner: Arc<dyn TrajectoryPlanner>, config: Config) -> Self {
        let batch_planner = BatchPlanner::new(planner.clone())
            .with_wait_sample_interval(config.planning.wait_sample_interval());
        Self {
            planner,
            batch_planner,
            config,
        }
    }

    /// Plan one stitched trajectory for the whole action sequence.
    pub async fn plan(
        &self,
        actions: &CombinedActions,
        start_joints: &[f64],
    ) -> PlanningResult<JointTrajectory> {
        self.batch_planner.plan(actions, start_joints).await
    }

    /// Plan and load, returning the controller-assigned trajectory id along
    /// with the trajectory.
    pub async fn plan_and_load(
        &self,
        actions: &CombinedActions,
        start_joints: &[f64],
    ) -> PlanningResult<(String, JointTrajectory)> {
        let trajectory = self.plan(actions, start_joints).await?;
        let trajectory_id = self.planner.load_trajectory(&trajectory).await?;
        Ok((trajectory_id, trajectory))
    }

    /// Fire-and-forget execution of a loaded trajectory.
    pub async fn execute(
        &self,
        context: MovementControllerContext,
        transport: ChannelTransport,
    ) -> ExecutionResult<()> {
        MovementProtocolDriver::new(context)
            .with_monitor_start_timeout(self.config.execution.monitor_start_timeout())
            .execute(transport.request_tx, transport.response_rx)
            .await
    }

    /// Interactive execution: attach a cursor the caller can scrub with.
    pub async fn attach_cursor(
        &self,
        context: MovementControllerContext,
        end_location: f64,
        transport: ChannelTransport,
    ) -> ExecutionResult<AttachedCursor> {
        TrajectoryCursor::new(context, end_location)
            .with_publish_interval(self.config.cursor.publish_interval())
            .with_queue_capacity(self.config.cursor.queue_capacity)
            .attach(transport.request_tx, transport.response_rx)
            .await
    }
}
