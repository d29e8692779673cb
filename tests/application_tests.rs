use async_trait::async_trait;
use std::sync::Arc;
use wayline::adapters::inbound::BroadcastStateStream;
use wayline::adapters::outbound::channel_transport;
use wayline::application::MotionService;
use wayline::common::{PlanningResult, Pose};
use wayline::domains::actions::{Action, CombinedActions};
use wayline::domains::execution::{
    InitializeMovementResponse, MovementControllerContext, MovementRequest, MovementResponse,
};
use wayline::domains::planning::{
    JointSolutions, JointTrajectory, MotionCommand, TrajectoryPlanner,
};

fn pose(x: f64) -> Pose {
    Pose::from_position(x, 0.0, 0.0)
}

struct StubPlanner;

#[async_trait]
impl TrajectoryPlanner for StubPlanner {
    async fn plan_trajectory(
        &self,
        start_joints: &[f64],
        commands: &[MotionCommand],
    ) -> PlanningResult<JointTrajectory> {
        let span = commands.len() as f64;
        let end: Vec<f64> = start_joints.iter().map(|j| j + span).collect();
        JointTrajectory::new(
            vec![0.0, span],
            vec![start_joints.to_vec(), end],
            vec![0.0, span],
        )
    }

    async fn plan_collision_free(
        &self,
        start_joints: &[f64],
        target_joints: &[f64],
    ) -> PlanningResult<JointTrajectory> {
        JointTrajectory::new(
            vec![0.0, 1.0],
            vec![start_joints.to_vec(), target_joints.to_vec()],
            vec![0.0, 1.0],
        )
    }

    async fn inverse_kinematics(&self, poses: &[Pose]) -> PlanningResult<Vec<JointSolutions>> {
        Ok(vec![vec![vec![0.0, 0.0]]; poses.len()])
    }

    async fn load_trajectory(&self, _trajectory: &JointTrajectory) -> PlanningResult<String> {
        Ok("traj-42".to_string())
    }
}

#[tokio::test]
async fn plan_and_load_returns_the_controller_assigned_id() {
    let service = MotionService::new(Arc::new(StubPlanner));
    let actions: CombinedActions = [Action::linear(pose(100.0)), Action::linear(pose(200.0))]
        .into_iter()
        .collect();

    let (trajectory_id, trajectory) = service.plan_and_load(&actions, &[0.0, 0.0]).await.unwrap();
    assert_eq!(trajectory_id, "traj-42");
    assert_eq!(trajectory.end_location(), 2.0);
}

#[tokio::test]
async fn attach_cursor_hands_back_a_steerable_handle() {
    let service = MotionService::new(Arc::new(StubPlanner));
    let actions: CombinedActions = [Action::linear(pose(100.0)), Action::linear(pose(200.0))]
        .into_iter()
        .collect();
    let states = Arc::new(BroadcastStateStream::new(16));
    let context = MovementControllerContext::new(actions, "traj-42", states);
    let (transport, mut endpoint) = channel_transport(16);

    let sim = tokio::spawn(async move {
        match endpoint.request_rx.recv().await {
            Some(MovementRequest::Initialize(init)) => {
                assert_eq!(init.trajectory_id, "traj-42");
                endpoint
                    .response_tx
                    .send(MovementResponse::Initialize(InitializeMovementResponse {
                        error: None,
                    }))
                    .await
                    .unwrap();
            }
            other => panic!("expected initialize request, got {other:?}"),
        }
        endpoint
    });

    let attached = service.attach_cursor(context, 2.0, transport).await.unwrap();
    let handle = attached.handle();
    assert_eq!(handle.current_location(), 0.0);
    assert_eq!(handle.snapshot().end_location, 2.0);

    let _endpoint = sim.await.unwrap();
    attached.detach().await.unwrap();
}
