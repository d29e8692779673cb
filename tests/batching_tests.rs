use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wayline::common::{PlanningError, PlanningResult, Pose};
use wayline::domains::actions::{Action, CombinedActions, MotionTarget};
use wayline::domains::planning::{
    combine_trajectories, find_shortest_distance, split_into_batches, BatchPlanner,
    JointSolutions, JointTrajectory, MotionCommand, TrajectoryPlanner,
};

fn pose(x: f64) -> Pose {
    Pose::from_position(x, 0.0, 0.0)
}

/// Planner double producing deterministic two-sample segments and recording
/// the start joints of every call.
struct MockPlanner {
    plan_starts: Mutex<Vec<Vec<f64>>>,
    collision_free_starts: Mutex<Vec<Vec<f64>>>,
    ik_solutions: JointSolutions,
    fail_plain: bool,
}

impl MockPlanner {
    fn new() -> Self {
        Self {
            plan_starts: Mutex::new(Vec::new()),
            collision_free_starts: Mutex::new(Vec::new()),
            ik_solutions: vec![vec![1.0, 0.0], vec![0.1, 0.0]],
            fail_plain: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail_plain: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl TrajectoryPlanner for MockPlanner {
    async fn plan_trajectory(
        &self,
        start_joints: &[f64],
        commands: &[MotionCommand],
    ) -> PlanningResult<JointTrajectory> {
        self.plan_starts.lock().unwrap().push(start_joints.to_vec());
        if self.fail_plain {
            return Err(PlanningError::PlanTrajectoryFailed {
                description: "pose out of workspace".to_string(),
                partial_trajectory: None,
            });
        }
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
        self.collision_free_starts
            .lock()
            .unwrap()
            .push(start_joints.to_vec());
        JointTrajectory::new(
            vec![0.0, 1.0],
            vec![start_joints.to_vec(), target_joints.to_vec()],
            vec![0.0, 1.0],
        )
    }

    async fn inverse_kinematics(&self, poses: &[Pose]) -> PlanningResult<Vec<JointSolutions>> {
        Ok(vec![self.ik_solutions.clone(); poses.len()])
    }

    async fn load_trajectory(&self, _trajectory: &JointTrajectory) -> PlanningResult<String> {
        Ok("traj-1".to_string())
    }
}

fn mixed_sequence() -> CombinedActions {
    [
        Action::linear(pose(100.0)),
        Action::cartesian_ptp(pose(200.0)),
        Action::collision_free(MotionTarget::Joints(vec![1.0, 1.0])).unwrap(),
        Action::linear(pose(300.0)),
        Action::wait(Duration::from_millis(100)),
        Action::wait(Duration::from_millis(100)),
        Action::linear(pose(400.0)),
        Action::linear(pose(500.0)),
    ]
    .into_iter()
    .collect()
}

#[test]
fn split_preserves_count_and_order_and_isolates_singletons() {
    let actions = mixed_sequence();
    let batches = split_into_batches(&actions);

    let flattened: Vec<Action> = batches.iter().flatten().cloned().collect();
    assert_eq!(flattened, actions.items().to_vec());

    assert!(batches.iter().all(|b| !b.is_empty()));
    for batch in &batches {
        let isolated = batch.iter().any(|a| {
            matches!(a, Action::CollisionFreeMotion { .. } | Action::Wait { .. })
        });
        if isolated {
            assert_eq!(batch.len(), 1);
        }
    }
    // [linear, ptp] [cf] [linear] [wait] [wait] [linear, linear]
    assert_eq!(batches.len(), 6);
    assert_eq!(batches[0].len(), 2);
    assert_eq!(batches[5].len(), 2);
}

#[test]
fn split_of_plain_run_yields_one_batch() {
    let actions: CombinedActions = [
        Action::linear(pose(1.0)),
        Action::write("k", wayline::common::IoValue::Bool(true)),
        Action::linear(pose(2.0)),
    ]
    .into_iter()
    .collect();
    let batches = split_into_batches(&actions);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 3);
}

#[test]
fn shortest_distance_picks_closest_solution_with_first_tie_break() {
    let start = vec![0.0, 0.0];
    let solutions = vec![vec![3.0, 0.0], vec![1.0, 0.0], vec![-1.0, 0.0]];
    // ties between index 1 and 2 resolve to the earlier candidate
    assert_eq!(find_shortest_distance(&start, &solutions), Some(1));
    assert_eq!(find_shortest_distance(&start, &[]), None);
}

#[test]
fn combine_offsets_and_drops_duplicated_boundary_sample() {
    let first = JointTrajectory::new(
        vec![0.0, 1.0],
        vec![vec![0.0], vec![1.0]],
        vec![0.0, 1.0],
    )
    .unwrap();
    let second = JointTrajectory::new(
        vec![0.0, 2.0],
        vec![vec![1.0], vec![3.0]],
        vec![0.0, 1.0],
    )
    .unwrap();

    let combined = combine_trajectories(vec![first, second]).unwrap();
    // the duplicated joint sample at the join is dropped
    assert_eq!(combined.sample_count(), 3);
    assert_eq!(combined.times(), &[0.0, 1.0, 3.0]);
    assert_eq!(combined.locations(), &[0.0, 1.0, 2.0]);
    assert!(combined.times().windows(2).all(|w| w[1] >= w[0]));
}

#[test]
fn combine_keeps_distinct_boundary_samples() {
    let first = JointTrajectory::new(vec![0.0, 1.0], vec![vec![0.0], vec![1.0]], vec![0.0, 1.0])
        .unwrap();
    let second = JointTrajectory::new(vec![0.0, 1.0], vec![vec![5.0], vec![6.0]], vec![0.0, 1.0])
        .unwrap();

    let combined = combine_trajectories(vec![first, second]).unwrap();
    assert_eq!(combined.sample_count(), 4);
    assert_eq!(combined.end_location(), 2.0);
}

#[test]
fn mismatched_parallel_arrays_are_rejected() {
    let result = JointTrajectory::new(vec![0.0, 1.0], vec![vec![0.0]], vec![0.0, 1.0]);
    assert!(matches!(
        result,
        Err(PlanningError::InvalidTrajectory { .. })
    ));
    let result = JointTrajectory::new(vec![1.0, 0.0], vec![vec![0.0], vec![1.0]], vec![0.0, 1.0]);
    assert!(matches!(
        result,
        Err(PlanningError::InvalidTrajectory { .. })
    ));
}

#[tokio::test]
async fn plan_threads_start_joints_through_batches() {
    let planner = Arc::new(MockPlanner::new());
    let batch_planner = BatchPlanner::new(planner.clone());

    let actions: CombinedActions = [
        Action::linear(pose(100.0)),
        Action::collision_free(MotionTarget::Joints(vec![9.0, 9.0])).unwrap(),
        Action::linear(pose(200.0)),
    ]
    .into_iter()
    .collect();

    let trajectory = batch_planner.plan(&actions, &[0.0, 0.0]).await.unwrap();

    let plan_starts = planner.plan_starts.lock().unwrap().clone();
    let cf_starts = planner.collision_free_starts.lock().unwrap().clone();
    assert_eq!(plan_starts.len(), 2);
    assert_eq!(plan_starts[0], vec![0.0, 0.0]);
    // first plain batch ends at start + 1
    assert_eq!(cf_starts, vec![vec![1.0, 1.0]]);
    // second plain batch starts where the collision-free segment ended
    assert_eq!(plan_starts[1], vec![9.0, 9.0]);

    assert!(trajectory.times().windows(2).all(|w| w[1] >= w[0]));
    assert!(trajectory.locations().windows(2).all(|w| w[1] >= w[0]));
}

#[tokio::test]
async fn collision_free_pose_target_goes_through_inverse_kinematics() {
    let planner = Arc::new(MockPlanner::new());
    let batch_planner = BatchPlanner::new(planner.clone());

    let actions: CombinedActions =
        [Action::collision_free(MotionTarget::Pose(pose(100.0))).unwrap()]
            .into_iter()
            .collect();

    let trajectory = batch_planner.plan(&actions, &[0.0, 0.0]).await.unwrap();
    // the mock's second solution is closest to the origin
    assert_eq!(trajectory.last_joints(), Some(&[0.1, 0.0][..]));
}

#[tokio::test]
async fn empty_ik_solution_set_fails_planning() {
    let planner = Arc::new(MockPlanner {
        ik_solutions: Vec::new(),
        ..MockPlanner::new()
    });
    let batch_planner = BatchPlanner::new(planner);

    let actions: CombinedActions =
        [Action::collision_free(MotionTarget::Pose(pose(100.0))).unwrap()]
            .into_iter()
            .collect();

    let result = batch_planner.plan(&actions, &[0.0, 0.0]).await;
    assert!(matches!(
        result,
        Err(PlanningError::NoInverseKinematicsSolutionFound)
    ));
}

#[tokio::test]
async fn conflicting_collision_scenes_in_one_batch_are_rejected() {
    let planner = Arc::new(MockPlanner::new());
    let batch_planner = BatchPlanner::new(planner);

    let actions: CombinedActions = [
        Action::linear(pose(100.0)).with_collision_scene("cell-1"),
        Action::linear(pose(200.0)).with_collision_scene("cell-2"),
    ]
    .into_iter()
    .collect();

    let result = batch_planner.plan(&actions, &[0.0]).await;
    match result {
        Err(PlanningError::InconsistentCollisionScenes { scenes }) => {
            assert_eq!(scenes, vec!["cell-1".to_string(), "cell-2".to_string()]);
        }
        other => panic!("expected InconsistentCollisionScenes, got {other:?}"),
    }
}

#[tokio::test]
async fn shared_collision_scene_is_accepted() {
    let planner = Arc::new(MockPlanner::new());
    let batch_planner = BatchPlanner::new(planner);

    let actions: CombinedActions = [
        Action::linear(pose(100.0)).with_collision_scene("cell-1"),
        Action::linear(pose(200.0)).with_collision_scene("cell-1"),
        Action::linear(pose(300.0)),
    ]
    .into_iter()
    .collect();

    assert!(batch_planner.plan(&actions, &[0.0]).await.is_ok());
}

#[tokio::test]
async fn planner_failure_surfaces_with_description() {
    let planner = Arc::new(MockPlanner::failing());
    let batch_planner = BatchPlanner::new(planner);

    let actions: CombinedActions = [Action::linear(pose(100.0))].into_iter().collect();
    let result = batch_planner.plan(&actions, &[0.0]).await;
    match result {
        Err(PlanningError::PlanTrajectoryFailed { description, .. }) => {
            assert!(description.contains("out of workspace"));
        }
        other => panic!("expected PlanTrajectoryFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn wait_holds_joints_constant_until_the_exact_duration() {
    let planner = Arc::new(MockPlanner::new());
    let batch_planner = BatchPlanner::new(planner.clone());

    let actions: CombinedActions = [Action::wait(Duration::from_millis(200))]
        .into_iter()
        .collect();
    let start = vec![0.5, -0.5];

    let trajectory = batch_planner.plan(&actions, &start).await.unwrap();
    // synthesized locally, never sent to the remote planner
    assert!(planner.plan_starts.lock().unwrap().is_empty());

    assert!(trajectory.sample_count() >= 2);
    assert_eq!(trajectory.end_time(), 0.2);
    assert!(trajectory.joint_positions().iter().all(|j| *j == start));
    assert!(trajectory.locations().iter().all(|l| *l == 0.0));
}

#[tokio::test]
async fn zero_length_wait_still_has_two_samples() {
    let planner = Arc::new(MockPlanner::new());
    let batch_planner = BatchPlanner::new(planner);

    let actions: CombinedActions = [Action::wait(Duration::ZERO)].into_iter().collect();
    let trajectory = batch_planner.plan(&actions, &[0.0]).await.unwrap();
    assert_eq!(trajectory.sample_count(), 2);
    assert_eq!(trajectory.end_time(), 0.0);
}

#[tokio::test]
async fn wait_between_motions_keeps_the_stitched_path_monotonic() {
    let planner = Arc::new(MockPlanner::new());
    let batch_planner = BatchPlanner::new(planner);

    let actions: CombinedActions = [
        Action::linear(pose(100.0)),
        Action::wait(Duration::from_millis(100)),
        Action::linear(pose(200.0)),
    ]
    .into_iter()
    .collect();

    let trajectory = batch_planner.plan(&actions, &[0.0]).await.unwrap();
    assert!(trajectory.times().windows(2).all(|w| w[1] >= w[0]));
    assert!(trajectory.locations().windows(2).all(|w| w[1] >= w[0]));
    // one location unit per motion; the wait does not advance the parameter
    assert_eq!(trajectory.end_location(), 2.0);
}
