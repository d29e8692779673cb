use crate::common::{PlanningError, PlanningResult};
use crate::domains::actions::{Action, CombinedActions, MotionTarget};
use crate::domains::planning::{combine_trajectories, JointTrajectory, TrajectoryPlanner};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Actions of these kinds use a dedicated planning endpoint and are always
/// isolated into singleton batches.
fn is_isolated(action: &Action) -> bool {
    matches!(
        action,
        Action::CollisionFreeMotion { .. } | Action::Wait { .. }
    )
}

/// Partition an action sequence into plannable batches: maximal runs of plain
/// actions, with every collision-free motion and every wait in a batch of its
/// own. Total count and relative order are preserved; no batch is empty.
pub fn split_into_batches(actions: &CombinedActions) -> Vec<Vec<Action>> {
    let mut batches = Vec::new();
    let mut current: Vec<Action> = Vec::new();
    let mut previous_isolated = false;

    for action in actions.items() {
        let isolated = is_isolated(action);
        if (isolated || previous_isolated) && !current.is_empty() {
            batches.push(std::mem::take(&mut current));
        }
        current.push(action.clone());
        previous_isolated = isolated;
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// Index of the solution minimizing Euclidean distance in joint space to
/// `start`. Ties go to the first candidate encountered.
pub fn find_shortest_distance(start: &[f64], solutions: &[Vec<f64>]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, candidate) in solutions.iter().enumerate() {
        let distance: f64 = start
            .iter()
            .zip(candidate.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}

/// Drives the external planner batch by batch and stitches the partial
/// trajectories into one. The last joint sample of each batch seeds the next.
pub struct BatchPlanner {
    planner: Arc<dyn TrajectoryPlanner>,
    wait_sample_interval: Duration,
}

impl BatchPlanner {
    pub fn new(planner: Arc<dyn TrajectoryPlanner>) -> Self {
        Self {
            planner,
            wait_sample_interval: Duration::from_millis(50),
        }
    }

    pub fn with_wait_sample_interval(mut self, interval: Duration) -> Self {
        self.wait_sample_interval = interval;
        self
    }

    pub async fn plan(
        &self,
        actions: &CombinedActions,
        start_joints: &[f64],
    ) -> PlanningResult<JointTrajectory> {
        let batches = split_into_batches(actions);
        info!(batch_count = batches.len(), "planning action sequence");

        let mut segments = Vec::with_capacity(batches.len());
        let mut current_joints = start_joints.to_vec();
        for (index, batch) in batches.iter().enumerate() {
            debug!(batch = index, actions = batch.len(), "planning batch");
            let segment = self.plan_batch(batch, &current_joints).await?;
            if let Some(last) = segment.last_joints() {
                current_joints = last.to_vec();
            }
            segments.push(segment);
        }
        combine_trajectories(segments)
    }

    async fn plan_batch(
        &self,
        batch: &[Action],
        start_joints: &[f64],
    ) -> PlanningResult<JointTrajectory> {
        match batch.first() {
            Some(Action::Wait { duration }) => self.synthesize_wait(*duration, start_joints),
            Some(Action::CollisionFreeMotion { target, .. }) => {
                self.plan_collision_free_batch(target, start_joints).await
            }
            _ => self.plan_plain_batch(batch, start_joints).await,
        }
    }

    async fn plan_plain_batch(
        &self,
        batch: &[Action],
        start_joints: &[f64],
    ) -> PlanningResult<JointTrajectory> {
        let mut scenes: Vec<String> = batch
            .iter()
            .filter_map(|a| a.collision_scene().map(str::to_string))
            .collect();
        scenes.sort();
        scenes.dedup();
        if scenes.len() > 1 {
            return Err(PlanningError::InconsistentCollisionScenes { scenes });
        }

        let commands: Vec<_> = batch
            .iter()
            .filter_map(Action::to_motion_command)
            .collect();
        self.planner.plan_trajectory(start_joints, &commands).await
    }

    async fn plan_collision_free_batch(
        &self,
        target: &MotionTarget,
        start_joints: &[f64],
    ) -> PlanningResult<JointTrajectory> {
        let target_joints = match target {
            MotionTarget::Joints(joints) => joints.clone(),
            MotionTarget::Pose(pose) => {
                let solution_sets = self.planner.inverse_kinematics(&[*pose]).await?;
                let solutions = solution_sets.into_iter().next().unwrap_or_default();
                let index = find_shortest_distance(start_joints, &solutions)
                    .ok_or(PlanningError::NoInverseKinematicsSolutionFound)?;
                solutions[index].clone()
            }
        };
        self.planner
            .plan_collision_free(start_joints, &target_joints)
            .await
    }

    /// A wait holds the current joint configuration constant, sampled at the
    /// configured interval, with the final sample forced to exactly the
    /// requested duration. The path parameter does not advance.
    fn synthesize_wait(
        &self,
        duration: Duration,
        joints: &[f64],
    ) -> PlanningResult<JointTrajectory> {
        let total = duration.as_secs_f64();
        let step = self.wait_sample_interval.as_secs_f64();

        let mut times = Vec::new();
        let mut t = 0.0;
        while t < total && step > 0.0 {
            times.push(t);
            t += step;
        }
        times.push(total);
        if times.len() < 2 {
            times.insert(0, 0.0);
        }

        let joint_positions = vec![joints.to_vec(); times.len()];
        let locations = vec![0.0; times.len()];
        JointTrajectory::new(times, joint_positions, locations)
    }
}
