use crate::common::{PlanningError, PlanningResult};
use serde::{Deserialize, Serialize};

const BOUNDARY_EPSILON: f64 = 1e-9;

/// A sampled joint-space trajectory. The three arrays run in parallel:
/// `times` are seconds from trajectory start, `joint_positions` one joint
/// vector per sample, `locations` the path parameter per sample (one integer
/// unit per motion boundary, fractional within a motion).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointTrajectory {
    times: Vec<f64>,
    joint_positions: Vec<Vec<f64>>,
    locations: Vec<f64>,
}

impl JointTrajectory {
    pub fn new(
        times: Vec<f64>,
        joint_positions: Vec<Vec<f64>>,
        locations: Vec<f64>,
    ) -> PlanningResult<Self> {
        if times.len() != joint_positions.len() || times.len() != locations.len() {
            return Err(PlanningError::InvalidTrajectory {
                reason: format!(
                    "parallel arrays differ in length: {} times, {} joint samples, {} locations",
                    times.len(),
                    joint_positions.len(),
                    locations.len()
                ),
            });
        }
        if times.windows(2).any(|w| w[1] < w[0]) {
            return Err(PlanningError::InvalidTrajectory {
                reason: "times must be monotonically non-decreasing".to_string(),
            });
        }
        if locations.windows(2).any(|w| w[1] < w[0]) {
            return Err(PlanningError::InvalidTrajectory {
                reason: "locations must be monotonically non-decreasing".to_string(),
            });
        }
        Ok(Self {
            times,
            joint_positions,
            locations,
        })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn joint_positions(&self) -> &[Vec<f64>] {
        &self.joint_positions
    }

    pub fn locations(&self) -> &[f64] {
        &self.locations
    }

    pub fn sample_count(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn end_time(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    pub fn end_location(&self) -> f64 {
        self.locations.last().copied().unwrap_or(0.0)
    }

    pub fn last_joints(&self) -> Option<&[f64]> {
        self.joint_positions.last().map(Vec::as_slice)
    }
}

/// Concatenate partial trajectories end-to-end. Each successor's `times` and
/// `locations` are offset by the running totals so both stay monotonically
/// non-decreasing across the join; a duplicated boundary sample is dropped
/// when a segment starts exactly where the previous one ended.
pub fn combine_trajectories(segments: Vec<JointTrajectory>) -> PlanningResult<JointTrajectory> {
    let mut times = Vec::new();
    let mut joint_positions: Vec<Vec<f64>> = Vec::new();
    let mut locations = Vec::new();

    for segment in segments {
        let time_offset = times.last().copied().unwrap_or(0.0);
        let location_offset = locations.last().copied().unwrap_or(0.0);

        let mut skip_first = false;
        if let (Some(last_joints), Some(first_joints)) =
            (joint_positions.last(), segment.joint_positions.first())
        {
            let first_time = segment.times.first().copied().unwrap_or(0.0);
            skip_first = first_time.abs() < BOUNDARY_EPSILON && last_joints == first_joints;
        }
        let skip = usize::from(skip_first);

        times.extend(segment.times.iter().skip(skip).map(|t| t + time_offset));
        joint_positions.extend(segment.joint_positions.into_iter().skip(skip));
        locations.extend(
            segment
                .locations
                .iter()
                .skip(skip)
                .map(|l| l + location_offset),
        );
    }

    JointTrajectory::new(times, joint_positions, locations)
}
