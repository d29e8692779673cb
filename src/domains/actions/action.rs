use crate::common::{IoValue, MotionSettings, PlanningError, PlanningResult, Pose};
use crate::domains::planning::{MotionCommand, MotionKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Target of a motion: either a TCP pose or a joint-space configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MotionTarget {
    Pose(Pose),
    Joints(Vec<f64>),
}

/// A registered side-effect handler invocation, dispatched by the
/// [`AsyncActionExecutor`](crate::domains::execution::AsyncActionExecutor)
/// when execution passes the action's path location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncActionSpec {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: serde_json::Map<String, Value>,
    pub blocking: bool,
    pub timeout: Option<Duration>,
}

/// One step of a program: either a motion the planner interpolates, or a
/// side effect anchored between two motions. Closed union; new behavior is
/// added by extending the enum, never by open-ended subclassing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Linear {
        target: Pose,
        settings: MotionSettings,
        collision_scene: Option<String>,
    },
    CartesianPtp {
        target: Pose,
        settings: MotionSettings,
        collision_scene: Option<String>,
    },
    Circular {
        target: Pose,
        intermediate: Pose,
        settings: MotionSettings,
        collision_scene: Option<String>,
    },
    JointPtp {
        target: Vec<f64>,
        settings: MotionSettings,
        collision_scene: Option<String>,
    },
    Spline {
        waypoints: Vec<Pose>,
        settings: MotionSettings,
        collision_scene: Option<String>,
    },
    /// Planned through the dedicated collision-free endpoint, never batched
    /// together with other motions.
    CollisionFreeMotion {
        target: MotionTarget,
        settings: MotionSettings,
        collision_scene: Option<String>,
    },
    Write {
        key: String,
        value: IoValue,
        device: Option<String>,
    },
    Wait { duration: Duration },
    Async(AsyncActionSpec),
}

impl Action {
    pub fn linear(target: Pose) -> Self {
        Self::Linear {
            target,
            settings: MotionSettings::default(),
            collision_scene: None,
        }
    }

    pub fn cartesian_ptp(target: Pose) -> Self {
        Self::CartesianPtp {
            target,
            settings: MotionSettings::default(),
            collision_scene: None,
        }
    }

    pub fn circular(target: Pose, intermediate: Pose) -> Self {
        Self::Circular {
            target,
            intermediate,
            settings: MotionSettings::default(),
            collision_scene: None,
        }
    }

    pub fn joint_ptp(target: Vec<f64>) -> PlanningResult<Self> {
        if target.is_empty() {
            return Err(PlanningError::InvalidTarget {
                reason: "joint target must not be empty".to_string(),
            });
        }
        Ok(Self::JointPtp {
            target,
            settings: MotionSettings::default(),
            collision_scene: None,
        })
    }

    pub fn spline(waypoints: Vec<Pose>) -> PlanningResult<Self> {
        if waypoints.is_empty() {
            return Err(PlanningError::InvalidTarget {
                reason: "spline requires at least one waypoint".to_string(),
            });
        }
        Ok(Self::Spline {
            waypoints,
            settings: MotionSettings::default(),
            collision_scene: None,
        })
    }

    pub fn collision_free(target: MotionTarget) -> PlanningResult<Self> {
        if let MotionTarget::Joints(joints) = &target {
            if joints.is_empty() {
                return Err(PlanningError::InvalidTarget {
                    reason: "collision-free joint target must not be empty".to_string(),
                });
            }
        }
        Ok(Self::CollisionFreeMotion {
            target,
            settings: MotionSettings::default(),
            collision_scene: None,
        })
    }

    pub fn write(key: impl Into<String>, value: IoValue) -> Self {
        Self::Write {
            key: key.into(),
            value,
            device: None,
        }
    }

    pub fn wait(duration: Duration) -> Self {
        Self::Wait { duration }
    }

    pub fn run(spec: AsyncActionSpec) -> Self {
        Self::Async(spec)
    }

    pub fn with_settings(mut self, new: MotionSettings) -> Self {
        match &mut self {
            Self::Linear { settings, .. }
            | Self::CartesianPtp { settings, .. }
            | Self::Circular { settings, .. }
            | Self::JointPtp { settings, .. }
            | Self::Spline { settings, .. }
            | Self::CollisionFreeMotion { settings, .. } => *settings = new,
            _ => {}
        }
        self
    }

    pub fn with_collision_scene(mut self, scene: impl Into<String>) -> Self {
        match &mut self {
            Self::Linear {
                collision_scene, ..
            }
            | Self::CartesianPtp {
                collision_scene, ..
            }
            | Self::Circular {
                collision_scene, ..
            }
            | Self::JointPtp {
                collision_scene, ..
            }
            | Self::Spline {
                collision_scene, ..
            }
            | Self::CollisionFreeMotion {
                collision_scene, ..
            } => *collision_scene = Some(scene.into()),
            _ => {}
        }
        self
    }

    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            Self::Linear { .. }
                | Self::CartesianPtp { .. }
                | Self::Circular { .. }
                | Self::JointPtp { .. }
                | Self::Spline { .. }
                | Self::CollisionFreeMotion { .. }
        )
    }

    pub fn collision_scene(&self) -> Option<&str> {
        match self {
            Self::Linear {
                collision_scene, ..
            }
            | Self::CartesianPtp {
                collision_scene, ..
            }
            | Self::Circular {
                collision_scene, ..
            }
            | Self::JointPtp {
                collision_scene, ..
            }
            | Self::Spline {
                collision_scene, ..
            }
            | Self::CollisionFreeMotion {
                collision_scene, ..
            } => collision_scene.as_deref(),
            _ => None,
        }
    }

    /// Projection into the planner's wire format. Non-motion actions have no
    /// motion command.
    pub fn to_motion_command(&self) -> Option<MotionCommand> {
        match self {
            Self::Linear {
                target, settings, ..
            } => Some(MotionCommand {
                kind: MotionKind::Linear,
                target: MotionTarget::Pose(*target),
                intermediate: None,
                waypoints: Vec::new(),
                settings: *settings,
            }),
            Self::CartesianPtp {
                target, settings, ..
            } => Some(MotionCommand {
                kind: MotionKind::CartesianPtp,
                target: MotionTarget::Pose(*target),
                intermediate: None,
                waypoints: Vec::new(),
                settings: *settings,
            }),
            Self::Circular {
                target,
                intermediate,
                settings,
                ..
            } => Some(MotionCommand {
                kind: MotionKind::Circular,
                target: MotionTarget::Pose(*target),
                intermediate: Some(*intermediate),
                waypoints: Vec::new(),
                settings: *settings,
            }),
            Self::JointPtp {
                target, settings, ..
            } => Some(MotionCommand {
                kind: MotionKind::JointPtp,
                target: MotionTarget::Joints(target.clone()),
                intermediate: None,
                waypoints: Vec::new(),
                settings: *settings,
            }),
            Self::Spline {
                waypoints,
                settings,
                ..
            } => waypoints.last().map(|last| MotionCommand {
                kind: MotionKind::Spline,
                target: MotionTarget::Pose(*last),
                intermediate: None,
                waypoints: waypoints.clone(),
                settings: *settings,
            }),
            Self::CollisionFreeMotion {
                target, settings, ..
            } => Some(MotionCommand {
                kind: MotionKind::CollisionFree,
                target: target.clone(),
                intermediate: None,
                waypoints: Vec::new(),
                settings: *settings,
            }),
            Self::Write { .. } | Self::Wait { .. } | Self::Async(_) => None,
        }
    }
}
