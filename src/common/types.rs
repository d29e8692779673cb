use serde::{Deserialize, Serialize};

/// 6-DOF pose of the tool center point: position in millimeters plus a
/// rotation vector in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f64; 3],
    pub orientation: [f64; 3],
}

impl Pose {
    pub fn new(position: [f64; 3], orientation: [f64; 3]) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn from_position(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: [x, y, z],
            orientation: [0.0, 0.0, 0.0],
        }
    }
}

/// Limits and blending applied to a single motion. All fields are optional;
/// the planner substitutes controller defaults for absent ones.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionSettings {
    pub tcp_velocity_limit: Option<f64>,
    pub tcp_acceleration_limit: Option<f64>,
    pub blending_radius: Option<f64>,
}

/// Value written to or read from a digital/analog I/O port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IoValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}
