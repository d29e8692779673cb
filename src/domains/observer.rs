use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Domain-level event-sink port. This is the interface the visualization /
/// logging bridge plugs into; keep the API intentionally small and
/// non-fallible from the domain perspective.
pub trait MotionEventSink: Send + Sync + 'static {
    fn publish(&self, event: &MotionEvent);
}

pub type DynEventSink = Arc<dyn MotionEventSink>;

#[derive(Debug, Clone, Serialize)]
pub struct MotionEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: MotionEventKind,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotionEventKind {
    DriverStateChanged {
        trajectory_id: String,
        from: String,
        to: String,
    },
    TrajectoryPosition {
        trajectory_id: String,
        location: f64,
    },
    OperationTransition {
        operation: String,
        phase: String,
    },
    AsyncActionTriggered {
        name: String,
        location: f64,
        blocking: bool,
    },
}

impl MotionEvent {
    pub fn now(kind: MotionEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }
}
