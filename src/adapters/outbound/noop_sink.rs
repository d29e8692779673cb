use crate::domains::observer::{DynEventSink, MotionEvent, MotionEventSink};
use std::sync::Arc;

struct NoOp;

impl MotionEventSink for NoOp {
    fn publish(&self, _event: &MotionEvent) {}
}

/// No-op sink useful as default in unit tests
pub fn init_noop_sink() -> DynEventSink {
    Arc::new(NoOp {})
}
