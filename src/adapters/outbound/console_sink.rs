use crate::domains::observer::{DynEventSink, MotionEvent, MotionEventSink};
use std::sync::Arc;
use tracing::info;

struct ConsoleBridge;

impl MotionEventSink for ConsoleBridge {
    fn publish(&self, event: &MotionEvent) {
        info!(timestamp = %event.timestamp.to_rfc3339(), kind = ?event.kind, "motion event");
    }
}

/// Initialize a simple tracing-backed event sink (useful as a fallback)
pub fn init_console_sink() -> DynEventSink {
    Arc::new(ConsoleBridge {})
}
