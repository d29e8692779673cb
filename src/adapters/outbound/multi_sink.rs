use crate::domains::observer::{DynEventSink, MotionEvent, MotionEventSink};
use std::sync::Arc;

/// A simple multi-forwarding sink that forwards to two sink instances.
/// This allows optional file + console outputs without changing the
/// MotionEventSink trait.
pub struct MultiSink {
    primary: DynEventSink,
    secondary: Option<DynEventSink>,
}

impl MultiSink {
    pub fn new(primary: DynEventSink, secondary: Option<DynEventSink>) -> Self {
        Self { primary, secondary }
    }
}

impl MotionEventSink for MultiSink {
    fn publish(&self, event: &MotionEvent) {
        self.primary.publish(event);
        if let Some(secondary) = &self.secondary {
            secondary.publish(event);
        }
    }
}

/// Initialize a combined sink: try to initialize the file sink and attach
/// the console as secondary.
pub fn init_combined_sink(path: &str) -> DynEventSink {
    let console = crate::adapters::outbound::init_console_sink();
    match crate::adapters::outbound::init_file_sink(path) {
        Ok(file_sink) => Arc::new(MultiSink::new(file_sink, Some(console))) as DynEventSink,
        Err(_) => console,
    }
}
