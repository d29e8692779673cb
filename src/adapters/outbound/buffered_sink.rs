use crate::domains::observer::{DynEventSink, MotionEvent, MotionEventSink};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Non-blocking buffered sink. Events are forwarded to the provided `bridge`
/// from a background task. `capacity` controls the channel buffer size.
pub fn init_buffered_sink(bridge: DynEventSink, capacity: usize) -> DynEventSink {
    let (tx, mut rx) = mpsc::channel::<MotionEvent>(capacity);

    let bridge_task = bridge.clone();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            bridge_task.publish(&event);
        }
    });

    struct BufferedSink {
        sender: mpsc::Sender<MotionEvent>,
    }

    impl MotionEventSink for BufferedSink {
        fn publish(&self, event: &MotionEvent) {
            // Non-blocking: try_send, drop on full
            let _ = self.sender.try_send(event.clone());
        }
    }

    Arc::new(BufferedSink { sender: tx })
}
