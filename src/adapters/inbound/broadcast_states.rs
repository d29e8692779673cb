use crate::domains::execution::{MotionGroupState, StateStreamFactory};
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

/// State-stream factory backed by a broadcast channel. Every `subscribe`
/// call yields an independent stream, so the protocol driver and an attached
/// viewer can consume states concurrently.
pub struct BroadcastStateStream {
    tx: broadcast::Sender<MotionGroupState>,
    capacity: usize,
}

impl BroadcastStateStream {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Feed one state to all current subscribers.
    pub fn publish(&self, state: MotionGroupState) {
        let _ = self.tx.send(state);
    }

    pub fn sender(&self) -> broadcast::Sender<MotionGroupState> {
        self.tx.clone()
    }
}

impl StateStreamFactory for BroadcastStateStream {
    fn subscribe(&self) -> mpsc::Receiver<MotionGroupState> {
        let mut broadcast_rx = self.tx.subscribe();
        let (tx, rx) = mpsc::channel(self.capacity);
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(state) => {
                        if tx.send(state).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "state subscription lagged behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        rx
    }
}
