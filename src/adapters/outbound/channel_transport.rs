use crate::domains::execution::{MovementRequest, MovementResponse};
use tokio::sync::mpsc;

/// Client half of the duplex movement stream: requests out, responses in.
pub struct ChannelTransport {
    pub request_tx: mpsc::Sender<MovementRequest>,
    pub response_rx: mpsc::Receiver<MovementResponse>,
}

/// Controller half of the duplex movement stream, handed to whatever speaks
/// for the motion controller (a gateway connection, or a simulator in tests).
pub struct ControllerEndpoint {
    pub request_rx: mpsc::Receiver<MovementRequest>,
    pub response_tx: mpsc::Sender<MovementResponse>,
}

/// Paired in-process duplex stream over two mpsc channels.
pub fn channel_transport(capacity: usize) -> (ChannelTransport, ControllerEndpoint) {
    let (request_tx, request_rx) = mpsc::channel(capacity);
    let (response_tx, response_rx) = mpsc::channel(capacity);
    (
        ChannelTransport {
            request_tx,
            response_rx,
        },
        ControllerEndpoint {
            request_rx,
            response_tx,
        },
    )
}
