pub mod operation;
mod worker;

pub use operation::*;

use crate::common::{ExecutionError, ExecutionResult};
use crate::domains::execution::{
    InitializeMovementRequest, MovementControllerContext, MovementRequest, MovementResponse,
};
use crate::domains::observer::DynEventSink;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use worker::{run_cursor, slot_channel_hold, CursorRuntime, ResumeRequestSlot};

/// Externally visible cursor events, republished by the combined consumer
/// and the periodic publisher.
#[derive(Debug, Clone)]
pub enum CursorNotification {
    Position {
        location: f64,
        timestamp: DateTime<Utc>,
    },
    TargetedAction {
        action_index: Option<usize>,
        target_location: Option<f64>,
        timestamp: DateTime<Utc>,
    },
}

/// Consistent view of the cursor state, updated by the combined consumer.
#[derive(Debug, Clone, Copy)]
pub struct CursorSnapshot {
    pub current_location: f64,
    pub target_location: Option<f64>,
    pub overshoot: f64,
    pub end_location: f64,
    pub action_count: usize,
}

impl CursorSnapshot {
    pub fn current_action_index(&self) -> usize {
        current_action_index(self.current_location, self.action_count)
    }

    pub fn next_action_index(&self) -> usize {
        next_action_index(self.current_location, self.overshoot, self.action_count)
    }

    pub fn previous_action_index(&self) -> Option<usize> {
        previous_action_index(self.current_location, self.overshoot, self.action_count)
    }

    pub fn movement_options(&self) -> Vec<MovementOption> {
        movement_options(self.current_location, self.end_location)
    }
}

pub(crate) enum CursorCommand {
    Operation {
        operation_type: OperationType,
        explicit_target: Option<f64>,
        responder: oneshot::Sender<OperationResult>,
    },
    Detach,
}

/// Future of one submitted operation. Resolves when the operation completes,
/// fails, or is cancelled by a newer one.
pub struct PendingOperation {
    rx: oneshot::Receiver<OperationResult>,
}

impl PendingOperation {
    pub async fn wait(self) -> ExecutionResult<OperationResult> {
        self.rx.await.map_err(|_| {
            ExecutionError::ConnectionLost(
                "cursor stopped before the operation resolved".to_string(),
            )
        })
    }
}

/// Cloneable handle for steering a running cursor.
#[derive(Clone)]
pub struct CursorHandle {
    command_tx: mpsc::Sender<CursorCommand>,
    notifications: broadcast::Sender<CursorNotification>,
    snapshot_rx: watch::Receiver<CursorSnapshot>,
}

impl CursorHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<CursorNotification> {
        self.notifications.subscribe()
    }

    pub fn snapshot(&self) -> CursorSnapshot {
        *self.snapshot_rx.borrow()
    }

    pub fn current_location(&self) -> f64 {
        self.snapshot().current_location
    }

    pub fn overshoot(&self) -> f64 {
        self.snapshot().overshoot
    }

    pub fn movement_options(&self) -> Vec<MovementOption> {
        self.snapshot().movement_options()
    }

    pub async fn forward(&self) -> ExecutionResult<PendingOperation> {
        self.submit(OperationType::Forward, None).await
    }

    pub async fn forward_to(&self, location: f64) -> ExecutionResult<PendingOperation> {
        self.submit(OperationType::ForwardTo, Some(location)).await
    }

    pub async fn forward_to_next_action(&self) -> ExecutionResult<PendingOperation> {
        self.submit(OperationType::ForwardToNextAction, None).await
    }

    pub async fn backward(&self) -> ExecutionResult<PendingOperation> {
        self.submit(OperationType::Backward, None).await
    }

    pub async fn backward_to(&self, location: f64) -> ExecutionResult<PendingOperation> {
        self.submit(OperationType::BackwardTo, Some(location)).await
    }

    pub async fn backward_to_previous_action(&self) -> ExecutionResult<PendingOperation> {
        self.submit(OperationType::BackwardToPreviousAction, None)
            .await
    }

    pub async fn pause(&self) -> ExecutionResult<PendingOperation> {
        self.submit(OperationType::Pause, None).await
    }

    /// Unwind the whole worker group cleanly.
    pub async fn detach(&self) -> ExecutionResult<()> {
        self.command_tx
            .send(CursorCommand::Detach)
            .await
            .map_err(|_| ExecutionError::ConnectionLost("cursor already stopped".to_string()))
    }

    async fn submit(
        &self,
        operation_type: OperationType,
        explicit_target: Option<f64>,
    ) -> ExecutionResult<PendingOperation> {
        let (responder, rx) = oneshot::channel();
        self.command_tx
            .send(CursorCommand::Operation {
                operation_type,
                explicit_target,
                responder,
            })
            .await
            .map_err(|_| ExecutionError::ConnectionLost("cursor already stopped".to_string()))?;
        Ok(PendingOperation { rx })
    }
}

/// A cursor whose worker group is running. `detach` unwinds the group;
/// nothing keeps running past `join`.
pub struct AttachedCursor {
    handle: CursorHandle,
    supervisor: JoinHandle<ExecutionResult<()>>,
}

impl AttachedCursor {
    pub fn handle(&self) -> CursorHandle {
        self.handle.clone()
    }

    /// Wait for the worker group to unwind; returns the first fatal error,
    /// if any.
    pub async fn join(self) -> ExecutionResult<()> {
        match self.supervisor.await {
            Ok(result) => result,
            Err(join_err) => Err(ExecutionError::Infrastructure(anyhow::anyhow!(
                "cursor supervisor panicked: {join_err}"
            ))),
        }
    }

    /// Detach and wait for the group to finish.
    pub async fn detach(self) -> ExecutionResult<()> {
        self.handle.detach().await?;
        self.join().await
    }
}

/// Interactive protocol driver. Speaks the same wire protocol as the
/// fire-and-forget driver but exposes mutating operations so a caller can
/// scrub execution forward and backward while it runs.
pub struct TrajectoryCursor {
    context: MovementControllerContext,
    end_location: f64,
    initial_location: f64,
    publish_interval: Duration,
    queue_capacity: usize,
    sink: Option<DynEventSink>,
}

impl TrajectoryCursor {
    pub fn new(context: MovementControllerContext, end_location: f64) -> Self {
        Self {
            context,
            end_location,
            initial_location: 0.0,
            publish_interval: Duration::from_millis(500),
            queue_capacity: 64,
            sink: None,
        }
    }

    pub fn with_initial_location(mut self, location: f64) -> Self {
        self.initial_location = location;
        self
    }

    pub fn with_publish_interval(mut self, interval: Duration) -> Self {
        self.publish_interval = interval;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_event_sink(mut self, sink: DynEventSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Initialize movement on the controller and start the worker group:
    /// state consumer, response consumer, combined consumer, periodic
    /// publisher and the command loop. All of them are started before the
    /// first operation can be submitted.
    pub async fn attach(
        mut self,
        request_tx: mpsc::Sender<MovementRequest>,
        mut response_rx: mpsc::Receiver<MovementResponse>,
    ) -> ExecutionResult<AttachedCursor> {
        let trajectory_id = self.context.trajectory_id.clone();

        request_tx
            .send(MovementRequest::Initialize(InitializeMovementRequest {
                trajectory_id: trajectory_id.clone(),
                initial_location: self.initial_location,
            }))
            .await
            .map_err(|_| ExecutionError::ConnectionLost("request stream closed".to_string()))?;
        let response = response_rx
            .recv()
            .await
            .ok_or_else(|| ExecutionError::ConnectionLost("response stream closed".to_string()))?;
        match response {
            MovementResponse::Initialize(init) => {
                if let Some(error) = init.error {
                    return Err(ExecutionError::InitMovementFailed {
                        trajectory_id,
                        reason: error,
                    });
                }
            }
            other => {
                return Err(ExecutionError::InitMovementFailed {
                    trajectory_id,
                    reason: format!("unexpected response to initialize request: {:?}", other),
                })
            }
        }

        let action_count = self.context.combined_actions.motion_count();
        let set_ios = self.context.combined_actions.to_set_io_list();
        let state_rx = self.context.state_stream.subscribe();

        let resume_request: ResumeRequestSlot = Arc::new(Mutex::new(None));
        let mut executor = self.context.executor.take();
        if let Some(ex) = executor.as_mut() {
            if !ex.has_motion_hold() {
                ex.set_motion_hold(slot_channel_hold(
                    request_tx.clone(),
                    resume_request.clone(),
                ));
            }
        }

        let (command_tx, command_rx) = mpsc::channel(self.queue_capacity);
        let (notifications, _) = broadcast::channel(self.queue_capacity.max(16));
        let (snapshot_tx, snapshot_rx) = watch::channel(CursorSnapshot {
            current_location: self.initial_location,
            target_location: None,
            overshoot: 0.0,
            end_location: self.end_location,
            action_count,
        });

        let runtime = CursorRuntime {
            trajectory_id,
            request_tx,
            response_rx,
            state_rx,
            command_rx,
            notifications: notifications.clone(),
            snapshot_tx,
            executor,
            resume_request,
            sink: self.sink,
            set_ios,
            start_on_io: self.context.start_on_io.clone(),
            pause_on_io: self.context.pause_on_io.clone(),
            initial_location: self.initial_location,
            end_location: self.end_location,
            action_count,
            publish_interval: self.publish_interval,
            queue_capacity: self.queue_capacity,
        };
        let supervisor = tokio::spawn(run_cursor(runtime));

        Ok(AttachedCursor {
            handle: CursorHandle {
                command_tx,
                notifications,
                snapshot_rx,
            },
            supervisor,
        })
    }
}
