use crate::common::{ExecutionError, ExecutionResult};
use crate::domains::actions::SetIo;
use crate::domains::execution::cursor::{
    CursorCommand, CursorNotification, CursorSnapshot, OperationOutcome, OperationPhase,
    OperationResult, OperationType,
};
use crate::domains::execution::{
    AsyncActionExecutor, Direction, ExecutionState, IoTrigger, MotionGroupState, MotionHold,
    MovementRequest, MovementResponse, PauseMovementRequest, StartMovementRequest,
};
use crate::domains::observer::{DynEventSink, MotionEvent, MotionEventKind};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, warn};
use uuid::Uuid;

/// Tolerance for the zero-overshoot contract at completion transitions.
const OVERSHOOT_TOLERANCE: f64 = 1e-6;

/// The in-flight operation's own start request, recorded by the combined
/// consumer so a motion hold can re-issue it on resume.
pub(crate) type ResumeRequestSlot = Arc<Mutex<Option<StartMovementRequest>>>;

/// Pause/resume hook for an executor attached to a cursor: pause sends a
/// pause request, resume re-issues the in-flight operation's start request
/// with its original direction and target. With no operation in flight,
/// resume leaves motion paused.
struct SlotChannelHold {
    request_tx: mpsc::Sender<MovementRequest>,
    resume_request: ResumeRequestSlot,
}

pub(crate) fn slot_channel_hold(
    request_tx: mpsc::Sender<MovementRequest>,
    resume_request: ResumeRequestSlot,
) -> Arc<dyn MotionHold> {
    Arc::new(SlotChannelHold {
        request_tx,
        resume_request,
    })
}

#[async_trait]
impl MotionHold for SlotChannelHold {
    async fn pause(&self) -> ExecutionResult<()> {
        self.request_tx
            .send(MovementRequest::Pause(PauseMovementRequest {}))
            .await
            .map_err(|_| ExecutionError::ConnectionLost("request stream closed".to_string()))
    }

    async fn resume(&self) -> ExecutionResult<()> {
        let request = self
            .resume_request
            .lock()
            .ok()
            .and_then(|slot| slot.clone());
        match request {
            Some(start) => self
                .request_tx
                .send(MovementRequest::Start(start))
                .await
                .map_err(|_| {
                    ExecutionError::ConnectionLost("request stream closed".to_string())
                }),
            None => Ok(()),
        }
    }
}

/// Everything one cursor invocation needs; owned by the supervisor task.
pub(crate) struct CursorRuntime {
    pub trajectory_id: String,
    pub request_tx: mpsc::Sender<MovementRequest>,
    pub response_rx: mpsc::Receiver<MovementResponse>,
    pub state_rx: mpsc::Receiver<MotionGroupState>,
    pub command_rx: mpsc::Receiver<CursorCommand>,
    pub notifications: broadcast::Sender<CursorNotification>,
    pub snapshot_tx: watch::Sender<CursorSnapshot>,
    pub executor: Option<AsyncActionExecutor>,
    pub resume_request: ResumeRequestSlot,
    pub sink: Option<DynEventSink>,
    pub set_ios: Vec<SetIo>,
    pub start_on_io: Option<IoTrigger>,
    pub pause_on_io: Option<IoTrigger>,
    pub initial_location: f64,
    pub end_location: f64,
    pub action_count: usize,
    pub publish_interval: Duration,
    pub queue_capacity: usize,
}

enum CursorEvent {
    State(MotionGroupState),
    Response(MovementResponse),
    Command {
        operation_type: OperationType,
        explicit_target: Option<f64>,
        responder: oneshot::Sender<OperationResult>,
    },
    Shutdown,
}

/// Supervisor for one cursor invocation. Starts the state consumer, the
/// response consumer, the command loop and the periodic publisher, then runs
/// the combined consumer until shutdown or a fatal error. Every spawned
/// worker is aborted and awaited before this returns.
pub(crate) async fn run_cursor(runtime: CursorRuntime) -> ExecutionResult<()> {
    let CursorRuntime {
        trajectory_id,
        request_tx,
        mut response_rx,
        mut state_rx,
        mut command_rx,
        notifications,
        snapshot_tx,
        executor,
        resume_request,
        sink,
        set_ios,
        start_on_io,
        pause_on_io,
        initial_location,
        end_location,
        action_count,
        publish_interval,
        queue_capacity,
    } = runtime;

    let (queue_tx, queue_rx) = mpsc::channel(queue_capacity);

    // Worker (i): forward live states into the shared queue.
    let state_queue = queue_tx.clone();
    let state_worker: JoinHandle<()> = tokio::spawn(async move {
        while let Some(state) = state_rx.recv().await {
            if state_queue.send(CursorEvent::State(state)).await.is_err() {
                break;
            }
        }
    });

    // Worker (ii): forward protocol responses into the shared queue.
    let response_queue = queue_tx.clone();
    let response_worker: JoinHandle<()> = tokio::spawn(async move {
        while let Some(response) = response_rx.recv().await {
            if response_queue
                .send(CursorEvent::Response(response))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    // Worker (v): drain the public command queue; detach becomes the
    // shutdown sentinel that unwinds the whole group.
    let command_queue = queue_tx.clone();
    let command_worker: JoinHandle<()> = tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            match command {
                CursorCommand::Operation {
                    operation_type,
                    explicit_target,
                    responder,
                } => {
                    if command_queue
                        .send(CursorEvent::Command {
                            operation_type,
                            explicit_target,
                            responder,
                        })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                CursorCommand::Detach => {
                    let _ = command_queue.send(CursorEvent::Shutdown).await;
                    break;
                }
            }
        }
    });

    // Worker (iv): periodically describe the currently targeted action.
    let publisher_notifications = notifications.clone();
    let mut publisher_snapshot = snapshot_tx.subscribe();
    let publish_worker: JoinHandle<()> = tokio::spawn(async move {
        let mut ticker = interval(publish_interval);
        loop {
            ticker.tick().await;
            let snapshot = *publisher_snapshot.borrow_and_update();
            let action_index = if snapshot.action_count == 0 {
                None
            } else {
                Some(snapshot.next_action_index())
            };
            let _ = publisher_notifications.send(CursorNotification::TargetedAction {
                action_index,
                target_location: snapshot.target_location,
                timestamp: Utc::now(),
            });
        }
    });

    // Worker (iii): the combined consumer, sole owner of cursor state.
    drop(queue_tx);
    let mut consumer = CombinedConsumer {
        trajectory_id,
        request_tx,
        notifications,
        snapshot_tx,
        executor,
        resume_request,
        sink,
        set_ios,
        start_on_io,
        pause_on_io,
        current_location: initial_location,
        overshoot: 0.0,
        end_location,
        action_count,
        slot: None,
        trajectory_ended: false,
    };
    let result = consumer.run(queue_rx).await;

    for worker in [state_worker, response_worker, command_worker, publish_worker] {
        worker.abort();
        if let Err(join_err) = worker.await {
            if !join_err.is_cancelled() {
                warn!(%join_err, "cursor worker failed during shutdown");
            }
        }
    }
    result
}

/// The single in-flight operation.
struct OperationSlot {
    operation_id: Uuid,
    operation_type: OperationType,
    phase: OperationPhase,
    start_location: f64,
    target_location: Option<f64>,
    responder: oneshot::Sender<OperationResult>,
}

struct CombinedConsumer {
    trajectory_id: String,
    request_tx: mpsc::Sender<MovementRequest>,
    notifications: broadcast::Sender<CursorNotification>,
    snapshot_tx: watch::Sender<CursorSnapshot>,
    executor: Option<AsyncActionExecutor>,
    resume_request: ResumeRequestSlot,
    sink: Option<DynEventSink>,
    set_ios: Vec<SetIo>,
    start_on_io: Option<IoTrigger>,
    pause_on_io: Option<IoTrigger>,
    current_location: f64,
    overshoot: f64,
    end_location: f64,
    action_count: usize,
    slot: Option<OperationSlot>,
    trajectory_ended: bool,
}

impl CombinedConsumer {
    async fn run(&mut self, mut queue_rx: mpsc::Receiver<CursorEvent>) -> ExecutionResult<()> {
        while let Some(event) = queue_rx.recv().await {
            match event {
                CursorEvent::State(state) => self.on_state(state).await?,
                CursorEvent::Response(response) => self.on_response(response)?,
                CursorEvent::Command {
                    operation_type,
                    explicit_target,
                    responder,
                } => {
                    self.on_command(operation_type, explicit_target, responder)
                        .await?
                }
                CursorEvent::Shutdown => {
                    self.resolve_slot(OperationPhase::Cancelled);
                    if let Some(ex) = self.executor.as_mut() {
                        // After a normal trajectory end, in-flight handlers
                        // drain to completion; only an aborted run cancels.
                        if self.trajectory_ended {
                            ex.wait_for_all_actions().await?;
                        } else {
                            ex.cancel_all_actions().await;
                        }
                    }
                    debug!(trajectory_id = %self.trajectory_id, "cursor detached");
                    return Ok(());
                }
            }
        }
        Err(ExecutionError::ConnectionLost(
            "cursor event queue closed".to_string(),
        ))
    }

    async fn on_state(&mut self, state: MotionGroupState) -> ExecutionResult<()> {
        if let Some(execute) = &state.execute {
            self.current_location = execute.location;
            let _ = self.notifications.send(CursorNotification::Position {
                location: execute.location,
                timestamp: Utc::now(),
            });
            if let Some(ex) = self.executor.as_mut() {
                ex.check_and_trigger(execute.location, &state).await?;
            }
        }

        if let Some(slot) = self.slot.as_mut() {
            if slot.phase == OperationPhase::Commanded
                && state.execution_state() == Some(ExecutionState::Running)
            {
                slot.phase = OperationPhase::Running;
                publish_phase(&self.sink, slot.operation_type, OperationPhase::Running);
            }
        }

        if state.execution_state() == Some(ExecutionState::Ended) {
            self.trajectory_ended = true;
        }

        let stopped = match state.execution_state() {
            None => state.standstill,
            Some(ExecutionState::PausedByUser) | Some(ExecutionState::Ended) => true,
            Some(ExecutionState::Running) => false,
        };
        // A stop frame only completes an operation the controller actually
        // ran; a stale standstill arriving between the start acknowledgement
        // and the first running state must not resolve the slot at its start
        // location. Pause is the exception: it completes at the standstill
        // transition without ever reporting a running state.
        let completes = stopped
            && self.slot.as_ref().is_some_and(|slot| {
                slot.phase == OperationPhase::Running
                    || slot.operation_type == OperationType::Pause
            });
        if completes {
            self.resolve_slot(OperationPhase::Completed);
        }

        self.publish_snapshot();
        Ok(())
    }

    fn on_response(&mut self, response: MovementResponse) -> ExecutionResult<()> {
        match response {
            MovementResponse::Error(error) => {
                let location = self.current_location;
                if let Some(slot) = self.slot.take() {
                    let result = OperationResult {
                        operation_id: slot.operation_id,
                        operation_type: slot.operation_type,
                        start_location: slot.start_location,
                        target_location: slot.target_location,
                        final_location: location,
                        overshoot: 0.0,
                        outcome: OperationOutcome::Failed(ExecutionError::ErrorDuringMovement {
                            trajectory_id: self.trajectory_id.clone(),
                            location,
                            message: error.message.clone(),
                        }),
                    };
                    publish_phase(&self.sink, slot.operation_type, OperationPhase::Failed);
                    let _ = slot.responder.send(result);
                }
                Err(ExecutionError::ErrorDuringMovement {
                    trajectory_id: self.trajectory_id.clone(),
                    location,
                    message: error.message,
                })
            }
            MovementResponse::Start(_) => {
                debug!(trajectory_id = %self.trajectory_id, "start acknowledged");
                Ok(())
            }
            MovementResponse::Initialize(init) => match init.error {
                Some(error) => Err(ExecutionError::InitMovementFailed {
                    trajectory_id: self.trajectory_id.clone(),
                    reason: error,
                }),
                None => Ok(()),
            },
        }
    }

    async fn on_command(
        &mut self,
        operation_type: OperationType,
        explicit_target: Option<f64>,
        responder: oneshot::Sender<OperationResult>,
    ) -> ExecutionResult<()> {
        // Starting a new operation cancels the previous one's future.
        self.resolve_slot(OperationPhase::Cancelled);

        let current = self.current_location;
        let target = match operation_type {
            OperationType::Forward => Some(self.end_location),
            OperationType::Backward => Some(0.0),
            OperationType::ForwardTo | OperationType::BackwardTo => explicit_target,
            OperationType::ForwardToNextAction => Some(self.next_boundary()),
            OperationType::BackwardToPreviousAction => Some(self.previous_boundary()),
            OperationType::Pause => None,
        };

        if let Some(target) = target {
            let rejection = if target < 0.0 || target > self.end_location {
                Some(format!(
                    "target is outside the trajectory range [0, {}]",
                    self.end_location
                ))
            } else if operation_type.moves_forward() && target <= current {
                Some("target must be ahead of the current location".to_string())
            } else if operation_type.moves_backward() && target >= current {
                Some("target must be behind the current location".to_string())
            } else {
                None
            };
            if let Some(reason) = rejection {
                let _ = responder.send(OperationResult {
                    operation_id: Uuid::new_v4(),
                    operation_type,
                    start_location: current,
                    target_location: Some(target),
                    final_location: current,
                    overshoot: self.overshoot,
                    outcome: OperationOutcome::Failed(ExecutionError::InvalidLocation {
                        requested: target,
                        reason,
                    }),
                });
                return Ok(());
            }
        }

        let mut slot = OperationSlot {
            operation_id: Uuid::new_v4(),
            operation_type,
            phase: OperationPhase::Initial,
            start_location: current,
            target_location: target,
            responder,
        };

        let request = match operation_type {
            OperationType::Pause => MovementRequest::Pause(PauseMovementRequest {}),
            _ => {
                let direction = if operation_type.moves_forward() {
                    Direction::Forward
                } else {
                    Direction::Backward
                };
                MovementRequest::Start(StartMovementRequest {
                    direction,
                    set_ios: self.set_ios.clone(),
                    start_on_io: self.start_on_io.clone(),
                    pause_on_io: self.pause_on_io.clone(),
                    target_location: target,
                })
            }
        };
        // Record the start request so a motion hold resuming around a
        // blocking action re-issues this operation's direction and target.
        if let Ok(mut resume) = self.resume_request.lock() {
            *resume = match &request {
                MovementRequest::Start(start) => Some(start.clone()),
                _ => None,
            };
        }
        self.request_tx
            .send(request)
            .await
            .map_err(|_| ExecutionError::ConnectionLost("request stream closed".to_string()))?;

        slot.phase = OperationPhase::Commanded;
        publish_phase(&self.sink, operation_type, OperationPhase::Commanded);
        self.slot = Some(slot);
        self.publish_snapshot();
        Ok(())
    }

    /// Resolve the in-flight operation, if any. For completions of targeted
    /// operations the protocol guarantees motion stopped exactly on target;
    /// a non-zero overshoot means server and client disagree about the
    /// trajectory and is a programming error, never silently corrected.
    fn resolve_slot(&mut self, phase: OperationPhase) {
        let Some(slot) = self.slot.take() else {
            return;
        };
        if let Ok(mut resume) = self.resume_request.lock() {
            *resume = None;
        }
        let outcome = match phase {
            OperationPhase::Completed => OperationOutcome::Completed,
            _ => OperationOutcome::Cancelled,
        };
        let overshoot = match slot.target_location {
            Some(target) if phase == OperationPhase::Completed => self.current_location - target,
            _ => 0.0,
        };
        if phase == OperationPhase::Completed {
            debug_assert!(
                overshoot.abs() < OVERSHOOT_TOLERANCE,
                "overshoot {overshoot} at completion of {:?}: server/client desynchronization",
                slot.operation_type
            );
            self.overshoot = overshoot;
        }
        publish_phase(&self.sink, slot.operation_type, phase);
        let _ = slot.responder.send(OperationResult {
            operation_id: slot.operation_id,
            operation_type: slot.operation_type,
            start_location: slot.start_location,
            target_location: slot.target_location,
            final_location: self.current_location,
            overshoot,
            outcome,
        });
    }

    fn next_boundary(&self) -> f64 {
        let boundary = (self.current_location - self.overshoot).ceil();
        clamp_boundary(boundary, self.action_count)
    }

    fn previous_boundary(&self) -> f64 {
        let boundary = (self.current_location - 1.0 - self.overshoot).ceil();
        clamp_boundary(boundary, self.action_count)
    }

    fn publish_snapshot(&self) {
        let _ = self.snapshot_tx.send(CursorSnapshot {
            current_location: self.current_location,
            target_location: self.slot.as_ref().and_then(|s| s.target_location),
            overshoot: self.overshoot,
            end_location: self.end_location,
            action_count: self.action_count,
        });
    }
}

fn clamp_boundary(boundary: f64, action_count: usize) -> f64 {
    if action_count == 0 {
        return 0.0;
    }
    boundary.clamp(0.0, (action_count - 1) as f64)
}

fn publish_phase(sink: &Option<DynEventSink>, operation: OperationType, phase: OperationPhase) {
    if let Some(sink) = sink {
        sink.publish(&MotionEvent::now(MotionEventKind::OperationTransition {
            operation: format!("{:?}", operation),
            phase: format!("{:?}", phase),
        }));
    }
}
