use crate::common::{ExecutionError, ExecutionResult};
use crate::domains::execution::{
    AsyncActionExecutor, Direction, ExecutionState, InitializeMovementRequest, MotionGroupState,
    MotionHold, MovementControllerContext, MovementRequest, MovementResponse, PauseMovementRequest,
    StartMovementRequest,
};
use crate::domains::observer::{DynEventSink, MotionEvent, MotionEventKind};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Initializing,
    Starting,
    Running,
    Completed,
    Failed,
}

/// Pause/resume hook that holds motion by talking the movement protocol:
/// pause sends a pause request, resume re-issues the start request.
struct RequestChannelHold {
    request_tx: mpsc::Sender<MovementRequest>,
    resume_request: StartMovementRequest,
}

/// Build the default pause/resume hook for an executor attached to a driver.
pub(crate) fn request_channel_hold(
    request_tx: mpsc::Sender<MovementRequest>,
    set_ios: Vec<crate::domains::actions::SetIo>,
    start_on_io: Option<crate::domains::execution::IoTrigger>,
    pause_on_io: Option<crate::domains::execution::IoTrigger>,
) -> Arc<dyn MotionHold> {
    Arc::new(RequestChannelHold {
        request_tx,
        resume_request: StartMovementRequest {
            direction: Direction::Forward,
            set_ios,
            start_on_io,
            pause_on_io,
            target_location: None,
        },
    })
}

#[async_trait]
impl MotionHold for RequestChannelHold {
    async fn pause(&self) -> ExecutionResult<()> {
        self.request_tx
            .send(MovementRequest::Pause(PauseMovementRequest {}))
            .await
            .map_err(|_| ExecutionError::ConnectionLost("request stream closed".to_string()))
    }

    async fn resume(&self) -> ExecutionResult<()> {
        self.request_tx
            .send(MovementRequest::Start(self.resume_request.clone()))
            .await
            .map_err(|_| ExecutionError::ConnectionLost("request stream closed".to_string()))
    }
}

/// Fire-and-forget protocol driver: two-phase handshake, then monitoring
/// until the controller reports the trajectory ended. For interactive
/// scrubbing use [`TrajectoryCursor`](crate::domains::execution::TrajectoryCursor)
/// instead.
pub struct MovementProtocolDriver {
    context: MovementControllerContext,
    state: DriverState,
    monitor_start_timeout: Duration,
    sink: Option<DynEventSink>,
}

impl MovementProtocolDriver {
    pub fn new(context: MovementControllerContext) -> Self {
        Self {
            context,
            state: DriverState::Idle,
            monitor_start_timeout: Duration::from_secs(5),
            sink: None,
        }
    }

    pub fn with_monitor_start_timeout(mut self, timeout: Duration) -> Self {
        self.monitor_start_timeout = timeout;
        self
    }

    pub fn with_event_sink(mut self, sink: DynEventSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Stream the loaded trajectory end-to-end. Returns once the controller
    /// reports standstill after the trajectory ended, or with the first
    /// terminal error; no spawned worker outlives the call.
    pub async fn execute(
        mut self,
        request_tx: mpsc::Sender<MovementRequest>,
        mut response_rx: mpsc::Receiver<MovementResponse>,
    ) -> ExecutionResult<()> {
        let result = self.run(&request_tx, &mut response_rx).await;
        match &result {
            Ok(()) => self.transition(DriverState::Completed),
            Err(err) => {
                warn!(trajectory_id = %self.context.trajectory_id, %err, "movement failed");
                self.transition(DriverState::Failed);
            }
        }
        result
    }

    async fn run(
        &mut self,
        request_tx: &mpsc::Sender<MovementRequest>,
        response_rx: &mut mpsc::Receiver<MovementResponse>,
    ) -> ExecutionResult<()> {
        let trajectory_id = self.context.trajectory_id.clone();

        // Phase 1: initialize movement on the loaded trajectory.
        self.transition(DriverState::Initializing);
        self.send(
            request_tx,
            MovementRequest::Initialize(InitializeMovementRequest {
                trajectory_id: trajectory_id.clone(),
                initial_location: 0.0,
            }),
        )
        .await?;
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

        // Phase 2: bring up the state monitor before motion starts.
        let state_rx = self.context.state_stream.subscribe();
        let (started_tx, started_rx) = oneshot::channel();
        let (location_tx, location_rx) = watch::channel(0.0f64);
        let mut executor = self.context.executor.take();
        if let Some(ex) = executor.as_mut() {
            if !ex.has_motion_hold() {
                ex.set_motion_hold(request_channel_hold(
                    request_tx.clone(),
                    self.context.combined_actions.to_set_io_list(),
                    self.context.start_on_io.clone(),
                    self.context.pause_on_io.clone(),
                ));
            }
        }
        let mut monitor = tokio::spawn(monitor_states(
            state_rx,
            started_tx,
            location_tx,
            executor,
            trajectory_id.clone(),
            self.sink.clone(),
        ));
        let started = timeout(self.monitor_start_timeout, started_rx).await;
        if !matches!(started, Ok(Ok(()))) {
            monitor.abort();
            let _ = (&mut monitor).await;
            return Err(ExecutionError::InitMovementFailed {
                trajectory_id,
                reason: format!(
                    "state monitor did not start within {:?}",
                    self.monitor_start_timeout
                ),
            });
        }

        // Phase 3: start movement.
        self.transition(DriverState::Starting);
        self.send(request_tx, MovementRequest::Start(self.start_request()))
            .await?;
        let response = response_rx.recv().await;
        match response {
            Some(MovementResponse::Start(_)) => {}
            other => {
                monitor.abort();
                let _ = (&mut monitor).await;
                return Err(ExecutionError::InitMovementFailed {
                    trajectory_id,
                    reason: format!("unexpected response to start request: {:?}", other),
                });
            }
        }

        // Phase 4: race the monitor against a single-shot error reader.
        self.transition(DriverState::Running);
        tokio::select! {
            monitor_result = &mut monitor => match monitor_result {
                Ok(inner) => inner,
                Err(join_err) => Err(ExecutionError::Infrastructure(anyhow::anyhow!(
                    "state monitor panicked: {join_err}"
                ))),
            },
            response = response_rx.recv() => {
                monitor.abort();
                if let Err(join_err) = (&mut monitor).await {
                    if !join_err.is_cancelled() {
                        warn!(%join_err, "state monitor failed while shutting down");
                    }
                }
                let location = *location_rx.borrow();
                match response {
                    Some(MovementResponse::Error(error)) => Err(ExecutionError::ErrorDuringMovement {
                        trajectory_id,
                        location,
                        message: error.message,
                    }),
                    Some(other) => Err(ExecutionError::ErrorDuringMovement {
                        trajectory_id,
                        location,
                        message: format!("unexpected response during movement: {:?}", other),
                    }),
                    None => Err(ExecutionError::ConnectionLost(
                        "response stream closed during movement".to_string(),
                    )),
                }
            }
        }
    }

    fn start_request(&self) -> StartMovementRequest {
        StartMovementRequest {
            direction: Direction::Forward,
            set_ios: self.context.combined_actions.to_set_io_list(),
            start_on_io: self.context.start_on_io.clone(),
            pause_on_io: self.context.pause_on_io.clone(),
            target_location: None,
        }
    }

    async fn send(
        &self,
        request_tx: &mpsc::Sender<MovementRequest>,
        request: MovementRequest,
    ) -> ExecutionResult<()> {
        request_tx
            .send(request)
            .await
            .map_err(|_| ExecutionError::ConnectionLost("request stream closed".to_string()))
    }

    fn transition(&mut self, to: DriverState) {
        if self.state == to {
            return;
        }
        info!(
            trajectory_id = %self.context.trajectory_id,
            from = ?self.state,
            to = ?to,
            "movement driver state"
        );
        if let Some(sink) = &self.sink {
            sink.publish(&MotionEvent::now(MotionEventKind::DriverStateChanged {
                trajectory_id: self.context.trajectory_id.clone(),
                from: format!("{:?}", self.state),
                to: format!("{:?}", to),
            }));
        }
        self.state = to;
    }
}

/// Monitor worker: consumes the live state stream, feeds the executor,
/// and completes when a standstill follows a trajectory-ended event.
async fn monitor_states(
    mut state_rx: mpsc::Receiver<MotionGroupState>,
    started_tx: oneshot::Sender<()>,
    location_tx: watch::Sender<f64>,
    mut executor: Option<AsyncActionExecutor>,
    trajectory_id: String,
    sink: Option<DynEventSink>,
) -> ExecutionResult<()> {
    let mut started_tx = Some(started_tx);
    let mut seen_ended = false;

    while let Some(state) = state_rx.recv().await {
        if let Some(tx) = started_tx.take() {
            let _ = tx.send(());
        }
        if let Some(execute) = &state.execute {
            let _ = location_tx.send(execute.location);
            if let Some(sink) = &sink {
                sink.publish(&MotionEvent::now(MotionEventKind::TrajectoryPosition {
                    trajectory_id: trajectory_id.clone(),
                    location: execute.location,
                }));
            }
            if let Some(ex) = executor.as_mut() {
                ex.check_and_trigger(execute.location, &state).await?;
            }
            if execute.state == ExecutionState::Ended {
                seen_ended = true;
            }
        }
        if seen_ended && state.standstill {
            if let Some(ex) = executor.as_mut() {
                ex.wait_for_all_actions().await?;
            }
            debug!(%trajectory_id, "trajectory ended and controller at standstill");
            return Ok(());
        }
    }
    Err(ExecutionError::ConnectionLost(
        "state stream ended before trajectory completed".to_string(),
    ))
}
