use crate::common::{ExecutionError, ExecutionResult};
use crate::domains::actions::{ActionRegistry, AsyncActionSpec, CombinedActions};
use crate::domains::execution::{MotionGroupState, MotionHold};
use crate::domains::observer::{DynEventSink, MotionEvent, MotionEventKind};
use anyhow::anyhow;
use ordered_float::OrderedFloat;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

/// What to do when an async-action handler fails.
#[derive(Clone)]
pub enum ErrorPolicy {
    /// Propagate the failure to the driver immediately.
    Raise,
    /// Record the failure in the results list and keep going.
    Collect,
    /// Hand the failure to a user callback and keep going.
    Callback(Arc<dyn Fn(ExecutionError) + Send + Sync>),
}

impl std::fmt::Debug for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raise => write!(f, "Raise"),
            Self::Collect => write!(f, "Collect"),
            Self::Callback(_) => write!(f, "Callback(..)"),
        }
    }
}

#[derive(Debug)]
pub struct AsyncActionResult {
    pub action_name: String,
    pub trigger_location: f64,
    pub completion_location: Option<f64>,
    pub was_blocking: bool,
    pub result: Result<Value, String>,
}

#[derive(Debug)]
struct PendingAction {
    location: f64,
    spec: AsyncActionSpec,
    triggered: bool,
}

struct RunningAction {
    name: String,
    trigger_location: f64,
    handle: JoinHandle<anyhow::Result<Value>>,
}

/// Triggers registered side-effect handlers at path locations. Blocking
/// actions hold motion through the [`MotionHold`] hook while the handler
/// runs; non-blocking ones run concurrently and are reaped on later calls.
/// The instance is owned by exactly one driver worker; no internal locking.
pub struct AsyncActionExecutor {
    pending: Vec<PendingAction>,
    running: Vec<RunningAction>,
    results: Vec<AsyncActionResult>,
    registry: Arc<ActionRegistry>,
    error_policy: ErrorPolicy,
    hold: Option<Arc<dyn MotionHold>>,
    sink: Option<DynEventSink>,
}

impl AsyncActionExecutor {
    pub fn new(registry: Arc<ActionRegistry>, actions: Vec<(f64, AsyncActionSpec)>) -> Self {
        let mut pending: Vec<PendingAction> = actions
            .into_iter()
            .map(|(location, spec)| PendingAction {
                location,
                spec,
                triggered: false,
            })
            .collect();
        pending.sort_by_key(|p| OrderedFloat(p.location));
        Self {
            pending,
            running: Vec::new(),
            results: Vec::new(),
            registry,
            error_policy: ErrorPolicy::Raise,
            hold: None,
            sink: None,
        }
    }

    /// Build from the async actions of a sequence, at their path locations.
    pub fn from_actions(registry: Arc<ActionRegistry>, actions: &CombinedActions) -> Self {
        Self::new(registry, actions.async_actions())
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_motion_hold(mut self, hold: Arc<dyn MotionHold>) -> Self {
        self.hold = Some(hold);
        self
    }

    pub fn with_event_sink(mut self, sink: DynEventSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn has_motion_hold(&self) -> bool {
        self.hold.is_some()
    }

    pub(crate) fn set_motion_hold(&mut self, hold: Arc<dyn MotionHold>) {
        self.hold = Some(hold);
    }

    pub fn results(&self) -> &[AsyncActionResult] {
        &self.results
    }

    pub fn has_pending(&self) -> bool {
        self.pending.iter().any(|p| !p.triggered)
    }

    pub fn has_running(&self) -> bool {
        !self.running.is_empty()
    }

    /// Trigger every untriggered action whose location has been passed.
    /// Returns whether a blocking action fired, signalling the caller that
    /// motion was actually held.
    pub async fn check_and_trigger(
        &mut self,
        current_location: f64,
        state: &MotionGroupState,
    ) -> ExecutionResult<bool> {
        self.reap_finished(current_location).await?;

        let mut blocking_triggered = false;
        for index in 0..self.pending.len() {
            if self.pending[index].triggered || self.pending[index].location > current_location {
                continue;
            }
            self.pending[index].triggered = true;
            let trigger_location = self.pending[index].location;
            let spec = self.pending[index].spec.clone();

            debug!(
                action = %spec.name,
                trigger_location,
                current_location,
                standstill = state.standstill,
                "triggering async action"
            );
            if let Some(sink) = &self.sink {
                sink.publish(&MotionEvent::now(MotionEventKind::AsyncActionTriggered {
                    name: spec.name.clone(),
                    location: trigger_location,
                    blocking: spec.blocking,
                }));
            }

            let handler = match self.registry.get(&spec.name) {
                Some(handler) => handler,
                None => {
                    self.handle_failure(
                        &spec.name,
                        trigger_location,
                        None,
                        spec.blocking,
                        format!("no handler registered for '{}'", spec.name),
                    )?;
                    continue;
                }
            };

            if spec.blocking {
                blocking_triggered = true;
                if let Some(hold) = &self.hold {
                    hold.pause().await?;
                }
                let outcome = match spec.timeout {
                    Some(limit) => match timeout(limit, handler.call(&spec.args, &spec.kwargs))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(anyhow!("timed out after {:?}", limit)),
                    },
                    None => handler.call(&spec.args, &spec.kwargs).await,
                };
                if let Some(hold) = &self.hold {
                    hold.resume().await?;
                }
                match outcome {
                    Ok(value) => self.results.push(AsyncActionResult {
                        action_name: spec.name,
                        trigger_location,
                        completion_location: Some(current_location),
                        was_blocking: true,
                        result: Ok(value),
                    }),
                    Err(cause) => self.handle_failure(
                        &spec.name,
                        trigger_location,
                        Some(current_location),
                        true,
                        cause.to_string(),
                    )?,
                }
            } else {
                let name = spec.name.clone();
                let handle = tokio::spawn(async move {
                    match spec.timeout {
                        Some(limit) => {
                            match timeout(limit, handler.call(&spec.args, &spec.kwargs)).await {
                                Ok(result) => result,
                                Err(_) => Err(anyhow!("timed out after {:?}", limit)),
                            }
                        }
                        None => handler.call(&spec.args, &spec.kwargs).await,
                    }
                });
                self.running.push(RunningAction {
                    name,
                    trigger_location,
                    handle,
                });
            }
        }

        Ok(blocking_triggered)
    }

    /// Drain remaining concurrent handlers; used at trajectory end.
    pub async fn wait_for_all_actions(&mut self) -> ExecutionResult<()> {
        while let Some(running) = self.running.pop() {
            self.finish(running, None).await?;
        }
        Ok(())
    }

    /// Cancel remaining concurrent handlers; used on abort.
    pub async fn cancel_all_actions(&mut self) {
        while let Some(running) = self.running.pop() {
            running.handle.abort();
            if let Err(err) = running.handle.await {
                if !err.is_cancelled() {
                    warn!(action = %running.name, %err, "async action task failed during cancel");
                }
            }
        }
    }

    async fn reap_finished(&mut self, current_location: f64) -> ExecutionResult<()> {
        let mut index = 0;
        while index < self.running.len() {
            if self.running[index].handle.is_finished() {
                let running = self.running.remove(index);
                self.finish(running, Some(current_location)).await?;
            } else {
                index += 1;
            }
        }
        Ok(())
    }

    async fn finish(
        &mut self,
        running: RunningAction,
        completion_location: Option<f64>,
    ) -> ExecutionResult<()> {
        let RunningAction {
            name,
            trigger_location,
            handle,
        } = running;
        match handle.await {
            Ok(Ok(value)) => {
                self.results.push(AsyncActionResult {
                    action_name: name,
                    trigger_location,
                    completion_location,
                    was_blocking: false,
                    result: Ok(value),
                });
                Ok(())
            }
            Ok(Err(cause)) => self.handle_failure(
                &name,
                trigger_location,
                completion_location,
                false,
                cause.to_string(),
            ),
            Err(join_err) => self.handle_failure(
                &name,
                trigger_location,
                completion_location,
                false,
                join_err.to_string(),
            ),
        }
    }

    fn handle_failure(
        &mut self,
        name: &str,
        trigger_location: f64,
        completion_location: Option<f64>,
        was_blocking: bool,
        cause: String,
    ) -> ExecutionResult<()> {
        let error = ExecutionError::AsyncActionFailed {
            action_name: name.to_string(),
            trigger_location,
            completion_location,
            was_blocking,
            cause: cause.clone(),
        };
        match &self.error_policy {
            ErrorPolicy::Raise => Err(error),
            ErrorPolicy::Collect => {
                self.results.push(AsyncActionResult {
                    action_name: name.to_string(),
                    trigger_location,
                    completion_location,
                    was_blocking,
                    result: Err(cause),
                });
                Ok(())
            }
            ErrorPolicy::Callback(callback) => {
                callback(error);
                Ok(())
            }
        }
    }
}
