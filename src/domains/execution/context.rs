use crate::domains::actions::CombinedActions;
use crate::domains::execution::{AsyncActionExecutor, IoTrigger, StateStreamFactory};
use std::sync::Arc;

/// Read-only bundle handed to a driver: the action sequence, the identifier
/// the remote planner assigned when the trajectory was loaded, optional I/O
/// trigger conditions, the live state-stream factory, and an optional
/// async-action executor. Drivers never mutate the actions or trajectory.
pub struct MovementControllerContext {
    pub combined_actions: CombinedActions,
    pub trajectory_id: String,
    pub start_on_io: Option<IoTrigger>,
    pub pause_on_io: Option<IoTrigger>,
    pub state_stream: Arc<dyn StateStreamFactory>,
    pub executor: Option<AsyncActionExecutor>,
}

impl MovementControllerContext {
    pub fn new(
        combined_actions: CombinedActions,
        trajectory_id: impl Into<String>,
        state_stream: Arc<dyn StateStreamFactory>,
    ) -> Self {
        Self {
            combined_actions,
            trajectory_id: trajectory_id.into(),
            start_on_io: None,
            pause_on_io: None,
            state_stream,
            executor: None,
        }
    }

    pub fn with_start_trigger(mut self, trigger: IoTrigger) -> Self {
        self.start_on_io = Some(trigger);
        self
    }

    pub fn with_pause_trigger(mut self, trigger: IoTrigger) -> Self {
        self.pause_on_io = Some(trigger);
        self
    }

    pub fn with_executor(mut self, executor: AsyncActionExecutor) -> Self {
        self.executor = Some(executor);
        self
    }
}
