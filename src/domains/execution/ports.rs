use crate::common::{ExecutionResult, IoValue};
use crate::domains::execution::MotionGroupState;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Factory for live motion-group state subscriptions. May be invoked several
/// times (driver and an attached viewer, for instance); every call yields an
/// independent stream.
pub trait StateStreamFactory: Send + Sync {
    fn subscribe(&self) -> mpsc::Receiver<MotionGroupState>;
}

/// Pause/resume hook used by the async-action executor around blocking
/// handlers.
#[async_trait]
pub trait MotionHold: Send + Sync {
    async fn pause(&self) -> ExecutionResult<()>;
    async fn resume(&self) -> ExecutionResult<()>;
}

/// Digital/analog I/O device collaborator. Consumed by write actions and
/// trigger conditions; not implemented here beyond test adapters.
#[async_trait]
pub trait IoDevice: Send + Sync {
    async fn read(&self, key: &str) -> ExecutionResult<IoValue>;
    async fn write(&self, key: &str, value: IoValue) -> ExecutionResult<()>;
}
