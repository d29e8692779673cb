use crate::common::{ExecutionError, ExecutionResult, IoValue};
use crate::domains::execution::IoDevice;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory I/O device implementation for testing and development.
#[derive(Debug, Default)]
pub struct InMemoryIoDevice {
    values: RwLock<HashMap<String, IoValue>>,
}

impl InMemoryIoDevice {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl IoDevice for InMemoryIoDevice {
    async fn read(&self, key: &str) -> ExecutionResult<IoValue> {
        let values = self.values.read().await;
        values.get(key).cloned().ok_or_else(|| {
            ExecutionError::Infrastructure(anyhow::anyhow!("unknown I/O key: {key}"))
        })
    }

    async fn write(&self, key: &str, value: IoValue) -> ExecutionResult<()> {
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value);
        Ok(())
    }
}
