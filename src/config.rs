use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub planning: PlanningConfig,
    pub execution: ExecutionConfig,
    pub cursor: CursorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// Sampling interval for synthesized wait segments, in milliseconds.
    pub wait_sample_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// How long the protocol driver waits for the state monitor to observe
    /// its first motion-group state before giving up.
    pub monitor_start_timeout_ms: u64,
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorConfig {
    /// Interval at which the cursor publishes the currently targeted action.
    pub publish_interval_ms: u64,
    pub queue_capacity: usize,
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl PlanningConfig {
    pub fn wait_sample_interval(&self) -> Duration {
        Duration::from_millis(self.wait_sample_interval_ms)
    }
}

impl ExecutionConfig {
    pub fn monitor_start_timeout(&self) -> Duration {
        Duration::from_millis(self.monitor_start_timeout_ms)
    }
}

impl CursorConfig {
    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            planning: PlanningConfig {
                wait_sample_interval_ms: 50,
            },
            execution: ExecutionConfig {
                monitor_start_timeout_ms: 5000,
                channel_capacity: 64,
            },
            cursor: CursorConfig {
                publish_interval_ms: 500,
                queue_capacity: 64,
            },
        }
    }
}
