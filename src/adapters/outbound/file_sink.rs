use crate::domains::observer::{DynEventSink, MotionEvent, MotionEventSink};
use log::info as log_info;
use std::sync::Arc;

/// A file-based sink using `fast_log` for file writing and rotation.
pub struct FileSink;

impl FileSink {
    /// Initialize the fast_log file logger. Path is the file path used by
    /// fast_log's rolling file appender.
    pub fn init(path: &str) -> Result<(), Box<dyn std::error::Error>> {
        fast_log::init(
            fast_log::config::Config::new()
                .console()
                .file(path)
                .level(log::LevelFilter::Info),
        )?;
        Ok(())
    }
}

impl MotionEventSink for FileSink {
    fn publish(&self, event: &MotionEvent) {
        match serde_json::to_string(event) {
            Ok(line) => log_info!("{}", line),
            Err(_) => log_info!("{} - {:?}", event.timestamp.to_rfc3339(), event.kind),
        }
    }
}

/// Initialize the file sink, falling back to an error the caller can ignore
/// in favor of the console sink.
pub fn init_file_sink(path: &str) -> Result<DynEventSink, Box<dyn std::error::Error>> {
    FileSink::init(path)?;
    Ok(Arc::new(FileSink {}))
}
