pub mod adapters;
pub mod application;
pub mod common;
pub mod config;
pub mod domains;

pub use config::Config;

/// Install the default tracing subscriber. Call once from the hosting
/// binary; repeated calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

// Re-export common types
pub use common::*;

// Re-export domain modules
pub use domains::*;
