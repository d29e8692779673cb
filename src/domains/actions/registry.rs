use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

/// Handler invoked when execution passes an async action's path location.
#[async_trait]
pub trait AsyncActionHandler: Send + Sync {
    async fn call(
        &self,
        args: &[Value],
        kwargs: &serde_json::Map<String, Value>,
    ) -> anyhow::Result<Value>;
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send>>;

struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F> AsyncActionHandler for FnHandler<F>
where
    F: Fn(Vec<Value>, serde_json::Map<String, Value>) -> HandlerFuture + Send + Sync,
{
    async fn call(
        &self,
        args: &[Value],
        kwargs: &serde_json::Map<String, Value>,
    ) -> anyhow::Result<Value> {
        (self.f)(args.to_vec(), kwargs.clone()).await
    }
}

/// Lookup table from async-action names to handlers. Explicit instances are
/// passed into the executor at construction; the package-level default below
/// exists only as a convenience for simple programs.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: HashMap<String, Arc<dyn AsyncActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn AsyncActionHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    /// Register a closure returning a boxed future.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Vec<Value>, serde_json::Map<String, Value>) -> HandlerFuture + Send + Sync + 'static,
    {
        self.register(name, Arc::new(FnHandler { f }));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AsyncActionHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

static DEFAULT_REGISTRY: Lazy<RwLock<ActionRegistry>> =
    Lazy::new(|| RwLock::new(ActionRegistry::new()));

/// Register a handler in the package-level default registry.
pub fn register_default(name: impl Into<String>, handler: Arc<dyn AsyncActionHandler>) {
    if let Ok(mut registry) = DEFAULT_REGISTRY.write() {
        registry.register(name, handler);
    }
}

/// Snapshot of the package-level default registry.
pub fn default_registry() -> ActionRegistry {
    DEFAULT_REGISTRY
        .read()
        .map(|r| r.clone())
        .unwrap_or_default()
}
