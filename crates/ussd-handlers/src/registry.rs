//! Handler registry for execute nodes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ussd_core::{Pattern, SessionContext};

/// Input handed to a handler: the session's pattern plus its context record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerCall {
    /// Method named by the execute node
    pub method: String,
    /// Selections leading to the execute node (and any free-form input after it)
    pub pattern: Pattern,
    /// Session id, service code and phone number
    pub context: SessionContext,
}

impl HandlerCall {
    pub fn new(method: impl Into<String>, pattern: Pattern, context: SessionContext) -> Self {
        Self {
            method: method.into(),
            pattern,
            context,
        }
    }

    /// Most recent input token.
    pub fn last_input(&self) -> Option<&str> {
        self.pattern.last().map(|s| s.as_str())
    }

    /// Pattern as a JSON array with the context record appended.
    pub fn to_json(&self) -> serde_json::Value {
        let mut items: Vec<serde_json::Value> = self
            .pattern
            .iter()
            .map(|token| serde_json::Value::String(token.clone()))
            .collect();
        items.push(serde_json::json!({
            "session_id": self.context.session_id,
            "service_code": self.context.service_code,
            "phone_number": self.context.phone_number,
        }));
        serde_json::Value::Array(items)
    }
}

/// Display text computed by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerReply {
    /// Separator-delimited items, like a node's `display`
    pub display: String,
    /// End the session regardless of the node's options
    pub end_session: bool,
}

impl HandlerReply {
    /// Reply whose continuation follows the node.
    pub fn new(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            end_session: false,
        }
    }

    /// Reply that ends the session.
    pub fn end(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            end_session: true,
        }
    }
}

impl From<String> for HandlerReply {
    fn from(display: String) -> Self {
        Self::new(display)
    }
}

impl From<&str> for HandlerReply {
    fn from(display: &str) -> Self {
        Self::new(display)
    }
}

/// Trait for externally supplied handlers.
///
/// Each execute node names a handler by `execute_func`; the registry maps
/// that name to an implementation.
#[async_trait]
pub trait MenuHandler: Send + Sync {
    /// Name referenced by `execute_func`.
    fn name(&self) -> &str;

    /// Produce the display for an execute node.
    async fn handle(&self, call: &HandlerCall) -> anyhow::Result<HandlerReply>;
}

/// Handler backed by a plain function.
pub struct FnHandler<F> {
    name: String,
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&HandlerCall) -> anyhow::Result<HandlerReply> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> MenuHandler for FnHandler<F>
where
    F: Fn(&HandlerCall) -> anyhow::Result<HandlerReply> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, call: &HandlerCall) -> anyhow::Result<HandlerReply> {
        (self.f)(call)
    }
}

/// Registry of available handlers.
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn MenuHandler>>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler, replacing any with the same name.
    pub fn register(&mut self, handler: Arc<dyn MenuHandler>) {
        let name = handler.name().to_string();
        if self.handlers.insert(name.clone(), handler).is_some() {
            tracing::warn!("Handler '{}' registered twice, keeping the latest", name);
        }
    }

    /// Register a function as a handler.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&HandlerCall) -> anyhow::Result<HandlerReply> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnHandler::new(name, f)));
    }

    /// Get a handler by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn MenuHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Check if a handler exists.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// List all handler names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Names from `names` that have no registered handler.
    pub fn missing<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        names.into_iter().filter(|n| !self.contains(n)).collect()
    }

    /// Get the number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
