//! # ussd-handlers
//!
//! Handler registry and dispatch for execute nodes.
//!
//! A menu node whose display is `_EXECUTE_` names a handler through
//! `execute_func`. Handlers implement [`MenuHandler`] and are registered
//! with a [`HandlerRegistry`] before the engine is built, so unknown names
//! are caught at startup rather than per request. The [`Dispatcher`]
//! enforces the configured disabled set.
//!
//! ## Example
//!
//! ```ignore
//! use ussd_handlers::{HandlerRegistry, HandlerReply};
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register_fn("balance", |call| {
//!     Ok(HandlerReply::end(format!("Balance for {}: 100", call.context.phone_number)))
//! });
//! ```

pub mod builtin;
pub mod dispatch;
pub mod registry;

use std::sync::Arc;

pub use builtin::{EchoHandler, GoodbyeHandler};
pub use dispatch::Dispatcher;
pub use registry::{FnHandler, HandlerCall, HandlerRegistry, HandlerReply, MenuHandler};

impl HandlerRegistry {
    /// Create a registry with the demo handlers registered.
    pub fn with_demo_handlers() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EchoHandler));
        registry.register(Arc::new(GoodbyeHandler));
        registry
    }
}
