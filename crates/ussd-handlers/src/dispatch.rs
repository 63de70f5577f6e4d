//! Handler dispatch for execute nodes.

use std::collections::BTreeSet;
use std::time::Instant;

use ussd_core::{Error, Result};

use crate::registry::{HandlerCall, HandlerRegistry, HandlerReply};

/// Invokes registered handlers, honouring the disabled set.
pub struct Dispatcher<'a> {
    registry: &'a HandlerRegistry,
    disabled: &'a BTreeSet<String>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a HandlerRegistry, disabled: &'a BTreeSet<String>) -> Self {
        Self { registry, disabled }
    }

    /// Invoke the handler named by `call.method`.
    ///
    /// A disabled method fails with `HandlerDisabled` without being invoked;
    /// an unregistered one fails with `HandlerNotFound`.
    pub async fn dispatch(&self, call: &HandlerCall) -> Result<HandlerReply> {
        if self.disabled.contains(&call.method) {
            tracing::info!(method = %call.method, "Handler is disabled");
            return Err(Error::HandlerDisabled(call.method.clone()));
        }

        let handler = self
            .registry
            .get(&call.method)
            .ok_or_else(|| Error::HandlerNotFound(call.method.clone()))?;

        let start = Instant::now();
        let reply = handler
            .handle(call)
            .await
            .map_err(|e| Error::handler(&call.method, format!("{:#}", e)))?;
        tracing::debug!(
            method = %call.method,
            duration_ms = start.elapsed().as_millis() as u64,
            end_session = reply.end_session,
            "Handler completed"
        );

        Ok(reply)
    }
}
