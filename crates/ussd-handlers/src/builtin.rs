//! Demo handlers used by the bundled simulator menu.

use async_trait::async_trait;

use crate::registry::{HandlerCall, HandlerReply, MenuHandler};

/// Repeats the session's selections back to the subscriber.
pub struct EchoHandler;

#[async_trait]
impl MenuHandler for EchoHandler {
    fn name(&self) -> &str {
        "echo"
    }

    async fn handle(&self, call: &HandlerCall) -> anyhow::Result<HandlerReply> {
        let last = call.last_input().unwrap_or_default();
        Ok(HandlerReply::new(format!(
            "You entered: {}|Path: {}",
            last,
            call.pattern.join(" > ")
        )))
    }
}

/// Ends the session with a farewell for the caller's number.
pub struct GoodbyeHandler;

#[async_trait]
impl MenuHandler for GoodbyeHandler {
    fn name(&self) -> &str {
        "goodbye"
    }

    async fn handle(&self, call: &HandlerCall) -> anyhow::Result<HandlerReply> {
        Ok(HandlerReply::end(format!(
            "Thank you {}. Goodbye.",
            call.context.phone_number
        )))
    }
}
