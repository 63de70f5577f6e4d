//! CLI command implementations.

pub mod request;
pub mod simulate;
pub mod validate;

use std::sync::Arc;

use ussd_core::{Config, MenuTree};
use ussd_engine::UssdEngine;
use ussd_handlers::HandlerRegistry;
use ussd_session::KeyValueStore;

/// Build an engine over the configured menu with the demo handlers.
pub fn build_engine(config: Config, kv: Arc<dyn KeyValueStore>) -> anyhow::Result<UssdEngine> {
    tracing::debug!("Loading menu from {:?}", config.general.menu_file);
    let tree = MenuTree::load(&config.general.menu_file).map_err(|e| {
        tracing::warn!("Failed to load menu: {}", e);
        e
    })?;
    let engine = UssdEngine::new(config, tree, HandlerRegistry::with_demo_handlers(), kv)?;
    Ok(engine)
}
