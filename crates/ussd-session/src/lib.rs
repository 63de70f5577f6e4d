//! # ussd-session
//!
//! Session persistence for the USSD menu engine.
//!
//! This crate provides:
//! - A [`KeyValueStore`] trait for short-lived, expiring string values
//! - In-memory and SQLite backends
//! - The typed [`SessionStore`] adapter (session state + sticky endpoint)
//! - The [`PatternBuilder`], which folds each input into the session's
//!   navigation history
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::{sync::Arc, time::Duration};
//! use ussd_session::{MemoryStore, PatternBuilder, PatternRules, SessionStore};
//!
//! let store = SessionStore::new(Arc::new(MemoryStore::new()), Duration::from_secs(20));
//! let rules = PatternRules::from_config(&config);
//! let pattern = PatternBuilder::new(&store, &rules).build("1*2", "session-1").await?;
//! ```

pub mod kv;
pub mod pattern;
pub mod sqlite;
pub mod store;

use std::sync::Arc;

pub use kv::{KeyValueStore, MemoryStore, StoreError};
pub use pattern::{apply_token, InputAction, PatternBuilder, PatternRules};
pub use sqlite::SqliteStore;
pub use store::SessionStore;

use ussd_core::{config::SessionConfig, StoreBackend};

/// Open the key-value backend selected by configuration.
pub fn open_backend(config: &SessionConfig) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Sqlite => {
            let path = config.sqlite_path();
            tracing::info!("Opening sqlite session store at {:?}", path);
            Ok(Arc::new(SqliteStore::open(path)?))
        }
    }
}
