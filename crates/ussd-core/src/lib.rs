//! # ussd-core
//!
//! Core types and abstractions for the USSD menu engine.
//!
//! This crate provides:
//! - The static menu tree and its node model
//! - Session state persisted between requests
//! - Canonical request/response shapes shared by wire adaptors
//! - Configuration system
//! - The error taxonomy

pub mod config;
pub mod error;
pub mod menu;
pub mod request;
pub mod session;

pub use config::{Config, Environment, OutputFormat, StoreBackend};
pub use error::{Error, Result};
pub use menu::{MenuNode, MenuOptions, MenuTree, EXECUTE_SENTINEL};
pub use request::{CanonicalRequest, RawRequest, RenderResult, SessionContext, WireResponse};
pub use session::{NavState, Pattern, SessionState, StickyEndpoint};
