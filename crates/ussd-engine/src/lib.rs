//! # ussd-engine
//!
//! The USSD menu session engine.
//!
//! This crate provides:
//! - The [`Navigator`], which walks the menu tree along a session's pattern
//!   and handles sticky branches
//! - The [`Compositor`], which renders display strings with pagination and
//!   Back/Next items
//! - The [`UssdEngine`], which runs a request end to end: normalize, build
//!   the pattern, resolve, dispatch, compose, encode
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ussd_core::{CanonicalRequest, Config, MenuTree};
//! use ussd_engine::UssdEngine;
//! use ussd_handlers::HandlerRegistry;
//! use ussd_session::MemoryStore;
//!
//! let engine = UssdEngine::new(
//!     Config::default(),
//!     MenuTree::load("menu.json")?,
//!     HandlerRegistry::with_demo_handlers(),
//!     Arc::new(MemoryStore::new()),
//! )?;
//! let result = engine
//!     .push(CanonicalRequest::new("s1", "*384#", "254700000000", ""))
//!     .await;
//! ```

pub mod compositor;
pub mod engine;
pub mod navigator;

pub use compositor::{Compositor, Layout};
pub use engine::{UssdEngine, EMPTY_RESPONSE_TEXT};
pub use navigator::Navigator;
