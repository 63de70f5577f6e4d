//! Per-session navigation state persisted in the key-value store.

use serde::{Deserialize, Serialize};

/// Ordered option tokens leading from the root menu to the current node.
pub type Pattern = Vec<String>;

/// Navigation progress of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Tokens selected so far
    #[serde(default)]
    pub pattern: Pattern,
    /// Pending pagination, cleared by any fresh selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav: Option<NavState>,
}

impl SessionState {
    /// Page of the current node to display.
    pub fn current_page(&self) -> usize {
        self.nav.as_ref().map(|n| n.current_page as usize).unwrap_or(0)
    }
}

/// Pagination block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavState {
    pub pages: Option<u32>,
    pub current_page: u32,
    pub nav_direction: String,
}

impl NavState {
    /// State after the first "next" input.
    pub fn first_next() -> Self {
        Self {
            pages: None,
            current_page: 1,
            nav_direction: "next".to_string(),
        }
    }
}

/// Remembered handler binding for a sticky branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickyEndpoint {
    /// Token that entered the branch
    pub menu_option: String,
    /// Handler every unmatched input is routed to
    pub method: String,
}

impl StickyEndpoint {
    pub fn new(menu_option: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            menu_option: menu_option.into(),
            method: method.into(),
        }
    }
}
