//! Static menu tree loaded from a JSON document.
//!
//! The document is an object keyed by menu key; each value is a
//! [`MenuNode`]. Children live under `options`, keyed by the input token
//! that selects them. `options` may also carry `uses_same_method` (and the
//! method to stick to) next to the children.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::{Error, Result};

/// Display value marking a node whose content comes from a handler.
pub const EXECUTE_SENTINEL: &str = "_EXECUTE_";

/// A node of the menu tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuNode {
    /// Title rendered above the items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_title: Option<String>,
    /// Separator-delimited items, or `_EXECUTE_`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Handler producing the display of an execute node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execute_func: Option<String>,
    /// Items per page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_displayed: Option<usize>,
    /// Children and branch flags; absent on terminal nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<MenuOptions>,
}

/// The `options` block of a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuOptions {
    /// Route unmatched input below this node to the same handler
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub uses_same_method: bool,
    /// Method to stick to, when it differs from the node's own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execute_func: Option<String>,
    /// Child nodes keyed by input token
    #[serde(flatten)]
    pub children: BTreeMap<String, MenuNode>,
}

impl MenuNode {
    /// Create a display node.
    pub fn display(text: impl Into<String>) -> Self {
        Self {
            display: Some(text.into()),
            ..Default::default()
        }
    }

    /// Create an execute node bound to a handler.
    pub fn execute(method: impl Into<String>) -> Self {
        Self {
            display: Some(EXECUTE_SENTINEL.to_string()),
            execute_func: Some(method.into()),
            ..Default::default()
        }
    }

    /// Execute node synthesized from a sticky endpoint.
    ///
    /// It keeps an (empty) options block flagged `uses_same_method`, so the
    /// session stays open and further input is routed to the same method.
    pub fn sticky(method: impl Into<String>) -> Self {
        let mut node = Self::execute(method);
        node.options = Some(MenuOptions {
            uses_same_method: true,
            ..Default::default()
        });
        node
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.menu_title = Some(title.into());
        self
    }

    /// Set the page size.
    pub fn with_items_displayed(mut self, items: usize) -> Self {
        self.items_displayed = Some(items);
        self
    }

    /// Add a child under `token`.
    pub fn with_option(mut self, token: impl Into<String>, child: MenuNode) -> Self {
        self.options
            .get_or_insert_with(MenuOptions::default)
            .children
            .insert(token.into(), child);
        self
    }

    /// Flag the node so unmatched input below it sticks to its method.
    pub fn sticky_branch(mut self) -> Self {
        self.options
            .get_or_insert_with(MenuOptions::default)
            .uses_same_method = true;
        self
    }

    /// Whether the display comes from a handler.
    pub fn is_execute(&self) -> bool {
        self.display.as_deref() == Some(EXECUTE_SENTINEL)
    }

    /// A node without options ends the session.
    pub fn is_terminal(&self) -> bool {
        self.options.is_none()
    }

    /// Whether entering this node arms a sticky endpoint.
    pub fn uses_same_method(&self) -> bool {
        self.options
            .as_ref()
            .map(|o| o.uses_same_method)
            .unwrap_or(false)
    }

    /// Method captured when this node arms a sticky endpoint.
    pub fn sticky_method(&self) -> Option<&str> {
        self.options
            .as_ref()
            .and_then(|o| o.execute_func.as_deref())
            .or(self.execute_func.as_deref())
    }

    /// Child selected by `token`.
    pub fn child(&self, token: &str) -> Option<&MenuNode> {
        self.options.as_ref().and_then(|o| o.children.get(token))
    }

    /// Items per page, when pagination applies.
    pub fn page_size(&self) -> Option<usize> {
        self.items_displayed.filter(|n| *n > 0)
    }

    fn check(&self, path: &str, issues: &mut Vec<String>) {
        if self.is_execute() && self.execute_func.is_none() {
            issues.push(format!(
                "{}: display is {} but execute_func is missing",
                path, EXECUTE_SENTINEL
            ));
        }
        if self.uses_same_method() && self.sticky_method().is_none() {
            issues.push(format!(
                "{}: uses_same_method is set but no execute_func is given",
                path
            ));
        }
        if let Some(ref options) = self.options {
            for (token, child) in &options.children {
                child.check(&format!("{}.options.{}", path, token), issues);
            }
        }
    }

    fn collect_methods<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        if self.is_execute() {
            if let Some(ref method) = self.execute_func {
                out.insert(method);
            }
        }
        if self.uses_same_method() {
            if let Some(method) = self.sticky_method() {
                out.insert(method);
            }
        }
        if let Some(ref options) = self.options {
            for child in options.children.values() {
                child.collect_methods(out);
            }
        }
    }
}

/// Immutable mapping from menu key to root node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuTree {
    menus: BTreeMap<String, MenuNode>,
}

impl MenuTree {
    /// Build a tree from menus keyed by name.
    pub fn new(menus: BTreeMap<String, MenuNode>) -> Self {
        Self { menus }
    }

    /// Load a menu document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MenuLoad(format!(
                "USSD menu file not found: {}",
                path.display()
            )));
        }
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::MenuLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json).map_err(|e| match e {
            Error::MenuLoad(msg) => Error::MenuLoad(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse a menu document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let tree: MenuTree = serde_json::from_str(json)
            .map_err(|e| Error::MenuLoad(format!("Invalid JSON format in menu document: {}", e)))?;
        tree.check()?;
        Ok(tree)
    }

    fn check(&self) -> Result<()> {
        let mut issues = Vec::new();
        for (key, node) in &self.menus {
            node.check(key, &mut issues);
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::MenuLoad(issues.join("; ")))
        }
    }

    /// Fail unless `key` names a root menu.
    pub fn require(&self, key: &str) -> Result<&MenuNode> {
        self.get(key)
            .ok_or_else(|| Error::MenuLoad(format!("menu '{}' is not defined", key)))
    }

    /// Get a root menu by key.
    pub fn get(&self, key: &str) -> Option<&MenuNode> {
        self.menus.get(key)
    }

    /// Root menu keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.menus.keys().map(|k| k.as_str())
    }

    /// Every handler name referenced anywhere in the tree.
    pub fn execute_funcs(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        for node in self.menus.values() {
            node.collect_methods(&mut out);
        }
        out
    }
}
