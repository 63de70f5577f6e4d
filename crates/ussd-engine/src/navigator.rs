//! Menu navigation: walking the tree along a session's pattern.

use std::borrow::Cow;

use ussd_core::{MenuNode, MenuTree, Result, StickyEndpoint};
use ussd_session::SessionStore;

/// Walks the menu tree for one session.
pub struct Navigator<'a> {
    tree: &'a MenuTree,
    store: &'a SessionStore,
    legacy_options_fallback: bool,
}

impl<'a> Navigator<'a> {
    pub fn new(tree: &'a MenuTree, store: &'a SessionStore) -> Self {
        Self {
            tree,
            store,
            legacy_options_fallback: false,
        }
    }

    /// Treat an unmatched token at a node with options as an empty node
    /// instead of an unknown option.
    pub fn with_legacy_options_fallback(mut self, enabled: bool) -> Self {
        self.legacy_options_fallback = enabled;
        self
    }

    /// Resolve the node addressed by `pattern` under the root menu `root_key`.
    ///
    /// Entering a node flagged `uses_same_method` arms the session's sticky
    /// endpoint. A token with no matching child is routed to the sticky
    /// method when one is armed. Returns `None` when traversal reaches no
    /// usable node.
    pub async fn resolve(
        &self,
        pattern: &[String],
        root_key: &str,
        session_id: &str,
    ) -> Result<Option<Cow<'a, MenuNode>>> {
        let Some(root) = self.tree.get(root_key) else {
            tracing::warn!(root_key, "Root menu is not defined");
            return Ok(None);
        };
        let mut node: Cow<'a, MenuNode> = Cow::Borrowed(root);

        for token in pattern {
            let child: Option<Cow<'a, MenuNode>> = match node {
                Cow::Borrowed(current) => current.child(token).map(Cow::Borrowed),
                Cow::Owned(ref current) => current.child(token).cloned().map(Cow::Owned),
            };

            node = match child {
                Some(child) => {
                    if child.uses_same_method() {
                        if let Some(method) = child.sticky_method() {
                            tracing::debug!(
                                session_id,
                                token = %token,
                                method,
                                "Arming sticky endpoint"
                            );
                            self.store
                                .save_sticky(session_id, &StickyEndpoint::new(token, method))
                                .await?;
                        }
                    }
                    child
                }
                None => match self.store.load_sticky(session_id).await? {
                    Some(sticky) => {
                        tracing::debug!(
                            session_id,
                            token = %token,
                            method = %sticky.method,
                            "Routing to sticky endpoint"
                        );
                        Cow::Owned(MenuNode::sticky(sticky.method))
                    }
                    None if self.legacy_options_fallback && node.options.is_some() => {
                        tracing::debug!(
                            session_id,
                            token = %token,
                            "Falling back to options block"
                        );
                        Cow::Owned(MenuNode::default())
                    }
                    None => {
                        tracing::debug!(session_id, token = %token, "No option matches token");
                        return Ok(None);
                    }
                },
            };
        }

        Ok(Some(node))
    }
}
