//! The request engine.

use std::sync::Arc;
use std::time::Duration;

use ussd_adaptors::{strip_back_item, AdaptorRegistry, WireAdaptor};
use ussd_core::{
    CanonicalRequest, Config, Error, MenuTree, RawRequest, RenderResult, Result, WireResponse,
};
use ussd_handlers::{Dispatcher, HandlerCall, HandlerRegistry};
use ussd_session::{KeyValueStore, PatternBuilder, PatternRules, SessionStore};

use crate::compositor::{Compositor, Layout};
use crate::navigator::Navigator;

/// Display of a node reached through the options fallback.
pub const EMPTY_RESPONSE_TEXT: &str = "Empty Response";

/// Menu session engine.
///
/// Built once from configuration, the menu tree, the handler registry and
/// a key-value backend; immutable afterwards. Every request carries its own
/// session id, so one engine can serve concurrent sessions.
pub struct UssdEngine {
    config: Config,
    tree: MenuTree,
    handlers: HandlerRegistry,
    adaptor: Arc<dyn WireAdaptor>,
    store: SessionStore,
    rules: PatternRules,
    layout: Layout,
}

impl UssdEngine {
    /// Build an engine with the built-in adaptor profiles.
    pub fn new(
        config: Config,
        tree: MenuTree,
        handlers: HandlerRegistry,
        kv: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        Self::with_adaptors(config, tree, handlers, kv, &AdaptorRegistry::with_defaults())
    }

    /// Build an engine choosing the adaptor from `adaptors`.
    ///
    /// Fails on invalid configuration, a missing default menu, an unknown
    /// adaptor, or (in strict mode) enabled handler names the registry lacks.
    pub fn with_adaptors(
        config: Config,
        tree: MenuTree,
        handlers: HandlerRegistry,
        kv: Arc<dyn KeyValueStore>,
        adaptors: &AdaptorRegistry,
    ) -> Result<Self> {
        config.ensure_valid()?;

        tree.require(&config.general.default_menu)?;
        let adaptor = adaptors.from_config(&config)?;

        // Disabled handlers are refused before lookup, so they need not exist.
        let missing: Vec<&str> = handlers
            .missing(tree.execute_funcs())
            .into_iter()
            .filter(|name| !config.handlers.disabled_func.contains(*name))
            .collect();
        if !missing.is_empty() {
            if config.handlers.strict {
                return Err(Error::ConfigInvalid(format!(
                    "menu references unregistered handlers: {}",
                    missing.join(", ")
                )));
            }
            for name in &missing {
                tracing::warn!("Handler '{}' is not registered", name);
            }
        }

        let store = SessionStore::new(kv, Duration::from_secs(config.session.ttl_secs));
        let rules = PatternRules::from_config(&config);
        let layout = Layout::from_config(&config);

        tracing::info!(
            adaptor = adaptor.name(),
            handlers = handlers.len(),
            default_menu = %config.general.default_menu,
            "USSD engine ready"
        );

        Ok(Self {
            config,
            tree,
            handlers,
            adaptor,
            store,
            rules,
            layout,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tree(&self) -> &MenuTree {
        &self.tree
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Name of the adaptor in effect.
    pub fn adaptor_name(&self) -> &str {
        self.adaptor.name()
    }

    /// Normalize a gateway payload, process it and encode the response.
    pub async fn handle(&self, raw: &RawRequest) -> Result<WireResponse> {
        let request = self
            .adaptor
            .normalize(raw, &self.config.input.request_variables)?;
        let session_id = request.session_id.clone();
        let result = self.push(request).await;
        self.encode(&result, &session_id)
    }

    /// Encode a rendered response with the configured adaptor.
    pub fn encode(&self, result: &RenderResult, session_id: &str) -> Result<WireResponse> {
        self.adaptor.encode(result, session_id)
    }

    /// Process one canonical request.
    ///
    /// Never fails: per-request errors delete the session and render a
    /// terminal response.
    pub async fn push(&self, mut request: CanonicalRequest) -> RenderResult {
        if self.config.general.sanitize_phone_number {
            request.sanitize_phone_number();
        }

        match self.process(&request).await {
            Ok(result) => result,
            Err(err) => self.fail(&request.session_id, err).await,
        }
    }

    async fn process(&self, request: &CanonicalRequest) -> Result<RenderResult> {
        let session_id = request.session_id.as_str();
        if request.request_string.is_empty() {
            tracing::info!(session_id, service_code = %request.service_code, "Session started");
        }

        let pattern = PatternBuilder::new(&self.store, &self.rules)
            .build(&request.request_string, session_id)
            .await?;
        let compositor = Compositor::new(&self.layout, &self.store);
        let root_key = self.config.general.default_menu.as_str();

        if pattern.is_empty() {
            let root = self.tree.require(root_key)?;
            tracing::debug!(session_id, "Showing default menu");
            let text = compositor
                .compose(
                    root.display.as_deref().unwrap_or_default(),
                    root.menu_title.as_deref(),
                    root.page_size(),
                    session_id,
                )
                .await?;
            return Ok(RenderResult::con(text));
        }

        let node = Navigator::new(&self.tree, &self.store)
            .with_legacy_options_fallback(self.config.general.legacy_options_fallback)
            .resolve(&pattern, root_key, session_id)
            .await?
            .ok_or(Error::UnknownOption)?;

        let (display, end_session) = if node.is_execute() {
            let method = node
                .execute_func
                .as_deref()
                .ok_or_else(|| Error::HandlerNotFound(ussd_core::EXECUTE_SENTINEL.to_string()))?;
            let call = HandlerCall::new(method, pattern, request.context());
            let reply = Dispatcher::new(&self.handlers, &self.config.handlers.disabled_func)
                .dispatch(&call)
                .await?;
            (reply.display, reply.end_session || node.is_terminal())
        } else {
            let display = node
                .display
                .clone()
                .unwrap_or_else(|| EMPTY_RESPONSE_TEXT.to_string());
            (display, node.is_terminal())
        };

        let text = compositor
            .compose(
                &display,
                node.menu_title.as_deref(),
                node.page_size(),
                session_id,
            )
            .await?;

        if end_session {
            self.store.delete(session_id).await?;
            tracing::info!(session_id, "Session ended");
            return Ok(RenderResult::end(self.strip_back(&text)));
        }

        Ok(RenderResult::con(text))
    }

    fn strip_back(&self, text: &str) -> String {
        match self.layout.back_label() {
            Some(label) => strip_back_item(text, label),
            None => text.to_string(),
        }
    }

    async fn fail(&self, session_id: &str, err: Error) -> RenderResult {
        if let Err(e) = self.store.delete(session_id).await {
            tracing::warn!(session_id, "Failed to delete session: {}", e);
        }

        if let Some(message) = err.user_message() {
            tracing::info!(session_id, reason = %err, "Session ended");
            return RenderResult::end(message);
        }

        tracing::error!(session_id, error = %err, "Request failed");
        let errors = &self.config.errors;
        let detail = if self.config.is_development() {
            err.to_string()
        } else {
            errors.error_message.clone()
        };
        let text = self
            .layout
            .render(&detail, Some(errors.error_title.as_str()), None, 0, false);
        RenderResult::end(text)
    }
}
