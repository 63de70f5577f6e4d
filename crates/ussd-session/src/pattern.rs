//! Pattern building: turning the latest input into navigation history.

use ussd_core::{Config, NavState, Pattern, Result, SessionState};

use crate::store::SessionStore;

/// How raw input is split and which tokens are navigation controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRules {
    /// Input is `*`-chained; only the last segment counts
    pub chained: bool,
    /// Sentinels `(next, prev)`, or `None` when navigation is disabled
    pub sentinels: Option<(String, String)>,
}

impl PatternRules {
    pub fn from_config(config: &Config) -> Self {
        let nav = &config.navigation;
        Self {
            chained: config.chained_input(),
            sentinels: nav
                .enabled
                .then(|| (nav.nav_next.clone(), nav.nav_prev.clone())),
        }
    }

    /// Token carried by a raw input string.
    pub fn token<'a>(&self, raw_input: &'a str) -> &'a str {
        if self.chained {
            raw_input.rsplit('*').next().unwrap_or(raw_input)
        } else {
            raw_input
        }
    }

    /// Classify a token.
    pub fn classify(&self, token: &str) -> InputAction {
        match self.sentinels {
            Some((_, ref prev)) if token == prev => InputAction::Back,
            Some((ref next, _)) if token == next => InputAction::NextPage,
            _ => InputAction::Select,
        }
    }
}

/// Effect of one input on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Pop the last selection
    Back,
    /// Advance the page of the current node
    NextPage,
    /// Append a new selection
    Select,
}

/// Apply one token to the session state.
pub fn apply_token(state: &mut SessionState, token: &str, action: InputAction) {
    match action {
        InputAction::Back => {
            state.pattern.pop();
            state.nav = None;
        }
        InputAction::NextPage => match state.nav {
            Some(ref mut nav) => nav.current_page += 1,
            None => state.nav = Some(NavState::first_next()),
        },
        InputAction::Select => {
            state.nav = None;
            state.pattern.push(token.to_string());
        }
    }
}

/// Builds the pattern of a session from its stored state and the latest input.
pub struct PatternBuilder<'a> {
    store: &'a SessionStore,
    rules: &'a PatternRules,
}

impl<'a> PatternBuilder<'a> {
    pub fn new(store: &'a SessionStore, rules: &'a PatternRules) -> Self {
        Self { store, rules }
    }

    /// Update and persist the session state for `raw_input`, returning the
    /// resulting pattern.
    ///
    /// Empty input leaves the stored pattern unchanged (first request of a
    /// session).
    pub async fn build(&self, raw_input: &str, session_id: &str) -> Result<Pattern> {
        let mut state = self.store.load(session_id).await?.unwrap_or_default();

        if !raw_input.is_empty() {
            let token = self.rules.token(raw_input);
            let action = self.rules.classify(token);
            tracing::debug!(session_id, token, ?action, "Applying input");
            apply_token(&mut state, token, action);
        }

        self.store.save(session_id, &state).await?;
        Ok(state.pattern)
    }
}
