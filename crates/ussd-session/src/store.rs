//! Typed session storage over a [`KeyValueStore`].
//!
//! Session state and the sticky endpoint live under separate keys derived
//! from the session id. Reads refresh the expiry, so a session that keeps
//! receiving requests never lapses between the pattern read and the later
//! reads made while composing the response.

use std::sync::Arc;
use std::time::Duration;

use ussd_core::{Result, SessionState, StickyEndpoint};

use crate::kv::KeyValueStore;

const SESSION_PREFIX: &str = "ussd_session_";
const STICKY_PREFIX: &str = "ussd_session_same_endpoint_";

/// Session store adapter.
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl SessionStore {
    /// Create an adapter with the sliding expiry applied to every key.
    pub fn new(kv: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Sliding expiry.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Key holding the session state.
    pub fn session_key(session_id: &str) -> String {
        format!("{}{}", SESSION_PREFIX, session_id)
    }

    /// Key holding the sticky endpoint.
    pub fn sticky_key(session_id: &str) -> String {
        format!("{}{}", STICKY_PREFIX, session_id)
    }

    /// Load session state, refreshing its expiry.
    ///
    /// A value that no longer decodes is treated as absent.
    pub async fn load(&self, session_id: &str) -> Result<Option<SessionState>> {
        let key = Self::session_key(session_id);
        let Some(raw) = self.kv.get(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<SessionState>(&raw) {
            Ok(state) => {
                self.kv.expire(&key, self.ttl).await?;
                Ok(Some(state))
            }
            Err(e) => {
                tracing::warn!(session_id, "Discarding undecodable session state: {}", e);
                Ok(None)
            }
        }
    }

    /// Persist session state with the sliding expiry.
    pub async fn save(&self, session_id: &str, state: &SessionState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.kv
            .set(&Self::session_key(session_id), &json, self.ttl)
            .await?;
        Ok(())
    }

    /// Remove session state and the sticky endpoint.
    pub async fn delete(&self, session_id: &str) -> Result<()> {
        self.kv.delete(&Self::session_key(session_id)).await?;
        self.kv.delete(&Self::sticky_key(session_id)).await?;
        Ok(())
    }

    /// Load the sticky endpoint, refreshing its expiry.
    pub async fn load_sticky(&self, session_id: &str) -> Result<Option<StickyEndpoint>> {
        let key = Self::sticky_key(session_id);
        let Some(raw) = self.kv.get(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<StickyEndpoint>(&raw) {
            Ok(sticky) => {
                self.kv.expire(&key, self.ttl).await?;
                Ok(Some(sticky))
            }
            Err(e) => {
                tracing::warn!(session_id, "Discarding undecodable sticky endpoint: {}", e);
                Ok(None)
            }
        }
    }

    /// Persist the sticky endpoint, replacing any earlier one.
    pub async fn save_sticky(&self, session_id: &str, sticky: &StickyEndpoint) -> Result<()> {
        let json = serde_json::to_string(sticky)?;
        self.kv
            .set(&Self::sticky_key(session_id), &json, self.ttl)
            .await?;
        Ok(())
    }
}
