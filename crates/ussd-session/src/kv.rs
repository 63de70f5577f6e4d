//! Key-value store abstraction with per-key expiry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

/// Errors that can occur during key-value operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for ussd_core::Error {
    fn from(err: StoreError) -> Self {
        ussd_core::Error::StoreUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// String-keyed store with expiring values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a live value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Reset the expiry of a live key. Returns false if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Remove a key.
    async fn delete(&self, key: &str) -> Result<()>;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Writes between sweeps of expired entries.
pub(crate) const SWEEP_INTERVAL: u64 = 64;

/// Counts writes and says when a sweep is due.
#[derive(Debug, Default)]
pub(crate) struct SweepCounter(AtomicU64);

impl SweepCounter {
    pub(crate) fn tick(&self) -> bool {
        (self.0.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_INTERVAL == 0
    }
}

/// Process-local store.
///
/// Sessions that are never read again are freed by a sweep that runs every
/// 64 writes.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    writes: SweepCounter,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, e| e.is_live(now));
        before - entries.len()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.lock().values().filter(|e| e.is_live(now)).count()
    }

    /// Check if no live keys remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        let value = entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone());
        if value.is_none() {
            entries.remove(key);
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if self.writes.tick() {
            entries.retain(|_, e| e.is_live(now));
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        if let Some(entry) = entries.get_mut(key).filter(|e| e.is_live(now)) {
            entry.expires_at = now + ttl;
            return Ok(true);
        }
        entries.remove(key);
        Ok(false)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
