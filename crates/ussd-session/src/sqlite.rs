//! SQLite-backed key-value store.
//!
//! Keeps session state across process restarts, which the one-shot CLI
//! relies on. Expired rows are invisible, purged when the store is opened
//! and swept periodically on writes.

use std::fs;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::kv::{KeyValueStore, Result, SweepCounter};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    expires_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_kv_expires_at ON kv (expires_at);
"#;

/// SQLite key-value store with millisecond expiry deadlines.
pub struct SqliteStore {
    /// Database connection (wrapped in mutex for thread safety).
    conn: Mutex<Connection>,
    writes: SweepCounter,
}

impl SqliteStore {
    /// Open (or create) a store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::init(conn)
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        let removed = Self::delete_expired(&conn)?;
        if removed > 0 {
            tracing::debug!("Purged {} expired session rows", removed);
        }
        Ok(Self {
            conn: Mutex::new(conn),
            writes: SweepCounter::default(),
        })
    }

    fn now_millis() -> i64 {
        Utc::now().timestamp_millis()
    }

    fn deadline(ttl: Duration) -> i64 {
        Self::now_millis() + ttl.as_millis() as i64
    }

    /// Delete every expired row. Returns the number removed.
    pub fn purge_expired(&self) -> Result<usize> {
        Self::delete_expired(&self.conn.lock())
    }

    fn delete_expired(conn: &Connection) -> Result<usize> {
        let removed = conn.execute(
            "DELETE FROM kv WHERE expires_at <= ?1",
            params![Self::now_millis()],
        )?;
        Ok(removed)
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT value, expires_at FROM kv WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((value, expires_at)) if expires_at > Self::now_millis() => Ok(Some(value)),
            Some(_) => {
                conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let conn = self.conn.lock();
        if self.writes.tick() {
            Self::delete_expired(&conn)?;
        }
        conn.execute(
            r#"
            INSERT INTO kv (key, value, expires_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at
            "#,
            params![key, value, Self::deadline(ttl)],
        )?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE kv SET expires_at = ?2 WHERE key = ?1 AND expires_at > ?3",
            params![key, Self::deadline(ttl), Self::now_millis()],
        )?;
        Ok(updated > 0)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}
