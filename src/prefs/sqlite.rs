//! SQLite-backed preference store

use super::{PreferenceStore, PrefsError, PrefsResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// SQL schema for initialization
const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS preferences (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// Thread-safe preference database handle
#[derive(Clone)]
pub struct SqlitePrefs {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePrefs {
    /// Open or create the preference database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> PrefsResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> PrefsResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> PrefsResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| PrefsError::LockPoisoned)
    }
}

#[async_trait]
impl PreferenceStore for SqlitePrefs {
    async fn has_key(&self, key: &str) -> PrefsResult<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM preferences WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn get(&self, key: &str) -> PrefsResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> PrefsResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        tracing::debug!(key, "Preference stored");
        Ok(())
    }

    async fn delete(&self, key: &str) -> PrefsResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM preferences WHERE key = ?1", params![key])?;
        tracing::debug!(key, "Preference deleted");
        Ok(())
    }
}
