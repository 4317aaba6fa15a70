//! Preference storage
//!
//! A small key-value interface for flags that outlive the process, plus the
//! first-run flag built on top of it.

mod sqlite;

pub use sqlite::SqlitePrefs;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Key under which completion of the guided run is recorded
pub const FIRST_RUN_COMPLETE_KEY: &str = "guided_run_finished";
const FIRST_RUN_COMPLETE_VALUE: &str = "done";

#[derive(Error, Debug)]
pub enum PrefsError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Preference store lock poisoned")]
    LockPoisoned,
}

pub type PrefsResult<T> = Result<T, PrefsError>;

/// Key-value store for persisted preferences
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn has_key(&self, key: &str) -> PrefsResult<bool>;

    async fn get(&self, key: &str) -> PrefsResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PrefsResult<()>;

    /// Remove a key; removing a missing key is not an error
    async fn delete(&self, key: &str) -> PrefsResult<()>;
}

#[async_trait]
impl<T: PreferenceStore + ?Sized> PreferenceStore for Arc<T> {
    async fn has_key(&self, key: &str) -> PrefsResult<bool> {
        (**self).has_key(key).await
    }

    async fn get(&self, key: &str) -> PrefsResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> PrefsResult<()> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> PrefsResult<()> {
        (**self).delete(key).await
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store; nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryPrefs {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPrefs {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPrefs {
    async fn has_key(&self, key: &str) -> PrefsResult<bool> {
        let values = self.values.lock().map_err(|_| PrefsError::LockPoisoned)?;
        Ok(values.contains_key(key))
    }

    async fn get(&self, key: &str) -> PrefsResult<Option<String>> {
        let values = self.values.lock().map_err(|_| PrefsError::LockPoisoned)?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PrefsResult<()> {
        let mut values = self.values.lock().map_err(|_| PrefsError::LockPoisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> PrefsResult<()> {
        let mut values = self.values.lock().map_err(|_| PrefsError::LockPoisoned)?;
        values.remove(key);
        Ok(())
    }
}

// ============================================================================
// First-run flag
// ============================================================================

/// Whether the guided run has been completed once
#[derive(Clone)]
pub struct FirstRunFlag {
    store: Arc<dyn PreferenceStore>,
}

impl FirstRunFlag {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    pub async fn has_completed_first_run(&self) -> PrefsResult<bool> {
        self.store.has_key(FIRST_RUN_COMPLETE_KEY).await
    }

    pub async fn mark_first_run_complete(&self) -> PrefsResult<()> {
        self.store
            .set(FIRST_RUN_COMPLETE_KEY, FIRST_RUN_COMPLETE_VALUE)
            .await
    }

    pub async fn clear_first_run_flag(&self) -> PrefsResult<()> {
        self.store.delete(FIRST_RUN_COMPLETE_KEY).await
    }
}

impl std::fmt::Debug for FirstRunFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirstRunFlag").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_prefs_roundtrip() {
        let prefs = MemoryPrefs::new();
        assert!(!prefs.has_key("a").await.unwrap());
        prefs.set("a", "1").await.unwrap();
        assert!(prefs.has_key("a").await.unwrap());
        assert_eq!(prefs.get("a").await.unwrap().as_deref(), Some("1"));
        prefs.delete("a").await.unwrap();
        assert_eq!(prefs.get("a").await.unwrap(), None);
        // Deleting again is fine
        prefs.delete("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_first_run_flag_lifecycle() {
        let store: Arc<dyn PreferenceStore> = Arc::new(MemoryPrefs::new());
        let flag = FirstRunFlag::new(store.clone());

        assert!(!flag.has_completed_first_run().await.unwrap());
        flag.mark_first_run_complete().await.unwrap();
        assert!(flag.has_completed_first_run().await.unwrap());
        assert_eq!(
            store.get(FIRST_RUN_COMPLETE_KEY).await.unwrap().as_deref(),
            Some("done")
        );

        flag.clear_first_run_flag().await.unwrap();
        assert!(!flag.has_completed_first_run().await.unwrap());
    }
}
