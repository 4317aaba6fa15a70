//! Mock implementations for testing
//!
//! These mocks enable controller and runtime tests without real storage.

use crate::prefs::{MemoryPrefs, PreferenceStore, PrefsResult, FIRST_RUN_COMPLETE_KEY};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Slack allowed on virtual-clock measurements (timer ticks are 1ms)
const CLOCK_SLACK: Duration = Duration::from_millis(10);

/// Assert that `expected` virtual time has passed since `started`
#[track_caller]
pub fn assert_elapsed(started: Instant, expected: Duration) {
    let elapsed = started.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + CLOCK_SLACK,
        "expected ~{expected:?}, elapsed {elapsed:?}"
    );
}

/// A write made through [`RecordingPrefs`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefsWrite {
    Set { key: String, value: String },
    Delete { key: String },
}

/// In-memory store that records every write
#[derive(Debug, Default)]
pub struct RecordingPrefs {
    inner: MemoryPrefs,
    pub writes: Mutex<Vec<PrefsWrite>>,
}

impl RecordingPrefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded_writes(&self) -> Vec<PrefsWrite> {
        self.writes.lock().unwrap().clone()
    }

    /// Number of times the first-run flag was set
    pub fn first_run_writes(&self) -> usize {
        self.recorded_writes()
            .iter()
            .filter(|w| matches!(w, PrefsWrite::Set { key, .. } if key == FIRST_RUN_COMPLETE_KEY))
            .count()
    }

    /// Number of times the first-run flag was cleared
    pub fn first_run_deletes(&self) -> usize {
        self.recorded_writes()
            .iter()
            .filter(|w| matches!(w, PrefsWrite::Delete { key } if key == FIRST_RUN_COMPLETE_KEY))
            .count()
    }
}

#[async_trait]
impl PreferenceStore for RecordingPrefs {
    async fn has_key(&self, key: &str) -> PrefsResult<bool> {
        self.inner.has_key(key).await
    }

    async fn get(&self, key: &str) -> PrefsResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> PrefsResult<()> {
        self.writes.lock().unwrap().push(PrefsWrite::Set {
            key: key.to_string(),
            value: value.to_string(),
        });
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> PrefsResult<()> {
        self.writes.lock().unwrap().push(PrefsWrite::Delete {
            key: key.to_string(),
        });
        self.inner.delete(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_prefs() {
        let prefs = RecordingPrefs::new();
        prefs.set(FIRST_RUN_COMPLETE_KEY, "done").await.unwrap();
        prefs.set("other", "x").await.unwrap();
        prefs.delete(FIRST_RUN_COMPLETE_KEY).await.unwrap();

        assert_eq!(prefs.first_run_writes(), 1);
        assert_eq!(prefs.first_run_deletes(), 1);
        assert_eq!(prefs.recorded_writes().len(), 3);
        assert!(!prefs.has_key(FIRST_RUN_COMPLETE_KEY).await.unwrap());
    }
}
