//! Runtime configuration from the environment

use crate::strategy::{StepTiming, DEFAULT_TIME_UNIT};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the session console
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// SQLite preference database; `None` keeps preferences in memory
    pub prefs_path: Option<PathBuf>,
    pub timing: StepTiming,
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let prefs_path = if lookup("SESSION_PREFS_IN_MEMORY").is_some() {
            None
        } else {
            Some(lookup("SESSION_PREFS_PATH").map_or_else(
                || {
                    let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                    PathBuf::from(format!("{home}/.session-lifecycle/prefs.db"))
                },
                PathBuf::from,
            ))
        };

        let unit = lookup("SESSION_TIME_UNIT_MS")
            .and_then(|ms| ms.parse().ok())
            .map_or(DEFAULT_TIME_UNIT, Duration::from_millis);

        Self {
            prefs_path,
            timing: StepTiming::new(unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> SessionConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        SessionConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[("HOME", "/home/user")]);
        assert_eq!(
            config.prefs_path,
            Some(PathBuf::from("/home/user/.session-lifecycle/prefs.db"))
        );
        assert_eq!(config.timing.unit, Duration::from_secs(1));
    }

    #[test]
    fn test_overrides() {
        let config = config_with(&[
            ("SESSION_PREFS_PATH", "/var/lib/prefs.db"),
            ("SESSION_TIME_UNIT_MS", "50"),
        ]);
        assert_eq!(config.prefs_path, Some(PathBuf::from("/var/lib/prefs.db")));
        assert_eq!(config.timing.unit, Duration::from_millis(50));
    }

    #[test]
    fn test_in_memory_and_bad_unit() {
        let config = config_with(&[
            ("SESSION_PREFS_IN_MEMORY", "1"),
            ("SESSION_TIME_UNIT_MS", "soon"),
        ]);
        assert_eq!(config.prefs_path, None);
        assert_eq!(config.timing.unit, DEFAULT_TIME_UNIT);
    }
}
