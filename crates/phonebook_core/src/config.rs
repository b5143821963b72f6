//! Runtime configuration resolved from the process environment.
//!
//! # Responsibility
//! - Resolve the database path and logging settings for composition roots
//!   (FFI, CLI).
//!
//! # Invariants
//! - Blank values are treated as unset.
//! - Resolution never fails; unknown levels surface later at `init_logging`.

use crate::db::DEFAULT_DB_FILE_NAME;
use crate::logging::default_log_level;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "PHONEBOOK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "PHONEBOOK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PHONEBOOK_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonebookConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Level passed to `init_logging`.
    pub log_level: String,
    /// File logging directory; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for PhonebookConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl PhonebookConfig {
    /// Reads `PHONEBOOK_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            db_path: read(ENV_DB_PATH).map_or(defaults.db_path, PathBuf::from),
            log_level: read(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
        }
    }
}

/// Returns `<temp_dir>/pessoa.db`.
pub fn default_db_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::{default_db_path, PhonebookConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = PhonebookConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, PhonebookConfig::default());
        assert!(config.db_path.ends_with("pessoa.db"));
        assert_eq!(config.db_path, default_db_path());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = PhonebookConfig::from_lookup(lookup_from(&[
            (ENV_DB_PATH, " /data/contacts.db "),
            (ENV_LOG_LEVEL, "warn"),
            (ENV_LOG_DIR, "/data/logs"),
        ]));
        assert_eq!(config.db_path, PathBuf::from("/data/contacts.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/data/logs")));
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = PhonebookConfig::from_lookup(lookup_from(&[(ENV_DB_PATH, "   ")]));
        assert_eq!(config.db_path, default_db_path());
    }
}
