//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Locate the SQLite database and the log directory.
//! - Pick the log level, defaulting by build mode.
//!
//! # Invariants
//! - Blank environment values are ignored, never turned into empty paths.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "DAILYREFLECT_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "DAILYREFLECT_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "DAILYREFLECT_LOG_DIR";

const DB_FILE_NAME: &str = "dailyreflect.sqlite3";
const LOG_DIR_NAME: &str = "dailyreflect-logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves config through `lookup`, falling back to the temp dir.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|trimmed| !trimmed.is_empty())
        };

        Self {
            db_path: value(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME)),
            log_level: value(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: value(LOG_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(LOG_DIR_NAME)),
        }
    }
}
