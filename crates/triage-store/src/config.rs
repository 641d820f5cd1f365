//! Store configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Path value that selects a private in-memory database
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Prediction store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file, or `:memory:`
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Drop all stored predictions when the store is opened.
    ///
    /// Off by default; intended for demos and throwaway test databases.
    #[serde(default)]
    pub reset_on_startup: bool,

    /// How long a writer waits on a locked database (milliseconds)
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    /// Configuration for a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::from(IN_MEMORY_PATH),
            ..Default::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY_PATH
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            reset_on_startup: false,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("predictions.db")
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}
