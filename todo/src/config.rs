//! Configuration management for the to-do service.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unset, empty, or unparsable values fall back to the default.
//!
//! | Variable                | Default     |
//! |-------------------------|-------------|
//! | `TODO_HOST`             | `127.0.0.1` |
//! | `TODO_PORT`             | `5000`      |
//! | `TODO_LOG_LEVEL`        | `info`      |
//! | `TODO_SHUTDOWN_TIMEOUT` | `5` seconds |
//! | `TODO_DATA_FILE`        | unset (in-memory only) |

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Where the list is kept
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the list; `None` keeps it in memory
    pub data_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            server: ServerConfig {
                host: value("TODO_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
                port: parsed(value("TODO_PORT"), 5000),
                log_level: value("TODO_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                shutdown_timeout: parsed(value("TODO_SHUTDOWN_TIMEOUT"), 5),
            },
            storage: StorageConfig {
                data_file: value("TODO_DATA_FILE").map(PathBuf::from),
            },
        }
    }

    /// `host:port` string for the listener
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// How long shutdown waits for pending writes
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout)
    }
}

fn parsed<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}
