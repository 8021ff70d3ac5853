//! # Bridge Configuration
//!
//! Loaded once at startup from environment variables with fallback to
//! defaults. A variable that is set but unparsable is an error; it is never
//! silently replaced by the default.
//!
//! | Variable                | Default                          |
//! |-------------------------|----------------------------------|
//! | `TALLY_DB_PATH`         | `<platform data dir>/tally.db`   |
//! | `TALLY_RECENT_LIMIT`    | `10`                             |
//! | `TALLY_STOCK_POLICY`    | `allow-negative`                 |
//! | `TALLY_MAX_CONNECTIONS` | `5`                              |

use directories::ProjectDirs;
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

use tally_core::DEFAULT_RECENT_LIMIT;
use tally_db::{DbConfig, StockPolicy};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Sales returned by `getAnalyticsSnapshot` when no limit is given
    pub recent_limit: u32,

    /// Oversell behaviour of the transaction engine
    pub stock_policy: StockPolicy,

    /// Pool size
    pub max_connections: u32,
}

impl BridgeConfig {
    /// Defaults for everything except the database location.
    pub fn with_database_path(path: impl Into<PathBuf>) -> Self {
        BridgeConfig {
            database_path: path.into(),
            recent_limit: DEFAULT_RECENT_LIMIT,
            stock_policy: StockPolicy::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = match lookup("TALLY_DB_PATH").filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_database_path()?,
        };

        let mut config = BridgeConfig::with_database_path(database_path);

        if let Some(raw) = lookup("TALLY_RECENT_LIMIT") {
            config.recent_limit = parse_positive("TALLY_RECENT_LIMIT", &raw)?;
        }

        if let Some(raw) = lookup("TALLY_STOCK_POLICY") {
            config.stock_policy = raw
                .parse()
                .map_err(|_| ConfigError::invalid("TALLY_STOCK_POLICY", &raw))?;
        }

        if let Some(raw) = lookup("TALLY_MAX_CONNECTIONS") {
            config.max_connections = parse_positive("TALLY_MAX_CONNECTIONS", &raw)?;
        }

        Ok(config)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .stock_policy(self.stock_policy)
    }
}

/// Platform data directory, created if missing.
///
/// - **macOS**: `~/Library/Application Support/com.tally.pos/tally.db`
/// - **Windows**: `%APPDATA%\tally\pos\data\tally.db`
/// - **Linux**: `~/.local/share/pos/tally.db`
fn default_database_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("com", "tally", "pos").ok_or(ConfigError::NoDataDir)?;
    let data_dir = dirs.data_dir();

    std::fs::create_dir_all(data_dir).map_err(|e| ConfigError::DataDir {
        path: data_dir.to_path_buf(),
        source: e,
    })?;

    Ok(data_dir.join("tally.db"))
}

fn parse_positive(key: &str, raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::invalid(key, raw)),
    }
}

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Could not determine the platform data directory; set TALLY_DB_PATH")]
    NoDataDir,

    #[error("Could not create data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    fn invalid(key: &str, value: &str) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}
