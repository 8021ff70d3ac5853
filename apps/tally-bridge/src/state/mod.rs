//! # State Module
//!
//! What every command gets handed: the database handle and the loaded
//! configuration. Both are read-only after startup; the `Database` carries
//! its own pool and write gate.

mod config;

pub use config::{BridgeConfig, ConfigError};

use tally_db::Database;

/// Shared state for command handlers.
#[derive(Debug, Clone)]
pub struct BridgeState {
    db: Database,
    config: BridgeConfig,
}

impl BridgeState {
    pub fn new(db: Database, config: BridgeConfig) -> Self {
        BridgeState { db, config }
    }

    /// Returns the database handle.
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}
