//! # Tally Bridge Library
//!
//! Boundary process between the presentation layer and the Tally backend.
//! The UI spawns this process and talks to it over a line-oriented JSON
//! channel.
//!
//! ## Module Organization
//! ```text
//! tally_bridge/
//! ├── lib.rs          ◄─── You are here (startup & request loop)
//! ├── state/
//! │   ├── mod.rs      ◄─── BridgeState (database + config)
//! │   └── config.rs   ◄─── Environment configuration
//! ├── commands/
//! │   ├── mod.rs      ◄─── Request/Response envelope, dispatch
//! │   ├── product.rs  ◄─── Catalog commands
//! │   ├── sale.rs     ◄─── Sale and void commands
//! │   └── analytics.rs◄─── Snapshot, ledger, export, health
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## Wire Protocol
//! ```text
//! stdin  → {"command":"createSale","payload":{"items":[...],"discount":null}}
//! stdout ← {"success":true,"data":{"saleId":7,"finalTotalCents":1800}}
//!
//! stdin  → {"command":"voidSale","payload":{"saleId":7}}
//! stdout ← {"success":true,"data":{"saleId":7,"restored":[1,2],"skipped":[]}}
//!
//! stdin  → {"command":"voidSale","payload":{"saleId":7}}
//! stdout ← {"success":false,"error":{"code":"CONFLICT","message":"Sale 7 is already voided"}}
//! ```
//!
//! Requests are handled one at a time, in arrival order. Logs go to stderr
//! so stdout carries nothing but responses.

pub mod commands;
pub mod error;
pub mod state;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use state::{BridgeConfig, BridgeState, ConfigError};
use tally_db::{Database, DbError};

pub use commands::handle_line;

/// Failures that stop the bridge before or while serving requests.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database startup failed: {0}")]
    Database(#[from] DbError),

    #[error("I/O error on the command channel: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the bridge until stdin closes.
///
/// ## Startup Sequence
/// ```text
/// 1. Initialize logging (stderr, RUST_LOG or "info,tally=debug,sqlx=warn")
/// 2. Load BridgeConfig from TALLY_* environment variables
/// 3. Connect to the database and run pending migrations
/// 4. Serve one request per stdin line until EOF
/// 5. Close the pool
/// ```
pub async fn run() -> Result<(), BridgeError> {
    init_tracing();

    info!("Starting Tally POS bridge");

    let config = BridgeConfig::from_env()?;
    info!(
        db_path = %config.database_path.display(),
        stock_policy = %config.stock_policy,
        "Configuration loaded"
    );

    let db = Database::new(config.db_config()).await?;
    info!("Database connected and migrations applied");

    let state = BridgeState::new(db, config);
    serve(&state).await?;

    state.db().close().await;
    info!("Bridge stopped");
    Ok(())
}

/// Request loop over stdin/stdout.
async fn serve(state: &BridgeState) -> Result<(), BridgeError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(state, &line).await;

        stdout.write_all(response.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    debug!("stdin closed");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tally=trace` - Show trace for tally crates only
/// - Default: INFO, DEBUG for tally crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
