//! # Tally Bridge Entry Point
//!
//! Spawned by the presentation process; see `tally_bridge` for the wire
//! protocol.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match tally_bridge::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Bridge exited with an error");
            eprintln!("tally-bridge: {}", err);
            ExitCode::FAILURE
        }
    }
}
