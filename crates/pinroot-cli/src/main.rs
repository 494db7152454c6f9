//! pinroot - pinned trust anchor tool
//!
//! Inspect the anchor compiled into the firmware, check peer chains offline
//! and probe a live backend with the same verifier the device uses.

use anyhow::Result;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    pinroot_cli::run().await
}
