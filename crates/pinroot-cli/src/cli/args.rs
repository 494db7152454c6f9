//! Command-line argument definitions using clap.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Pinned trust anchor tool
///
/// Checks TLS peers against the single root certificate the device trusts,
/// and reports when that root needs re-provisioning.
#[derive(Parser, Debug)]
#[command(name = "pinroot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (defaults to the per-user config directory)
    #[arg(short, long, env = "PINROOT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// PEM anchor to use instead of the configured or bundled one
    #[arg(short, long, global = true)]
    pub anchor: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the pinned anchor and its health
    Inspect(InspectArgs),

    /// Validate a PEM chain file against the anchor, offline
    Verify(VerifyArgs),

    /// Report the expiry guard state
    Health(HealthArgs),

    /// Handshake with a live server using the pinned verifier
    Probe(ProbeArgs),

    /// Show CLI configuration
    Config(ConfigArgs),
}

// ============================================================================
// Inspect command
// ============================================================================

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Evaluate health at this instant instead of now (RFC 3339)
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

// ============================================================================
// Verify command
// ============================================================================

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// PEM file holding the peer chain, leaf first
    pub chain: PathBuf,

    /// Hostname the leaf must name (defaults to `expected_hostname` from config)
    #[arg(long)]
    pub host: Option<String>,

    /// Validate at this instant instead of now (RFC 3339)
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

// ============================================================================
// Health command
// ============================================================================

#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Keep re-checking on the configured interval until the anchor expires
    #[arg(short, long)]
    pub watch: bool,

    /// Evaluate at this instant instead of now (RFC 3339)
    #[arg(long, conflicts_with = "watch")]
    pub at: Option<DateTime<Utc>>,
}

// ============================================================================
// Probe command
// ============================================================================

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Server address as host:port
    pub target: String,

    /// TLS server name (defaults to the host part of the target)
    #[arg(long)]
    pub server_name: Option<String>,

    /// Connect and I/O timeout in seconds
    #[arg(long, default_value = "10")]
    pub timeout: u64,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Show config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_verify_with_time() {
        let cli = Cli::parse_from([
            "pinroot",
            "verify",
            "chain.pem",
            "--host",
            "device.local",
            "--at",
            "2026-06-01T00:00:00Z",
        ]);
        let Commands::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        assert_eq!(args.host.as_deref(), Some("device.local"));
        assert_eq!(args.at.unwrap().to_rfc3339(), "2026-06-01T00:00:00+00:00");
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["pinroot", "health", "-vv", "--output", "json"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output, Some(OutputFormat::Json));
    }
}
