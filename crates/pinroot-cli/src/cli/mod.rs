//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use std::process::ExitCode;
use tracing::Level;

use crate::config::Config;
use crate::output::OutputFormat;

/// Run the CLI application.
pub async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Load configuration
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let mut config = Config::load(&config_path)?;
    if let Some(anchor) = cli.anchor {
        config.pin.anchor_path = Some(anchor);
    }

    // Determine output format
    let output_format = cli
        .output
        .or(config.output_format)
        .unwrap_or(OutputFormat::Pretty);

    // Create context for commands
    let ctx = commands::Context {
        config,
        config_path,
        output_format,
    };

    // Dispatch to appropriate command
    match cli.command {
        Commands::Inspect(args) => commands::inspect::execute(&ctx, &args),
        Commands::Verify(args) => commands::verify::execute(&ctx, &args),
        Commands::Health(args) => commands::health::execute(&ctx, &args).await,
        Commands::Probe(args) => commands::probe::execute(&ctx, args).await,
        Commands::Config(args) => commands::config::execute(&ctx, &args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
