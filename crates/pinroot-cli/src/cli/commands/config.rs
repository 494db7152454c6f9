//! `pinroot config` - show configuration.

use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::output::{print_json, OutputFormat};

pub fn execute(ctx: &Context, args: &ConfigArgs) -> Result<ExitCode> {
    match args.command {
        ConfigCommands::Show => show_config(ctx)?,
        ConfigCommands::Path => println!("{}", ctx.config_path.display()),
    }
    Ok(ExitCode::SUCCESS)
}

fn show_config(ctx: &Context) -> Result<()> {
    let pin = ctx.pin();

    match ctx.output_format {
        OutputFormat::Json => print_json(&ctx.config)?,
        OutputFormat::Pretty => {
            println!("{}", "Current Configuration:".bold());
            println!();

            let anchor = pin
                .anchor_path
                .as_ref()
                .map_or_else(|| "(bundled)".dimmed().to_string(), |p| p.display().to_string());
            println!("  {} {}", "anchor:".bold(), anchor);

            let host = pin
                .expected_hostname
                .clone()
                .unwrap_or_else(|| "(TLS server name)".dimmed().to_string());
            println!("  {} {}", "expected_hostname:".bold(), host);

            println!("  {} {} days", "warning_threshold:".bold(), pin.guard.warning_threshold_days);
            println!("  {} {}s", "check_interval:".bold(), pin.guard.check_interval_secs);
            println!("  {} {}s", "cache_ttl:".bold(), pin.guard.cache_ttl_secs);
            println!("  {} {}", "output_format:".bold(), ctx.output_format);
            println!();
            println!("{} {}", "File:".dimmed(), ctx.config_path.display().to_string().dimmed());
        }
    }

    Ok(())
}
