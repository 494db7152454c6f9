//! Output formatting.

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use pinroot::{AnchorHealth, AnchorState, CertificateInfo, Verdict};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable, colored
    #[default]
    Pretty,
    /// JSON output
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Unknown output format: {s}\nValid formats: pretty, json"),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Verdict label, green when trusted, red otherwise.
pub fn verdict_label(verdict: Verdict) -> ColoredString {
    let text = verdict.to_string();
    if verdict.is_trusted() {
        text.green().bold()
    } else {
        text.red().bold()
    }
}

/// Guard state label.
pub fn state_label(state: AnchorState) -> ColoredString {
    let text = state.to_string();
    match state {
        AnchorState::Healthy => text.green().bold(),
        AnchorState::Warning => text.yellow().bold(),
        AnchorState::Expired => text.red().bold(),
    }
}

/// Print a certificate summary, indented.
pub fn print_certificate(info: &CertificateInfo) {
    println!("  {} {}", "Subject:".bold(), info.subject);
    println!("  {} {}", "Issuer:".bold(), info.issuer);
    println!("  {} {}", "Serial:".bold(), info.serial);
    println!("  {} {}", "Not before:".bold(), info.not_before.to_rfc3339());
    println!("  {} {}", "Not after:".bold(), info.not_after.to_rfc3339());
    if !info.dns_names.is_empty() {
        println!("  {} {}", "DNS names:".bold(), info.dns_names.join(", "));
    }
    if !info.ip_addresses.is_empty() {
        let ips: Vec<String> = info.ip_addresses.iter().map(ToString::to_string).collect();
        println!("  {} {}", "IP addresses:".bold(), ips.join(", "));
    }
    println!("  {} {}", "SHA-256:".bold(), info.fingerprint.dimmed());
}

/// Print one health line.
pub fn print_health(health: &AnchorHealth) {
    let days = if health.days_until_expiry >= 0 {
        format!("{} days left", health.days_until_expiry)
    } else {
        format!("expired {} days ago", -health.days_until_expiry)
    };
    println!(
        "{} {} ({}, checked {})",
        "Anchor:".bold(),
        state_label(health.state),
        days,
        health.checked_at.to_rfc3339().dimmed()
    );
    match health.state {
        AnchorState::Warning => println!(
            "  {} schedule re-provisioning before {}",
            "Warning:".yellow().bold(),
            health.not_after.to_rfc3339()
        ),
        AnchorState::Expired => println!(
            "  {} new connections are refused; re-provision the device with a new anchor",
            "Error:".red().bold()
        ),
        AnchorState::Healthy => {}
    }
}
