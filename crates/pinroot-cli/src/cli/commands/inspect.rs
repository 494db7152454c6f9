//! `pinroot inspect` - show the pinned anchor.

use anyhow::Result;
use colored::Colorize;
use pinroot::hash::{colon_fingerprint, sha256_fingerprint};
use pinroot::{AnchorHealth, CertificateInfo};
use serde::Serialize;
use std::process::ExitCode;

use super::Context;
use crate::cli::args::InspectArgs;
use crate::output::{print_certificate, print_health, print_json, OutputFormat};

#[derive(Serialize)]
struct Report<'a> {
    source: String,
    anchor: &'a CertificateInfo,
    spki_sha256: String,
    health: AnchorHealth,
}

pub fn execute(ctx: &Context, args: &InspectArgs) -> Result<ExitCode> {
    let guard = ctx.guard(args.at)?;
    let anchor = guard.anchor();
    let health = guard.health();
    // Hash of the public key, the value SPKI pinning schemes compare.
    let spki_sha256 = sha256_fingerprint(anchor.public_key_der());
    let source = ctx
        .pin()
        .anchor_path
        .as_ref()
        .map_or_else(|| "bundled".to_string(), |p| p.display().to_string());

    match ctx.output_format {
        OutputFormat::Json => print_json(&Report {
            source,
            anchor: anchor.info(),
            spki_sha256,
            health,
        })?,
        OutputFormat::Pretty => {
            println!("{} {}", "Pinned anchor:".bold(), source.cyan());
            println!();
            print_certificate(anchor.info());
            println!("  {} {}", "Fingerprint:".bold(), colon_fingerprint(anchor.der()));
            println!("  {} {}", "SPKI SHA-256:".bold(), spki_sha256.dimmed());
            println!();
            print_health(&health);
        }
    }

    Ok(ExitCode::SUCCESS)
}
