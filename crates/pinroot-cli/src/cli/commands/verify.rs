//! `pinroot verify` - offline chain validation.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use pinroot::{decode_pem_chain, inspect_der, validate, CertificateInfo, PeerCertificateChain, Verdict};
use serde::Serialize;
use std::process::ExitCode;

use super::{exit_code, Context};
use crate::cli::args::VerifyArgs;
use crate::output::{print_certificate, print_json, verdict_label, OutputFormat};

#[derive(Serialize)]
struct Report {
    host: String,
    at: DateTime<Utc>,
    verdict: Verdict,
    chain: Vec<Option<CertificateInfo>>,
}

pub fn execute(ctx: &Context, args: &VerifyArgs) -> Result<ExitCode> {
    let host = args
        .host
        .clone()
        .or_else(|| ctx.pin().expected_hostname.clone())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No hostname to check.\n\n\
                 Pass --host <NAME> or set expected_hostname in the config file."
            )
        })?;

    let store = ctx.anchor_store()?;
    let pem = std::fs::read(&args.chain).with_context(|| format!("reading {}", args.chain.display()))?;
    let ders = decode_pem_chain(&pem, &args.chain.display().to_string())?;

    let at = args.at.unwrap_or_else(Utc::now);
    let chain = PeerCertificateChain::new(ders.iter().map(Vec::as_slice).collect());
    let verdict = validate(&store.current(), &chain, at, &host);

    let infos: Vec<Option<CertificateInfo>> = ders.iter().map(|der| inspect_der(der).ok()).collect();

    match ctx.output_format {
        OutputFormat::Json => print_json(&Report {
            host,
            at,
            verdict,
            chain: infos,
        })?,
        OutputFormat::Pretty => {
            println!(
                "{} {} certificate(s) for {} at {}",
                "Chain:".bold(),
                ders.len(),
                host.cyan(),
                at.to_rfc3339()
            );
            for (depth, info) in infos.iter().enumerate() {
                println!();
                println!("{}", format!("[{depth}]").dimmed());
                match info {
                    Some(info) => {
                        print_certificate(info);
                        if !info.is_valid_at(at) {
                            println!("  {}", "(outside its validity window)".yellow());
                        }
                    }
                    None => println!("  {}", "(does not decode as X.509)".red()),
                }
            }
            println!();
            println!("{} {}", "Verdict:".bold(), verdict_label(verdict));
            if verdict.is_anchor_failure() {
                println!(
                    "  {} the pinned anchor itself is unusable; re-provision the device",
                    "Note:".yellow().bold()
                );
            }
        }
    }

    Ok(exit_code(verdict.is_trusted()))
}
