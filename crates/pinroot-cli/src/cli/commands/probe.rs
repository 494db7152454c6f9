//! `pinroot probe` - live handshake with the pinned verifier.

use anyhow::{Context as _, Result};
use colored::Colorize;
use pinroot::rustls::pki_types::ServerName;
use pinroot::rustls::{ClientConfig, ClientConnection};
use pinroot::{
    anchor_verdict, client_config, PinnedServerVerifier, RejectedByAnchor, Verdict, VerdictLog, VerdictRecord,
};
use serde::Serialize;
use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use super::{exit_code, fatal_hint, Context};
use crate::cli::args::ProbeArgs;
use crate::output::{print_json, verdict_label, OutputFormat};

#[derive(Serialize)]
struct Report {
    target: String,
    server_name: String,
    record: Option<VerdictRecord>,
    protocol: Option<String>,
    cipher_suite: Option<String>,
    error: Option<String>,
}

pub async fn execute(ctx: &Context, args: ProbeArgs) -> Result<ExitCode> {
    let server_name = match &args.server_name {
        Some(name) => name.clone(),
        None => host_part(&args.target).to_string(),
    };

    let log = Arc::new(VerdictLog::new());
    let verifier = PinnedServerVerifier::from_config(ctx.pin()).map_err(fatal_hint)?;
    // Same gate the device applies before enabling networking.
    verifier.guard().ensure_usable().map_err(fatal_hint)?;
    let verifier = Arc::new(verifier.with_observer(log.clone()));
    let config = client_config(verifier)?;

    let target = args.target.clone();
    let name = server_name.clone();
    let timeout = Duration::from_secs(args.timeout.max(1));
    let outcome = tokio::task::spawn_blocking(move || handshake(config, &target, name, timeout)).await?;

    let record = log.last();
    let trusted = outcome.is_ok() && record.as_ref().is_some_and(|r| r.verdict.is_trusted());
    let (protocol, cipher_suite, error) = match outcome {
        Ok(session) => (Some(session.protocol), Some(session.cipher_suite), None),
        Err(e) => (None, None, Some(describe_failure(&e))),
    };

    match ctx.output_format {
        OutputFormat::Json => print_json(&Report {
            target: args.target,
            server_name,
            record,
            protocol,
            cipher_suite,
            error,
        })?,
        OutputFormat::Pretty => {
            println!("{} {} ({})", "Probe:".bold(), args.target.cyan(), server_name);
            match &record {
                Some(r) => {
                    println!("  {} {}", "Verdict:".bold(), verdict_label(r.verdict));
                    println!("  {} {}", "Chain length:".bold(), r.chain_len);
                    if let Some(fp) = &r.leaf_fingerprint {
                        println!("  {} {}", "Leaf SHA-256:".bold(), fp.dimmed());
                    }
                }
                None => println!("  {} {}", "Verdict:".bold(), "(no certificate received)".dimmed()),
            }
            if let (Some(p), Some(c)) = (&protocol, &cipher_suite) {
                println!("  {} {} / {}", "Session:".bold(), p, c);
            }
            if let Some(e) = &error {
                println!("  {} {}", "Error:".red().bold(), e);
            }
        }
    }

    Ok(exit_code(trusted))
}

struct Session {
    protocol: String,
    cipher_suite: String,
}

fn handshake(config: ClientConfig, target: &str, server_name: String, timeout: Duration) -> Result<Session> {
    let name = ServerName::try_from(server_name).context("invalid TLS server name")?;

    let addr = target
        .to_socket_addrs()
        .with_context(|| format!("resolving {target}"))?
        .next()
        .ok_or_else(|| anyhow::anyhow!("{target} did not resolve to any address"))?;
    let mut sock = TcpStream::connect_timeout(&addr, timeout).with_context(|| format!("connecting to {addr}"))?;
    sock.set_read_timeout(Some(timeout))?;
    sock.set_write_timeout(Some(timeout))?;

    let mut conn = ClientConnection::new(Arc::new(config), name)?;
    while conn.is_handshaking() {
        conn.complete_io(&mut sock).context("TLS handshake failed")?;
    }
    // Flush anything queued after the handshake before closing.
    conn.send_close_notify();
    conn.complete_io(&mut sock).ok();
    sock.flush().ok();

    Ok(Session {
        protocol: conn
            .protocol_version()
            .map_or_else(|| "unknown".into(), |v| format!("{v:?}")),
        cipher_suite: conn
            .negotiated_cipher_suite()
            .map_or_else(|| "unknown".into(), |s| format!("{:?}", s.suite())),
    })
}

/// Anchor-side verdict behind a failed handshake, if the anchor caused it.
///
/// rustls errors reach us wrapped in the `io::Error` from `complete_io`.
fn anchor_rejection(err: &anyhow::Error) -> Option<Verdict> {
    err.chain()
        .find_map(|cause| {
            cause.downcast_ref::<pinroot::rustls::Error>().or_else(|| {
                cause
                    .downcast_ref::<std::io::Error>()
                    .and_then(std::io::Error::get_ref)
                    .and_then(|inner| inner.downcast_ref::<pinroot::rustls::Error>())
            })
        })
        .and_then(anchor_verdict)
}

fn describe_failure(err: &anyhow::Error) -> String {
    match anchor_rejection(err) {
        Some(verdict) => format!(
            "{}. The device cannot establish trust; re-provision it with a valid anchor.",
            RejectedByAnchor { verdict }
        ),
        None => format!("{err:#}"),
    }
}

/// Host portion of `host:port`, `[v6]:port` or a bare host.
fn host_part(target: &str) -> &str {
    if let Some(rest) = target.strip_prefix('[') {
        return rest.split_once(']').map_or(rest, |(host, _)| host);
    }
    match target.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') && port.parse::<u16>().is_ok() => host,
        _ => target,
    }
}
