//! X.509 decoding into owned certificate metadata.
//!
//! `x509-parser` borrows from the DER buffer, so the validator re-parses
//! the bytes it holds on every call; [`CertificateInfo`] is the owned,
//! display-friendly summary kept around for logging and the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::{FromDer, X509Certificate};
use x509_parser::time::ASN1Time;

use crate::error::{PinError, Result};
use crate::hash::sha256_fingerprint;
use crate::verdict::{CertRole, Verdict};

/// PEM tag of an X.509 certificate block.
pub const PEM_CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Decoded summary of one certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    /// Subject distinguished name (human-readable)
    pub subject: String,
    /// Issuer distinguished name (human-readable)
    pub issuer: String,
    /// Serial number (hex, colon separated)
    pub serial: String,
    /// Not valid before
    pub not_before: DateTime<Utc>,
    /// Not valid after
    pub not_after: DateTime<Utc>,
    /// SHA-256 fingerprint of the DER bytes (hex)
    pub fingerprint: String,
    /// Subject common name, if any
    pub common_name: Option<String>,
    /// DNS names from the subject alternative name extension
    pub dns_names: Vec<String>,
    /// IP addresses from the subject alternative name extension
    pub ip_addresses: Vec<IpAddr>,
    /// Raw subject equals raw issuer
    pub self_issued: bool,
}

impl CertificateInfo {
    /// Window verdict for this certificate at `at`, reported as `role`.
    ///
    /// Both edges are inclusive: `None` for `at` in `[not_before, not_after]`.
    #[must_use]
    pub fn window_verdict(&self, at: DateTime<Utc>, role: CertRole) -> Option<Verdict> {
        if at > self.not_after {
            Some(Verdict::Expired(role))
        } else if at < self.not_before {
            Some(Verdict::NotYetValid(role))
        } else {
            None
        }
    }

    /// Whether `at` falls inside `[not_before, not_after]`.
    #[must_use]
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.window_verdict(at, CertRole::Peer).is_none()
    }
}

/// Parse DER bytes that must hold exactly one certificate.
///
/// Trailing bytes after the certificate are rejected.
pub(crate) fn parse_exact(der: &[u8]) -> std::result::Result<X509Certificate<'_>, String> {
    match X509Certificate::from_der(der) {
        Ok((rest, cert)) if rest.is_empty() => Ok(cert),
        Ok((rest, _)) => Err(format!("{} trailing bytes after certificate", rest.len())),
        Err(e) => Err(e.to_string()),
    }
}

/// Summarize an already parsed certificate.
///
/// Fails only if a validity timestamp is outside chrono's range.
pub(crate) fn summarize(der: &[u8], cert: &X509Certificate<'_>) -> std::result::Result<CertificateInfo, String> {
    let validity = cert.validity();
    let not_before = asn1_to_utc(validity.not_before).ok_or("not-before out of range")?;
    let not_after = asn1_to_utc(validity.not_after).ok_or("not-after out of range")?;

    let mut dns_names = Vec::new();
    let mut ip_addresses = Vec::new();
    if let Ok(Some(san)) = cert.subject_alternative_name() {
        for name in &san.value.general_names {
            match name {
                GeneralName::DNSName(dns) => dns_names.push((*dns).to_string()),
                GeneralName::IPAddress(bytes) => {
                    if let Some(ip) = ip_from_bytes(bytes) {
                        ip_addresses.push(ip);
                    }
                }
                _ => {}
            }
        }
    }

    let common_name = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string);

    Ok(CertificateInfo {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        serial: cert.raw_serial_as_string(),
        not_before,
        not_after,
        fingerprint: sha256_fingerprint(der),
        common_name,
        dns_names,
        ip_addresses,
        self_issued: cert.subject().as_raw() == cert.issuer().as_raw(),
    })
}

/// Decode a single DER certificate into its summary.
pub fn inspect_der(der: &[u8]) -> Result<CertificateInfo> {
    let cert = parse_exact(der).map_err(|reason| PinError::Decode { reason })?;
    summarize(der, &cert).map_err(|reason| PinError::Decode { reason })
}

/// Decode every `CERTIFICATE` block of a PEM bundle, in order.
///
/// Other block types (keys, CRLs) are skipped. The DER bodies are not
/// parsed here; a garbage body still comes back so that the validator can
/// classify it.
pub fn decode_pem_chain(input: &[u8], source_name: &str) -> Result<Vec<Vec<u8>>> {
    let blocks = pem::parse_many(input).map_err(|e| PinError::Pem {
        source_name: source_name.to_string(),
        reason: e.to_string(),
    })?;

    Ok(blocks
        .into_iter()
        .filter(|p| p.tag() == PEM_CERTIFICATE_TAG)
        .map(pem::Pem::into_contents)
        .collect())
}

/// Convert an ASN.1 `UTCTime` / `GeneralizedTime` to `DateTime<Utc>`.
pub(crate) fn asn1_to_utc(t: ASN1Time) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(t.timestamp(), 0)
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        _ => None,
    }
}
