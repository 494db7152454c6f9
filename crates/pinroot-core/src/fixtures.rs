//! Synthetic certificates for tests.
//!
//! Enabled for this crate's unit tests and, through the `test-fixtures`
//! feature, for sibling crates. Every certificate uses a fresh ECDSA P-256
//! key and an explicit validity window so tests never depend on the wall
//! clock.

#![allow(clippy::missing_panics_doc)]

use chrono::{DateTime, TimeZone, Utc};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    KeyUsagePurpose,
};

pub use rcgen::date_time_ymd as ymd;
pub use time::OffsetDateTime;

/// A generated certificate together with its private key.
pub struct Issued {
    /// The signed certificate
    pub cert: Certificate,
    /// Key the certificate was issued for
    pub key: KeyPair,
}

impl Issued {
    /// DER bytes of the certificate.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        self.cert.der().as_ref()
    }

    /// PEM encoding of the certificate.
    #[must_use]
    pub fn pem(&self) -> String {
        self.cert.pem()
    }
}

/// Midnight UTC on the given date.
#[must_use]
pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    utc_hms(year, month, day, 0, 0, 0)
}

/// A UTC instant with second precision.
#[must_use]
pub fn utc_hms(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
        .single()
        .expect("valid fixture date")
}

fn ca_params(common_name: &str, not_before: OffsetDateTime, not_after: OffsetDateTime) -> CertificateParams {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    dn.push(DnType::OrganizationName, "RFID Borrowing System");
    params.distinguished_name = dn;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::DigitalSignature];
    params.not_before = not_before;
    params.not_after = not_after;
    params
}

/// A self-signed root valid over `[not_before, not_after]`.
#[must_use]
pub fn root(common_name: &str, not_before: OffsetDateTime, not_after: OffsetDateTime) -> Issued {
    let key = KeyPair::generate().expect("generate root key");
    let cert = ca_params(common_name, not_before, not_after)
        .self_signed(&key)
        .expect("self-sign root");
    Issued { cert, key }
}

/// A CA certificate issued by `issuer`.
#[must_use]
pub fn intermediate(
    common_name: &str,
    issuer: &Issued,
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
) -> Issued {
    let key = KeyPair::generate().expect("generate intermediate key");
    let cert = ca_params(common_name, not_before, not_after)
        .signed_by(&key, &issuer.cert, &issuer.key)
        .expect("sign intermediate");
    Issued { cert, key }
}

/// A server leaf for `names` (DNS names or IP literals), issued by `issuer`.
///
/// The first name also becomes the subject common name.
#[must_use]
pub fn leaf(names: &[&str], issuer: &Issued, not_before: OffsetDateTime, not_after: OffsetDateTime) -> Issued {
    let key = KeyPair::generate().expect("generate leaf key");
    let mut params = CertificateParams::new(names.iter().map(|n| (*n).to_string()).collect::<Vec<_>>())
        .expect("leaf params");
    let mut dn = DistinguishedName::new();
    if let Some(first) = names.first() {
        dn.push(DnType::CommonName, *first);
    }
    params.distinguished_name = dn;
    params.is_ca = IsCa::ExplicitNoCa;
    params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
    params.not_before = not_before;
    params.not_after = not_after;
    let cert = params
        .signed_by(&key, &issuer.cert, &issuer.key)
        .expect("sign leaf");
    Issued { cert, key }
}

/// A self-signed server certificate with only a subject CN, no SAN.
///
/// Mirrors how the bundled backend certificate is built: the server
/// certificate is its own root.
#[must_use]
pub fn self_signed_server(common_name: &str, not_before: OffsetDateTime, not_after: OffsetDateTime) -> Issued {
    let key = KeyPair::generate().expect("generate server key");
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    params.distinguished_name = dn;
    params.not_before = not_before;
    params.not_after = not_after;
    let cert = params.self_signed(&key).expect("self-sign server");
    Issued { cert, key }
}
