//! Trust anchor store: the single pinned root.
//!
//! The anchor is handed to the store explicitly at startup, either from the
//! bytes compiled into the binary ([`BUNDLED_ANCHOR_PEM`]) or from a file
//! named in the config. Once loaded it is shared read-only behind an `Arc`
//! by every handshake; there is no way to swap it in place.

use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use x509_parser::prelude::{FromDer, SubjectPublicKeyInfo};

use crate::cert::{parse_exact, summarize, CertificateInfo, PEM_CERTIFICATE_TAG};
use crate::error::{PinError, Result};

/// Root certificate of the RFID borrowing backend, regenerated offline from
/// the server's `server.crt`.
///
/// Self-signed, CN=localhost, serial 1000,
/// valid 2025-11-12T17:59:28Z to 2026-11-12T17:59:28Z.
pub const BUNDLED_ANCHOR_PEM: &[u8] = include_bytes!("../anchors/backend_root.pem");

/// The pinned root certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootCertificate {
    der: Vec<u8>,
    public_key_der: Vec<u8>,
    info: CertificateInfo,
}

impl RootCertificate {
    /// Decode and check a DER anchor.
    ///
    /// The certificate must parse with no trailing bytes, name itself as
    /// issuer and carry a signature its own key verifies.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let cert = parse_exact(der).map_err(PinError::malformed)?;
        let info = summarize(der, &cert).map_err(PinError::malformed)?;

        if !info.self_issued {
            return Err(PinError::NotSelfSigned {
                subject: info.subject,
                issuer: info.issuer,
            });
        }
        cert.verify_signature(None)
            .map_err(|e| PinError::malformed(format!("self-signature does not verify: {e}")))?;

        Ok(Self {
            der: der.to_vec(),
            public_key_der: cert.public_key().raw.to_vec(),
            info,
        })
    }

    /// Raw DER bytes as provisioned.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Decoded metadata.
    #[must_use]
    pub const fn info(&self) -> &CertificateInfo {
        &self.info
    }

    /// Subject distinguished name.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.info.subject
    }

    /// Issuer distinguished name (equal to the subject).
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.info.issuer
    }

    /// Serial number (hex).
    #[must_use]
    pub fn serial(&self) -> &str {
        &self.info.serial
    }

    /// Start of the validity window.
    #[must_use]
    pub const fn not_before(&self) -> DateTime<Utc> {
        self.info.not_before
    }

    /// End of the validity window.
    #[must_use]
    pub const fn not_after(&self) -> DateTime<Utc> {
        self.info.not_after
    }

    /// SHA-256 fingerprint of the DER bytes (hex).
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.info.fingerprint
    }

    /// DER-encoded `SubjectPublicKeyInfo`.
    #[must_use]
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key_der
    }

    /// Parsed public key, borrowed from this anchor.
    pub(crate) fn public_key(&self) -> Option<SubjectPublicKeyInfo<'_>> {
        SubjectPublicKeyInfo::from_der(&self.public_key_der)
            .ok()
            .map(|(_, spki)| spki)
    }
}

/// Holds exactly one pinned root for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct TrustAnchorStore {
    anchor: Arc<RootCertificate>,
}

impl TrustAnchorStore {
    /// Parse PEM bytes holding exactly one `CERTIFICATE` block.
    ///
    /// Failure here is fatal for the device: see [`PinError::is_fatal`].
    pub fn load(pem_bytes: &[u8]) -> Result<Self> {
        let blocks = pem::parse_many(pem_bytes)
            .map_err(|e| PinError::malformed(format!("PEM decode: {e}")))?;

        let mut certs = blocks.iter().filter(|p| p.tag() == PEM_CERTIFICATE_TAG);
        let Some(block) = certs.next() else {
            return Err(PinError::malformed("no CERTIFICATE block found"));
        };
        if certs.next().is_some() {
            return Err(PinError::malformed(
                "more than one CERTIFICATE block; exactly one pinned root is supported",
            ));
        }

        Self::from_der(block.contents())
    }

    /// Load from DER bytes.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let anchor = RootCertificate::from_der(der)?;
        info!(
            subject = %anchor.subject(),
            serial = %anchor.serial(),
            not_after = %anchor.not_after(),
            fingerprint = %anchor.fingerprint(),
            "loaded pinned trust anchor"
        );
        Ok(Self {
            anchor: Arc::new(anchor),
        })
    }

    /// Load the anchor compiled into this build.
    pub fn bundled() -> Result<Self> {
        debug!("loading bundled trust anchor");
        Self::load(BUNDLED_ANCHOR_PEM)
    }

    /// Load a PEM anchor from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let path_str = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| PinError::io(&path_str, e))?;
        debug!(path = %path_str, "loading trust anchor from file");
        Self::load(&bytes)
    }

    /// The loaded anchor.
    #[must_use]
    pub fn current(&self) -> Arc<RootCertificate> {
        Arc::clone(&self.anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use std::io::Write;

    #[test]
    fn bundled_anchor_loads() {
        let store = TrustAnchorStore::bundled().unwrap();
        let anchor = store.current();
        assert_eq!(anchor.subject(), anchor.issuer());
        assert!(anchor.subject().contains("CN=localhost"));
        assert_eq!(anchor.serial(), "03:e8");
        assert_eq!(anchor.not_after(), fixtures::utc_hms(2026, 11, 12, 17, 59, 28));
        assert!(anchor.public_key().is_some());
    }

    #[test]
    fn current_shares_one_instance() {
        let store = TrustAnchorStore::bundled().unwrap();
        let a = store.current();
        let b = store.clone().current();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn synthetic_anchor_loads_from_pem() {
        let root = fixtures::root("Synthetic Root", fixtures::ymd(2025, 1, 1), fixtures::ymd(2030, 1, 1));
        let store = TrustAnchorStore::load(root.pem().as_bytes()).unwrap();
        assert_eq!(store.current().der(), root.der());
    }

    #[test]
    fn garbage_is_malformed_and_fatal() {
        let err = TrustAnchorStore::load(b"not a certificate").unwrap_err();
        assert!(matches!(err, PinError::MalformedAnchor { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn corrupt_der_inside_pem_is_malformed() {
        let block = pem::Pem::new("CERTIFICATE", vec![0x30, 0x82, 0x01]);
        let err = TrustAnchorStore::load(pem::encode(&block).as_bytes()).unwrap_err();
        assert!(matches!(err, PinError::MalformedAnchor { .. }));
    }

    #[test]
    fn two_certificates_rejected() {
        let a = fixtures::root("A", fixtures::ymd(2025, 1, 1), fixtures::ymd(2030, 1, 1));
        let b = fixtures::root("B", fixtures::ymd(2025, 1, 1), fixtures::ymd(2030, 1, 1));
        let bundle = format!("{}{}", a.pem(), b.pem());
        let err = TrustAnchorStore::load(bundle.as_bytes()).unwrap_err();
        assert!(matches!(err, PinError::MalformedAnchor { .. }));
    }

    #[test]
    fn issued_certificate_is_not_an_anchor() {
        let root = fixtures::root("Root", fixtures::ymd(2025, 1, 1), fixtures::ymd(2030, 1, 1));
        let leaf = fixtures::leaf(&["device.local"], &root, fixtures::ymd(2025, 1, 1), fixtures::ymd(2027, 1, 1));
        let err = TrustAnchorStore::from_der(leaf.der()).unwrap_err();
        assert!(matches!(err, PinError::NotSelfSigned { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn loads_from_file() {
        let root = fixtures::root("File Root", fixtures::ymd(2025, 1, 1), fixtures::ymd(2030, 1, 1));
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(root.pem().as_bytes()).unwrap();
        tmp.flush().unwrap();

        let store = TrustAnchorStore::from_file(tmp.path()).unwrap();
        assert_eq!(store.current().der(), root.der());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = TrustAnchorStore::from_file(Path::new("/nonexistent/anchor.pem")).unwrap_err();
        assert!(matches!(err, PinError::Io { .. }));
        assert!(!err.is_fatal());
    }
}
