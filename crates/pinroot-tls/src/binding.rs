//! The rustls verification hook.
//!
//! Per handshake: consult the expiry guard, refuse with `Expired(anchor)`
//! without touching the chain once the anchor is gone, otherwise run the
//! pure validator. Every decision is reported to the observers exactly once.

use chrono::{DateTime, Utc};
use pinroot_core::hash::sha256_fingerprint;
use pinroot_core::{validate, ExpiryGuard, PeerCertificateChain, PinConfig, RootCertificate, Verdict};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, Error, SignatureScheme};
use std::sync::Arc;
use tracing::debug;

use crate::error::verdict_to_error;
use crate::observer::{TracingObserver, VerdictObserver, VerdictRecord};
use crate::signature::{self, Protocol, SUPPORTED_SCHEMES};

/// Server-certificate verifier that trusts exactly one pinned root.
#[derive(Debug)]
pub struct PinnedServerVerifier {
    anchor: Arc<RootCertificate>,
    guard: Arc<ExpiryGuard>,
    expected_hostname: Option<String>,
    observers: Vec<Arc<dyn VerdictObserver>>,
}

impl PinnedServerVerifier {
    /// Verifier for the anchor watched by `guard`, logging verdicts via `tracing`.
    #[must_use]
    pub fn new(guard: Arc<ExpiryGuard>) -> Self {
        Self {
            anchor: Arc::clone(guard.anchor()),
            guard,
            expected_hostname: None,
            observers: vec![Arc::new(TracingObserver)],
        }
    }

    /// Load the anchor named by `config` and build a guard and verifier for it.
    pub fn from_config(config: &PinConfig) -> pinroot_core::Result<Self> {
        let store = config.load_anchor()?;
        let guard = Arc::new(ExpiryGuard::new(store.current(), config.guard.clone()));
        let verifier = Self::new(guard);
        Ok(match &config.expected_hostname {
            Some(name) => verifier.with_expected_hostname(name.clone()),
            None => verifier,
        })
    }

    /// Check the leaf against `name` instead of the TLS server name.
    #[must_use]
    pub fn with_expected_hostname(mut self, name: impl Into<String>) -> Self {
        self.expected_hostname = Some(name.into());
        self
    }

    /// Also report verdicts to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn VerdictObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// The guard consulted before each handshake.
    #[must_use]
    pub const fn guard(&self) -> &Arc<ExpiryGuard> {
        &self.guard
    }

    /// The pinned anchor.
    #[must_use]
    pub const fn anchor(&self) -> &Arc<RootCertificate> {
        &self.anchor
    }

    /// Decide one handshake and report it.
    pub fn decide(&self, chain: &PeerCertificateChain<'_>, server_name: &str, now: DateTime<Utc>) -> Verdict {
        let hostname = self.expected_hostname.as_deref().unwrap_or(server_name);

        let verdict = match self.guard.admit() {
            Ok(_) => validate(&self.anchor, chain, now, hostname),
            Err(refused) => {
                debug!(host = hostname, "anchor expired, chain not examined");
                refused
            }
        };

        let record = VerdictRecord {
            at: now,
            hostname: hostname.to_string(),
            verdict,
            chain_len: chain.len(),
            leaf_fingerprint: chain.leaf().map(sha256_fingerprint),
        };
        for observer in &self.observers {
            observer.record(&record);
        }
        verdict
    }
}

fn to_utc(now: UnixTime) -> Result<DateTime<Utc>, Error> {
    i64::try_from(now.as_secs())
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| Error::General("handshake time out of range".into()))
}

impl ServerCertVerifier for PinnedServerVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, Error> {
        let chain = PeerCertificateChain::from_parts(
            end_entity.as_ref(),
            intermediates.iter().map(AsRef::as_ref),
        );
        let verdict = self.decide(&chain, &server_name.to_str(), to_utc(now)?);

        if verdict.is_trusted() {
            Ok(ServerCertVerified::assertion())
        } else {
            Err(verdict_to_error(verdict))
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        signature::verify(message, cert.as_ref(), dss, Protocol::Tls12)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        signature::verify(message, cert.as_ref(), dss, Protocol::Tls13)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        SUPPORTED_SCHEMES.to_vec()
    }
}
