//! Chain-of-trust validation against the pinned root.
//!
//! [`validate`] is a pure function of its inputs: no clock reads, no shared
//! state, no I/O. Concurrent handshakes call it freely.
//!
//! ## Check order
//!
//! ```text
//! anchor window        -> Expired(anchor) / NotYetValid(anchor)   (explains everything else)
//! empty chain          -> MalformedCertificate
//! decode every cert    -> MalformedCertificate
//! leaf names host      -> NameMismatch
//! every cert's window  -> Expired(peer) / NotYetValid(peer)        (leaf first)
//! chain links + anchor -> UntrustedIssuer
//!                      -> Trusted
//! ```

use chrono::{DateTime, Utc};
use tracing::debug;
use x509_parser::prelude::X509Certificate;

use crate::anchor::RootCertificate;
use crate::cert::{parse_exact, summarize, CertificateInfo};
use crate::hostname;
use crate::verdict::{CertRole, Verdict};

/// Certificates presented by the peer, leaf first, borrowed from the
/// handshake buffers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerCertificateChain<'a> {
    certs: Vec<&'a [u8]>,
}

impl<'a> PeerCertificateChain<'a> {
    /// Build a chain from DER slices, leaf first.
    #[must_use]
    pub fn new(certs: Vec<&'a [u8]>) -> Self {
        Self { certs }
    }

    /// Build a chain from a leaf and the intermediates that follow it.
    pub fn from_parts<I>(leaf: &'a [u8], intermediates: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut certs = vec![leaf];
        certs.extend(intermediates);
        Self { certs }
    }

    /// The leaf certificate, if any.
    #[must_use]
    pub fn leaf(&self) -> Option<&'a [u8]> {
        self.certs.first().copied()
    }

    /// Number of certificates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// True when the peer sent nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// Iterate over DER slices, leaf first.
    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.certs.iter().copied()
    }
}

impl<'a> From<Vec<&'a [u8]>> for PeerCertificateChain<'a> {
    fn from(certs: Vec<&'a [u8]>) -> Self {
        Self::new(certs)
    }
}

/// Decide whether `chain` terminates at `anchor` for `expected_hostname`
/// at instant `now`.
#[must_use]
pub fn validate(
    anchor: &RootCertificate,
    chain: &PeerCertificateChain<'_>,
    now: DateTime<Utc>,
    expected_hostname: &str,
) -> Verdict {
    if let Some(verdict) = anchor.info().window_verdict(now, CertRole::Anchor) {
        debug!(%verdict, not_after = %anchor.not_after(), "anchor outside its validity window");
        return verdict;
    }

    if chain.is_empty() {
        debug!("peer presented an empty chain");
        return Verdict::MalformedCertificate;
    }

    // A server may append the root itself; only the certificates below it
    // need checking.
    let mut ders: Vec<&[u8]> = chain.iter().collect();
    if ders.len() > 1 && ders.last().is_some_and(|last| *last == anchor.der()) {
        ders.pop();
    }

    let mut parsed = Vec::with_capacity(ders.len());
    for (depth, der) in ders.iter().copied().enumerate() {
        let decoded = parse_exact(der).and_then(|cert| summarize(der, &cert).map(|info| (cert, info)));
        match decoded {
            Ok(pair) => parsed.push(pair),
            Err(reason) => {
                debug!(depth, %reason, "peer certificate failed to decode");
                return Verdict::MalformedCertificate;
            }
        }
    }

    let Some((_, leaf_info)) = parsed.first() else {
        return Verdict::MalformedCertificate;
    };
    if !hostname::matches(leaf_info, expected_hostname) {
        debug!(
            expected = expected_hostname,
            dns_names = ?leaf_info.dns_names,
            common_name = ?leaf_info.common_name,
            "leaf does not name the expected host"
        );
        return Verdict::NameMismatch;
    }

    for (depth, (_, info)) in parsed.iter().enumerate() {
        if let Some(verdict) = info.window_verdict(now, CertRole::Peer) {
            debug!(depth, subject = %info.subject, %verdict, "peer certificate outside its validity window");
            return verdict;
        }
    }

    if !links_verify(&parsed) || !signed_by_anchor(&parsed, anchor) {
        return Verdict::UntrustedIssuer;
    }

    Verdict::Trusted
}

/// Each certificate must be signed by the one after it, and a signer must
/// not declare itself a non-CA.
fn links_verify(parsed: &[(X509Certificate<'_>, CertificateInfo)]) -> bool {
    parsed.windows(2).enumerate().all(|(depth, pair)| {
        let (child, _) = &pair[0];
        let (parent, parent_info) = &pair[1];

        if let Ok(Some(bc)) = parent.basic_constraints() {
            if !bc.value.ca {
                debug!(depth = depth + 1, subject = %parent_info.subject, "signer is not a CA");
                return false;
            }
        }
        match child.verify_signature(Some(parent.public_key())) {
            Ok(()) => true,
            Err(e) => {
                debug!(depth, error = %e, "chain link signature does not verify");
                false
            }
        }
    })
}

fn signed_by_anchor(parsed: &[(X509Certificate<'_>, CertificateInfo)], anchor: &RootCertificate) -> bool {
    let Some((top, top_info)) = parsed.last() else {
        return false;
    };
    let Some(anchor_key) = anchor.public_key() else {
        return false;
    };
    match top.verify_signature(Some(&anchor_key)) {
        Ok(()) => true,
        Err(e) => {
            debug!(subject = %top_info.subject, issuer = %top_info.issuer, error = %e, "chain is not signed by the pinned root");
            false
        }
    }
}
