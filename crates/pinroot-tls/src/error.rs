//! Mapping verdicts onto rustls errors.

use pinroot_core::{CertRole, Verdict};
use rustls::{CertificateError, OtherError};
use std::sync::Arc;
use thiserror::Error;

/// The pinned anchor itself is unusable; re-provision the device.
///
/// Carried inside `CertificateError::Other` so it survives the trip through
/// rustls and can be told apart from peer-side failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rejected by pinned trust anchor: {verdict}")]
pub struct RejectedByAnchor {
    /// The anchor-side verdict
    pub verdict: Verdict,
}

/// Convert a rejecting verdict into the error rustls aborts the handshake with.
pub fn verdict_to_error(verdict: Verdict) -> rustls::Error {
    let reason = match verdict {
        Verdict::Expired(CertRole::Anchor) | Verdict::NotYetValid(CertRole::Anchor) => {
            CertificateError::Other(OtherError(Arc::new(RejectedByAnchor { verdict })))
        }
        Verdict::Expired(CertRole::Peer) => CertificateError::Expired,
        Verdict::NotYetValid(CertRole::Peer) => CertificateError::NotValidYet,
        Verdict::NameMismatch => CertificateError::NotValidForName,
        Verdict::MalformedCertificate => CertificateError::BadEncoding,
        // Trusted never reaches here; treat it as the most conservative failure.
        Verdict::UntrustedIssuer | Verdict::Trusted => CertificateError::UnknownIssuer,
    };
    rustls::Error::InvalidCertificate(reason)
}

/// The anchor-side verdict behind `err`, if the anchor caused the rejection.
pub fn anchor_verdict(err: &rustls::Error) -> Option<Verdict> {
    match err {
        rustls::Error::InvalidCertificate(CertificateError::Other(other)) => other
            .0
            .downcast_ref::<RejectedByAnchor>()
            .map(|rejected| rejected.verdict),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_failures_use_standard_reasons() {
        assert!(matches!(
            verdict_to_error(Verdict::Expired(CertRole::Peer)),
            rustls::Error::InvalidCertificate(CertificateError::Expired)
        ));
        assert!(matches!(
            verdict_to_error(Verdict::NameMismatch),
            rustls::Error::InvalidCertificate(CertificateError::NotValidForName)
        ));
        assert!(matches!(
            verdict_to_error(Verdict::UntrustedIssuer),
            rustls::Error::InvalidCertificate(CertificateError::UnknownIssuer)
        ));
        assert!(matches!(
            verdict_to_error(Verdict::MalformedCertificate),
            rustls::Error::InvalidCertificate(CertificateError::BadEncoding)
        ));
    }

    #[test]
    fn anchor_failures_are_recoverable_from_the_error() {
        let err = verdict_to_error(Verdict::Expired(CertRole::Anchor));
        let verdict = anchor_verdict(&err).unwrap();
        assert_eq!(verdict, Verdict::Expired(CertRole::Anchor));
        assert!(RejectedByAnchor { verdict }.to_string().starts_with("rejected by pinned trust anchor"));

        let err = verdict_to_error(Verdict::Expired(CertRole::Peer));
        assert_eq!(anchor_verdict(&err), None);
    }
}
