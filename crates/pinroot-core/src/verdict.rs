//! Validation verdicts.

use serde::{Deserialize, Serialize};

/// Which side of the trust relation a time failure concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertRole {
    /// A certificate presented by the remote peer
    Peer,
    /// The pinned root itself
    Anchor,
}

impl std::fmt::Display for CertRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Peer => write!(f, "peer"),
            Self::Anchor => write!(f, "anchor"),
        }
    }
}

/// Outcome of matching a peer chain against the pinned root.
///
/// Exactly one per validation attempt; never a combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "role", rename_all = "snake_case")]
pub enum Verdict {
    /// Chain terminates at the pinned root and everything checks out
    Trusted,
    /// Chain is not signed by the pinned root
    UntrustedIssuer,
    /// Current time is past a certificate's not-after
    Expired(CertRole),
    /// Current time is before a certificate's not-before
    NotYetValid(CertRole),
    /// Leaf does not name the expected host
    NameMismatch,
    /// Empty chain or bytes that do not decode as X.509
    MalformedCertificate,
}

impl Verdict {
    /// Whether the handshake may proceed.
    #[must_use]
    pub const fn is_trusted(&self) -> bool {
        matches!(self, Self::Trusted)
    }

    /// Whether the failure is the anchor's fault. The fix is
    /// re-provisioning, not checking the network or the server.
    #[must_use]
    pub const fn is_anchor_failure(&self) -> bool {
        matches!(
            self,
            Self::Expired(CertRole::Anchor) | Self::NotYetValid(CertRole::Anchor)
        )
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trusted => write!(f, "TRUSTED"),
            Self::UntrustedIssuer => write!(f, "UNTRUSTED ISSUER"),
            Self::Expired(role) => write!(f, "EXPIRED ({role})"),
            Self::NotYetValid(role) => write!(f, "NOT YET VALID ({role})"),
            Self::NameMismatch => write!(f, "NAME MISMATCH"),
            Self::MalformedCertificate => write!(f, "MALFORMED CERTIFICATE"),
        }
    }
}
