//! Error types for anchor provisioning and configuration.
//!
//! Per-handshake failures are not errors: they are [`Verdict`](crate::Verdict)
//! values. `PinError` covers the things that stop trust from being set up at
//! all.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for pinroot operations.
pub type Result<T> = std::result::Result<T, PinError>;

/// Errors raised while provisioning or configuring the trust anchor.
#[derive(Error, Debug)]
pub enum PinError {
    /// The anchor bytes do not decode as a single PEM/X.509 certificate.
    #[error("trust anchor is malformed: {reason}")]
    MalformedAnchor {
        /// What failed to decode
        reason: String,
    },

    /// The anchor is not a self-signed root.
    #[error("trust anchor is not self-signed: subject {subject}, issuer {issuer}")]
    NotSelfSigned {
        /// Subject distinguished name
        subject: String,
        /// Issuer distinguished name
        issuer: String,
    },

    /// The anchor's validity window has closed.
    #[error("trust anchor expired at {not_after}, re-provision the device")]
    AnchorExpired {
        /// End of the anchor's validity window
        not_after: DateTime<Utc>,
    },

    /// A certificate (not the anchor) failed to decode.
    #[error("certificate decode failed: {reason}")]
    Decode {
        /// What failed to decode
        reason: String,
    },

    /// A PEM bundle (peer chain file) could not be decoded.
    #[error("PEM decode failed for {source_name}: {reason}")]
    Pem {
        /// Where the PEM came from
        source_name: String,
        /// Decoder message
        reason: String,
    },

    /// Reading an anchor or config file failed.
    #[error("io error on {path}: {source}")]
    Io {
        /// File that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),
}

impl PinError {
    /// Build an `Io` error for `path`.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a `MalformedAnchor` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedAnchor {
            reason: reason.into(),
        }
    }

    /// Returns true if this error means the device was provisioned with
    /// an anchor it can never use. Retrying cannot fix embedded data, so the
    /// network subsystem must stay down.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MalformedAnchor { .. } | Self::NotSelfSigned { .. } | Self::AnchorExpired { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_problems_are_fatal() {
        assert!(PinError::malformed("bad base64").is_fatal());
        assert!(PinError::NotSelfSigned {
            subject: "CN=a".into(),
            issuer: "CN=b".into(),
        }
        .is_fatal());
        assert!(!PinError::Config("missing".into()).is_fatal());
        assert!(!PinError::io(
            "/tmp/x.pem",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone")
        )
        .is_fatal());
    }

    #[test]
    fn messages_name_the_problem() {
        let e = PinError::malformed("truncated DER");
        assert_eq!(e.to_string(), "trust anchor is malformed: truncated DER");
    }
}
