//! Pinned-root TLS trust verification for constrained clients.
//!
//! A device that talks to one backend trusts exactly one self-signed root,
//! compiled into the firmware. This crate bundles the anchor store, chain
//! validator and expiry guard from `pinroot-core` with the rustls binding
//! from `pinroot-tls`.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pinroot::{client_config, spawn_monitor, PinConfig, PinnedServerVerifier};
//!
//! #[tokio::main]
//! async fn main() -> pinroot::Result<()> {
//!     let verifier = Arc::new(PinnedServerVerifier::from_config(&PinConfig::default())?);
//!
//!     // Refuse to start networking with a dead anchor.
//!     verifier.guard().ensure_usable()?;
//!     let _monitor = spawn_monitor(Arc::clone(verifier.guard()));
//!
//!     let tls = client_config(verifier).expect("ring provider");
//!     // hand `tls` to the HTTP client
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Includes `tls`
//! - `tls` - rustls verifier and client config

#![doc(html_root_url = "https://docs.rs/pinroot/0.1.0")]

// Re-export core types
pub use pinroot_core::*;

// Re-export the rustls binding
#[cfg(feature = "tls")]
pub use pinroot_tls::{
    anchor_verdict, client_config, verdict_to_error, PinnedServerVerifier, RejectedByAnchor, TracingObserver,
    VerdictLog, VerdictObserver, VerdictRecord,
};

// Re-export runtime for convenience
#[cfg(feature = "tls")]
pub use rustls;
pub use tokio;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn facade_exposes_the_whole_flow() {
        let root = fixtures::root("Facade Root", fixtures::ymd(2025, 11, 12), fixtures::ymd(2026, 11, 12));
        let leaf = fixtures::leaf(&["device.local"], &root, fixtures::ymd(2025, 1, 1), fixtures::ymd(2027, 1, 1));
        let store = TrustAnchorStore::load(root.pem().as_bytes()).unwrap();

        let chain = PeerCertificateChain::new(vec![leaf.der()]);
        let at = fixtures::utc(2026, 6, 1);
        assert_eq!(validate(&store.current(), &chain, at, "device.local"), Verdict::Trusted);
        assert_eq!(
            validate(&store.current(), &chain, fixtures::utc(2027, 1, 1), "device.local"),
            Verdict::Expired(CertRole::Anchor)
        );
    }

    #[cfg(feature = "tls")]
    #[test]
    fn verifier_builds_a_client_config() {
        let root = fixtures::root("Facade Root", fixtures::ymd(2025, 11, 12), fixtures::ymd(2026, 11, 12));
        let anchor = Arc::new(RootCertificate::from_der(root.der()).unwrap());
        let guard = ExpiryGuard::with_clock(anchor, GuardConfig::default(), Arc::new(FixedClock(fixtures::utc(2026, 6, 1))));
        let verifier = Arc::new(PinnedServerVerifier::new(Arc::new(guard)));
        assert!(client_config(verifier).is_ok());
    }

    #[tokio::test]
    async fn monitor_reports_expiry() {
        let root = fixtures::root("Facade Root", fixtures::ymd(2025, 11, 12), fixtures::ymd(2026, 11, 12));
        let anchor = Arc::new(RootCertificate::from_der(root.der()).unwrap());
        let guard = Arc::new(ExpiryGuard::with_clock(
            anchor,
            GuardConfig::default(),
            Arc::new(FixedClock(fixtures::utc(2027, 1, 1))),
        ));

        let health = spawn_monitor(guard).await.unwrap();
        assert_eq!(health.state, AnchorState::Expired);
    }
}
