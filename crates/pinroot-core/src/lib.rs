//! Pinned-root TLS trust verification for constrained clients.
//!
//! A device that talks to exactly one backend ships with exactly one
//! self-signed root certificate and no system trust store. This crate holds
//! the pieces that do not depend on a TLS stack:
//!
//! - **Anchor store**: [`TrustAnchorStore`] loads and checks the pinned root
//! - **Validator**: [`validate`] matches a peer chain against it and yields a [`Verdict`]
//! - **Guard**: [`ExpiryGuard`] tracks the anchor's validity window and gates connections
//!
//! # Example
//!
//! ```rust,ignore
//! use pinroot_core::{validate, PeerCertificateChain, TrustAnchorStore, Verdict};
//!
//! let store = TrustAnchorStore::bundled()?;
//! let chain = PeerCertificateChain::new(vec![leaf_der.as_slice()]);
//! let verdict = validate(&store.current(), &chain, chrono::Utc::now(), "localhost");
//! assert_eq!(verdict, Verdict::Trusted);
//! ```

#![doc(html_root_url = "https://docs.rs/pinroot-core/0.1.0")]

pub mod anchor;
pub mod cert;
pub mod config;
mod error;
pub mod guard;
pub mod hash;
pub mod hostname;
pub mod validate;
pub mod verdict;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use anchor::{RootCertificate, TrustAnchorStore, BUNDLED_ANCHOR_PEM};
pub use cert::{decode_pem_chain, inspect_der, CertificateInfo};
pub use config::{GuardConfig, PinConfig};
pub use error::{PinError, Result};
pub use guard::{spawn_monitor, AnchorHealth, AnchorState, Clock, ExpiryGuard, FixedClock, SystemClock};
pub use validate::{validate, PeerCertificateChain};
pub use verdict::{CertRole, Verdict};
