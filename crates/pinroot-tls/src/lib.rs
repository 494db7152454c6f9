//! Handshake binding: plugs the pinned root into rustls.
//!
//! [`PinnedServerVerifier`] implements rustls' `ServerCertVerifier`. Before
//! each handshake it consults the [`ExpiryGuard`](pinroot_core::ExpiryGuard);
//! otherwise it runs [`pinroot_core::validate`] and turns the verdict into
//! accept or reject. Rejections carry a standard `CertificateError`, except
//! anchor-side failures which travel as [`RejectedByAnchor`].
//!
//! # Example
//!
//! ```rust,ignore
//! use pinroot_tls::{client_config, PinnedServerVerifier};
//!
//! let verifier = Arc::new(PinnedServerVerifier::from_config(&PinConfig::default())?);
//! let config = client_config(verifier)?;
//! let conn = rustls::ClientConnection::new(Arc::new(config), "localhost".try_into()?)?;
//! ```

#![doc(html_root_url = "https://docs.rs/pinroot-tls/0.1.0")]

mod binding;
mod client;
mod error;
pub mod observer;
mod signature;

pub use binding::PinnedServerVerifier;
pub use client::client_config;
pub use error::{anchor_verdict, verdict_to_error, RejectedByAnchor};
pub use observer::{TracingObserver, VerdictLog, VerdictObserver, VerdictRecord};
pub use signature::SUPPORTED_SCHEMES;
