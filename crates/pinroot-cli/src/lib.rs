//! # pinroot-cli
//!
//! Command-line front end for the pinned-root trust core.
//!
//! ## Commands
//!
//! - **inspect**: anchor details and current health
//! - **verify**: offline validation of a PEM chain file
//! - **health**: expiry guard state, once or continuously
//! - **probe**: live TLS handshake with the pinned verifier
//! - **config**: show the effective configuration or its path

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
