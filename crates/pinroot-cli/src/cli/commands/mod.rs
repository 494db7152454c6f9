//! Command implementations.

pub mod config;
pub mod health;
pub mod inspect;
pub mod probe;
pub mod verify;

use anyhow::Result;
use chrono::{DateTime, Utc};
use pinroot::{Clock, ExpiryGuard, FixedClock, PinConfig, PinError, SystemClock, TrustAnchorStore};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::config::Config;
use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Effective configuration (file plus command-line overrides)
    pub config: Config,

    /// Where the config file lives
    pub config_path: PathBuf,

    /// Output format
    pub output_format: OutputFormat,
}

impl Context {
    /// Pinning settings.
    pub const fn pin(&self) -> &PinConfig {
        &self.config.pin
    }

    /// Load the configured anchor. Anchor problems get the re-provisioning hint.
    pub fn anchor_store(&self) -> Result<TrustAnchorStore> {
        self.pin().load_anchor().map_err(fatal_hint)
    }

    /// Expiry guard over the anchor, on the wall clock or frozen at `at`.
    pub fn guard(&self, at: Option<DateTime<Utc>>) -> Result<Arc<ExpiryGuard>> {
        let store = self.anchor_store()?;
        let clock: Arc<dyn Clock> = match at {
            Some(t) => Arc::new(FixedClock(t)),
            None => Arc::new(SystemClock),
        };
        Ok(Arc::new(ExpiryGuard::with_clock(
            store.current(),
            self.pin().guard.clone(),
            clock,
        )))
    }
}

/// Attach the "device cannot start" explanation to fatal anchor errors.
pub fn fatal_hint(err: PinError) -> anyhow::Error {
    if err.is_fatal() {
        anyhow::anyhow!(
            "{err}\n\n\
             The device cannot establish trust and must not start networking.\n\
             Re-provision it with a valid anchor."
        )
    } else {
        err.into()
    }
}

/// Exit status for a pass/fail result.
pub fn exit_code(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
