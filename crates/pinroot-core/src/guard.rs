//! Expiry/rotation guard for the pinned anchor.
//!
//! ```text
//!   Healthy --(inside warning threshold)--> Warning --(past not-after)--> Expired
//! ```
//!
//! `Expired` is terminal for the anchor instance: once observed it is
//! latched, even if the clock later moves backwards, and the handshake
//! binding refuses every connection until the device is re-provisioned and
//! restarted with a new anchor.
//!
//! Handshakes read a cached [`AnchorHealth`] (refreshed after
//! `cache_ttl_secs`); the cache behind an `RwLock` is the only mutable state.
//! State changes are published on a `tokio::sync::watch` channel for an
//! external monitor.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::anchor::RootCertificate;
use crate::config::GuardConfig;
use crate::error::{PinError, Result};
use crate::verdict::{CertRole, Verdict};

/// Guard state for the current anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorState {
    /// More than the warning threshold remains
    Healthy,
    /// Inside the warning threshold, still usable
    Warning,
    /// Past not-after, no connections allowed
    Expired,
}

impl std::fmt::Display for AnchorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "HEALTHY"),
            Self::Warning => write!(f, "WARNING"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// Anchor health at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorHealth {
    /// Guard state
    pub state: AnchorState,
    /// When this value was computed
    pub checked_at: DateTime<Utc>,
    /// Anchor not-after
    pub not_after: DateTime<Utc>,
    /// Whole days left before not-after (negative once expired)
    pub days_until_expiry: i64,
}

impl AnchorHealth {
    /// Compute health of `anchor` at `now`.
    #[must_use]
    pub fn evaluate(anchor: &RootCertificate, now: DateTime<Utc>, warning_threshold: Duration) -> Self {
        let not_after = anchor.not_after();
        let remaining = not_after - now;
        let state = if now > not_after {
            AnchorState::Expired
        } else if remaining <= warning_threshold {
            AnchorState::Warning
        } else {
            AnchorState::Healthy
        };

        Self {
            state,
            checked_at: now,
            not_after,
            days_until_expiry: remaining.num_days(),
        }
    }

    /// Whether new handshakes may be attempted.
    #[must_use]
    pub fn permits_connections(&self) -> bool {
        self.state != AnchorState::Expired
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current UTC instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant (offline checks, `--at`).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Watches the anchor's validity window and gates handshakes.
#[derive(Debug)]
pub struct ExpiryGuard {
    anchor: Arc<RootCertificate>,
    config: GuardConfig,
    clock: Arc<dyn Clock>,
    cache: RwLock<Option<AnchorHealth>>,
    expired: AtomicBool,
    signal: watch::Sender<AnchorHealth>,
}

impl ExpiryGuard {
    /// Create a guard on the wall clock and run the startup check.
    #[must_use]
    pub fn new(anchor: Arc<RootCertificate>, config: GuardConfig) -> Self {
        Self::with_clock(anchor, config, Arc::new(SystemClock))
    }

    /// Create a guard on `clock` and run the startup check.
    #[must_use]
    pub fn with_clock(anchor: Arc<RootCertificate>, config: GuardConfig, clock: Arc<dyn Clock>) -> Self {
        let initial = AnchorHealth::evaluate(&anchor, clock.now(), config.warning_threshold());
        let (signal, _) = watch::channel(initial);
        let guard = Self {
            anchor,
            config,
            clock,
            cache: RwLock::new(None),
            expired: AtomicBool::new(false),
            signal,
        };
        guard.check();
        guard
    }

    /// The anchor this guard watches.
    #[must_use]
    pub fn anchor(&self) -> &Arc<RootCertificate> {
        &self.anchor
    }

    /// Recompute health now, refresh the cache and publish it.
    pub fn check(&self) -> AnchorHealth {
        let now = self.clock.now();
        let mut health = AnchorHealth::evaluate(&self.anchor, now, self.config.warning_threshold());

        // The latch is read and the value published under the write lock, so a
        // check that sampled the clock before expiry cannot overwrite `Expired`.
        let previous = {
            let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
            if health.state == AnchorState::Expired {
                self.expired.store(true, Ordering::Release);
            } else if self.expired.load(Ordering::Acquire) {
                health.state = AnchorState::Expired;
            }
            let previous = cache.replace(health).map(|h| h.state);
            self.signal.send_replace(health);
            previous
        };

        if previous == Some(health.state) {
            debug!(state = %health.state, days_left = health.days_until_expiry, "anchor health unchanged");
        } else {
            log_transition(previous, &health, self.anchor.subject());
        }

        health
    }

    /// Health for a handshake: the cached value while fresh, else a new check.
    pub fn health(&self) -> AnchorHealth {
        let cached = *self.cache.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(health) = cached {
            if health.state == AnchorState::Expired {
                return health;
            }
            let age = self.clock.now() - health.checked_at;
            if age >= Duration::zero() && age < self.config.cache_ttl() {
                return health;
            }
        }
        self.check()
    }

    /// Gate a connection attempt: `Err(Expired(anchor))` once expired.
    pub fn admit(&self) -> std::result::Result<AnchorHealth, Verdict> {
        let health = self.health();
        if health.permits_connections() {
            Ok(health)
        } else {
            Err(Verdict::Expired(CertRole::Anchor))
        }
    }

    /// Startup gate: a fresh check that fails with
    /// [`PinError::AnchorExpired`] when the network subsystem must not start.
    pub fn ensure_usable(&self) -> Result<AnchorHealth> {
        let health = self.check();
        if health.permits_connections() {
            Ok(health)
        } else {
            Err(PinError::AnchorExpired {
                not_after: health.not_after,
            })
        }
    }

    /// Receive every published health value.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AnchorHealth> {
        self.signal.subscribe()
    }
}

fn log_transition(previous: Option<AnchorState>, health: &AnchorHealth, subject: &str) {
    let from = previous.map_or_else(|| "startup".to_string(), |s| s.to_string());
    match health.state {
        AnchorState::Healthy => info!(
            from = %from,
            anchor = subject,
            not_after = %health.not_after,
            days_left = health.days_until_expiry,
            "pinned anchor healthy"
        ),
        AnchorState::Warning => warn!(
            from = %from,
            anchor = subject,
            not_after = %health.not_after,
            days_left = health.days_until_expiry,
            "pinned anchor expires soon, schedule re-provisioning"
        ),
        AnchorState::Expired => error!(
            from = %from,
            anchor = subject,
            not_after = %health.not_after,
            "pinned anchor expired, refusing new connections until re-provisioned"
        ),
    }
}

/// Re-check the anchor every `check_interval_secs` until it expires.
///
/// The first check runs immediately. Resolves with the `Expired` health
/// value; abort the handle to stop earlier.
///
/// # Panics
///
/// Panics when called outside a Tokio runtime.
pub fn spawn_monitor(guard: Arc<ExpiryGuard>) -> JoinHandle<AnchorHealth> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(guard.config.check_interval());
        loop {
            ticker.tick().await;
            let health = guard.check();
            if health.state == AnchorState::Expired {
                return health;
            }
        }
    })
}
