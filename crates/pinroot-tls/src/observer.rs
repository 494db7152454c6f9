//! One verdict record per handshake.

use chrono::{DateTime, Utc};
use pinroot_core::Verdict;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tracing::{error, info, warn};

/// What happened on one handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictRecord {
    /// Verification time
    pub at: DateTime<Utc>,
    /// Name the leaf was checked against
    pub hostname: String,
    /// Outcome
    pub verdict: Verdict,
    /// Certificates the peer presented
    pub chain_len: usize,
    /// SHA-256 of the leaf DER, when there was a leaf
    pub leaf_fingerprint: Option<String>,
}

/// Receives a record for every handshake decision.
pub trait VerdictObserver: Send + Sync + std::fmt::Debug {
    /// Called once per handshake, after the decision.
    fn record(&self, record: &VerdictRecord);
}

/// Emits each record as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl VerdictObserver for TracingObserver {
    fn record(&self, record: &VerdictRecord) {
        let fingerprint = record.leaf_fingerprint.as_deref().unwrap_or("-");
        if record.verdict.is_trusted() {
            info!(
                host = %record.hostname,
                chain_len = record.chain_len,
                leaf = fingerprint,
                "peer certificate trusted"
            );
        } else if record.verdict.is_anchor_failure() {
            error!(
                host = %record.hostname,
                verdict = %record.verdict,
                "handshake refused: pinned anchor unusable, re-provision the device"
            );
        } else {
            warn!(
                host = %record.hostname,
                verdict = %record.verdict,
                chain_len = record.chain_len,
                leaf = fingerprint,
                "handshake refused"
            );
        }
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct VerdictLog {
    records: Mutex<Vec<VerdictRecord>>,
}

impl VerdictLog {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All records so far, oldest first.
    pub fn records(&self) -> Vec<VerdictRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent record.
    pub fn last(&self) -> Option<VerdictRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl VerdictObserver for VerdictLog {
    fn record(&self, record: &VerdictRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinroot_core::CertRole;

    fn record(verdict: Verdict) -> VerdictRecord {
        VerdictRecord {
            at: DateTime::from_timestamp(1_780_000_000, 0).unwrap(),
            hostname: "device.local".into(),
            verdict,
            chain_len: 1,
            leaf_fingerprint: Some("ab".repeat(32)),
        }
    }

    #[test]
    fn log_keeps_order() {
        let log = VerdictLog::new();
        assert!(log.last().is_none());
        log.record(&record(Verdict::Trusted));
        log.record(&record(Verdict::NameMismatch));
        assert_eq!(log.records().len(), 2);
        assert_eq!(log.last().unwrap().verdict, Verdict::NameMismatch);
    }

    #[test]
    fn tracing_observer_handles_every_kind() {
        let obs = TracingObserver;
        obs.record(&record(Verdict::Trusted));
        obs.record(&record(Verdict::Expired(CertRole::Anchor)));
        obs.record(&record(Verdict::UntrustedIssuer));
    }

    #[test]
    fn record_serializes() {
        let json = serde_json::to_value(record(Verdict::Expired(CertRole::Peer))).unwrap();
        assert_eq!(json["verdict"]["verdict"], "expired");
        assert_eq!(json["verdict"]["role"], "peer");
        assert_eq!(json["chain_len"], 1);
    }
}
