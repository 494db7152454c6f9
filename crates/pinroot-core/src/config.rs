//! Pinning configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::anchor::TrustAnchorStore;
use crate::error::{PinError, Result};

/// Configuration for the pinned-trust layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinConfig {
    /// PEM anchor to load instead of the bundled one.
    #[serde(default)]
    pub anchor_path: Option<PathBuf>,

    /// Name checked against the leaf instead of the TLS server name.
    /// Needed when the device dials the backend by IP.
    #[serde(default)]
    pub expected_hostname: Option<String>,

    /// Expiry guard settings.
    #[serde(default)]
    pub guard: GuardConfig,
}

/// Expiry/rotation guard settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuardConfig {
    /// Days before not-after at which the guard enters `Warning`.
    #[serde(default = "default_warning_threshold_days")]
    pub warning_threshold_days: u32,

    /// How often the background monitor re-checks the anchor (seconds).
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// How long a computed health value is reused by handshakes (seconds).
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            warning_threshold_days: default_warning_threshold_days(),
            check_interval_secs: default_check_interval(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl GuardConfig {
    /// Warning threshold as a chrono duration.
    #[must_use]
    pub fn warning_threshold(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.warning_threshold_days))
    }

    /// Monitor interval.
    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Cache lifetime for handshake health lookups.
    #[must_use]
    pub fn cache_ttl(&self) -> chrono::Duration {
        let secs = i64::try_from(self.cache_ttl_secs).unwrap_or(i64::MAX);
        chrono::Duration::seconds(secs.min(i64::MAX / 1000))
    }

    fn validate(&self) -> Result<()> {
        if self.check_interval_secs == 0 {
            return Err(PinError::Config("guard.check_interval_secs must be positive".into()));
        }
        Ok(())
    }
}

impl PinConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let path_str = path.display().to_string();
            let content = std::fs::read_to_string(path).map_err(|e| PinError::io(&path_str, e))?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| PinError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but make no sense.
    pub fn validate(&self) -> Result<()> {
        self.guard.validate()?;
        if self.expected_hostname.as_deref().is_some_and(|h| h.trim().is_empty()) {
            return Err(PinError::Config("expected_hostname must not be empty".into()));
        }
        Ok(())
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PinError::Config(e.to_string()))
    }

    /// Load the configured anchor, or the bundled one.
    pub fn load_anchor(&self) -> Result<TrustAnchorStore> {
        match &self.anchor_path {
            Some(path) => TrustAnchorStore::from_file(path),
            None => TrustAnchorStore::bundled(),
        }
    }
}

// Default value functions for serde.
const fn default_warning_threshold_days() -> u32 {
    30
}

const fn default_check_interval() -> u64 {
    86_400
}

const fn default_cache_ttl() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PinConfig::default();
        assert!(config.anchor_path.is_none());
        assert!(config.expected_hostname.is_none());
        assert_eq!(config.guard.warning_threshold_days, 30);
        assert_eq!(config.guard.check_interval_secs, 86_400);
        assert_eq!(config.guard.cache_ttl_secs, 300);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = PinConfig::from_toml(
            r#"
            expected_hostname = "localhost"

            [guard]
            warning_threshold_days = 14
            "#,
        )
        .unwrap();
        assert_eq!(config.expected_hostname.as_deref(), Some("localhost"));
        assert_eq!(config.guard.warning_threshold_days, 14);
        assert_eq!(config.guard.check_interval_secs, 86_400);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = PinConfig::from_toml("[guard]\ncheck_interval_secs = 0\n").unwrap_err();
        assert!(matches!(err, PinError::Config(_)));
    }

    #[test]
    fn test_rejects_blank_hostname() {
        assert!(PinConfig::from_toml("expected_hostname = \"  \"\n").is_err());
    }

    #[test]
    fn test_roundtrip_through_file() {
        let config = PinConfig {
            anchor_path: Some(PathBuf::from("/etc/pinroot/anchor.pem")),
            expected_hostname: Some("device.local".into()),
            guard: GuardConfig {
                warning_threshold_days: 7,
                ..GuardConfig::default()
            },
        };
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(config.to_toml().unwrap().as_bytes()).unwrap();
        tmp.flush().unwrap();

        assert_eq!(PinConfig::load(tmp.path()).unwrap(), config);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = PinConfig::load(Path::new("/nonexistent/pinroot.toml")).unwrap();
        assert_eq!(config, PinConfig::default());
    }

    #[test]
    fn test_default_anchor_is_bundled() {
        let store = PinConfig::default().load_anchor().unwrap();
        assert!(store.current().subject().contains("CN=localhost"));
    }
}
