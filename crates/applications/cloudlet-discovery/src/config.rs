//! Discovery configuration
//!
//! Loaded from an optional JSON file, then overridden by CLI flags.
//!
//! ```json
//! {
//!   "max_results": 5,
//!   "directory_timeout_ms": 5000,
//!   "probe_timeout_ms": 3000,
//!   "max_concurrent_probes": 16
//! }
//! ```

use crate::error::{DiscoveryError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Discovery configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// How many candidates to ask the directory for (`n=`)
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Bound on the directory round trip
    #[serde(default = "default_directory_timeout_ms")]
    pub directory_timeout_ms: u64,

    /// Bound on each individual probe
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Upper bound on probes in flight at once
    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,

    /// User-Agent header sent to the directory and to cloudlets
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_max_results() -> u32 {
    5
}

fn default_directory_timeout_ms() -> u64 {
    5_000
}

fn default_probe_timeout_ms() -> u64 {
    3_000
}

fn default_max_concurrent_probes() -> usize {
    16
}

fn default_user_agent() -> String {
    format!("cloudlet-discovery/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            directory_timeout_ms: default_directory_timeout_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            max_concurrent_probes: default_max_concurrent_probes(),
            user_agent: default_user_agent(),
        }
    }
}

impl DiscoveryConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: DiscoveryConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the number of candidates requested from the directory
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Set the directory timeout
    pub fn with_directory_timeout(mut self, timeout: Duration) -> Self {
        self.directory_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the per-probe timeout
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the probe concurrency limit
    pub fn with_max_concurrent_probes(mut self, limit: usize) -> Self {
        self.max_concurrent_probes = limit;
        self
    }

    pub fn directory_timeout(&self) -> Duration {
        Duration::from_millis(self.directory_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Reject values that would make discovery a no-op or hang
    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(DiscoveryError::config("max_results must be at least 1"));
        }
        if self.directory_timeout_ms == 0 {
            return Err(DiscoveryError::config("directory_timeout_ms must be positive"));
        }
        if self.probe_timeout_ms == 0 {
            return Err(DiscoveryError::config("probe_timeout_ms must be positive"));
        }
        if self.max_concurrent_probes == 0 {
            return Err(DiscoveryError::config("max_concurrent_probes must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_config_default() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.max_results, 5);
        assert_eq!(config.probe_timeout(), Duration::from_secs(3));
        assert!(config.user_agent.starts_with("cloudlet-discovery/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_discovery_config_builder() {
        let config = DiscoveryConfig::default()
            .with_max_results(10)
            .with_directory_timeout(Duration::from_millis(750))
            .with_probe_timeout(Duration::from_secs(1))
            .with_max_concurrent_probes(4);

        assert_eq!(config.max_results, 10);
        assert_eq!(config.directory_timeout(), Duration::from_millis(750));
        assert_eq!(config.probe_timeout_ms, 1000);
        assert_eq!(config.max_concurrent_probes, 4);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: DiscoveryConfig = serde_json::from_str(r#"{"max_results": 3}"#).unwrap();
        assert_eq!(config.max_results, 3);
        assert_eq!(config.directory_timeout_ms, 5_000);
        assert_eq!(config.max_concurrent_probes, 16);
    }

    #[test]
    fn test_validate_rejects_zero() {
        assert!(DiscoveryConfig::default().with_max_results(0).validate().is_err());
        assert!(
            DiscoveryConfig::default()
                .with_max_concurrent_probes(0)
                .validate()
                .is_err()
        );
        assert!(
            DiscoveryConfig::default()
                .with_probe_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_from_file_missing() {
        let err = DiscoveryConfig::from_file("/nonexistent/cloudlet.json").unwrap_err();
        assert!(matches!(err, DiscoveryError::Io(_)));
    }
}
