//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::constants::{
    DEFAULT_BACKOFF_MAX_MINUTES, DEFAULT_BACKOFF_MIN_MINUTES, DEFAULT_CRD_MANIFESTS_DIR,
    DEFAULT_METRICS_PORT, DEFAULT_RESYNC_INTERVAL_SECS, OPERATOR_NAME,
};
use std::path::PathBuf;
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have defaults and can be overridden via environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// HTTP port for `/metrics`, `/healthz` and `/readyz` (`METRICS_PORT`)
    pub metrics_port: u16,
    /// Directory holding `<version>/crd-*.yaml` (`CRD_MANIFESTS_DIR`)
    pub crd_manifests_dir: PathBuf,
    /// Requeue interval after a successful pass (`RESYNC_INTERVAL_SECS`)
    pub resync_interval_secs: u64,
    /// Fibonacci backoff floor in minutes (`BACKOFF_MIN_MINUTES`)
    pub backoff_min_minutes: u64,
    /// Fibonacci backoff ceiling in minutes (`BACKOFF_MAX_MINUTES`)
    pub backoff_max_minutes: u64,
    /// Event reporter and field manager name (`OPERATOR_NAME`)
    pub operator_name: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            crd_manifests_dir: PathBuf::from(DEFAULT_CRD_MANIFESTS_DIR),
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            backoff_min_minutes: DEFAULT_BACKOFF_MIN_MINUTES,
            backoff_max_minutes: DEFAULT_BACKOFF_MAX_MINUTES,
            operator_name: OPERATOR_NAME.to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// Unparseable values fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let min = parsed(&lookup, "BACKOFF_MIN_MINUTES", defaults.backoff_min_minutes).max(1);
        let max = parsed(&lookup, "BACKOFF_MAX_MINUTES", defaults.backoff_max_minutes).max(min);
        Self {
            metrics_port: parsed(&lookup, "METRICS_PORT", defaults.metrics_port),
            crd_manifests_dir: lookup("CRD_MANIFESTS_DIR")
                .map_or(defaults.crd_manifests_dir, PathBuf::from),
            resync_interval_secs: parsed(
                &lookup,
                "RESYNC_INTERVAL_SECS",
                defaults.resync_interval_secs,
            ),
            backoff_min_minutes: min,
            backoff_max_minutes: max,
            operator_name: lookup("OPERATOR_NAME").unwrap_or(defaults.operator_name),
        }
    }

    /// Get resync interval duration
    #[must_use]
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }
}

/// Read a key and parse it, or return the default
fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> ControllerConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ControllerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_map(&[]);
        assert_eq!(config, ControllerConfig::default());
        assert_eq!(config.metrics_port, 5000);
        assert_eq!(config.resync_interval(), Duration::from_secs(300));
        assert_eq!(config.crd_manifests_dir, PathBuf::from("/manifests/crds"));
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("METRICS_PORT", "9090"),
            ("CRD_MANIFESTS_DIR", "/opt/crds"),
            ("RESYNC_INTERVAL_SECS", "60"),
            ("OPERATOR_NAME", "custom-operator"),
        ]);
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.crd_manifests_dir, PathBuf::from("/opt/crds"));
        assert_eq!(config.resync_interval_secs, 60);
        assert_eq!(config.operator_name, "custom-operator");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_map(&[("METRICS_PORT", "not-a-port"), ("RESYNC_INTERVAL_SECS", "-1")]);
        assert_eq!(config.metrics_port, 5000);
        assert_eq!(config.resync_interval_secs, 300);
    }

    #[test]
    fn test_backoff_bounds_are_ordered() {
        let config = from_map(&[("BACKOFF_MIN_MINUTES", "5"), ("BACKOFF_MAX_MINUTES", "2")]);
        assert_eq!(config.backoff_min_minutes, 5);
        assert_eq!(config.backoff_max_minutes, 5);
    }
}
