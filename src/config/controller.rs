//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::config::duration::parse_kubernetes_duration;
use std::time::Duration;
use tracing::warn;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// The value is built once at startup and handed to every reconcile through the context.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Minimum time between two synchronizations of an unchanged ApiEndpoints
    pub sync_interval: Duration,
    /// Create and update allow NetworkPolicies for discovered backend apps
    pub netpol_enabled: bool,
    /// Cluster domain used to match `<app>.<namespace>.svc.<domain>` backend hosts
    pub cluster_domain: String,
    /// Deadline for a single reconcile invocation
    pub reconcile_timeout: Duration,
    /// How many times the partials synchronization is re-run after a write conflict
    pub artifact_conflict_retries: u32,
    /// Maximum concurrent reconciliations
    pub max_concurrent_reconciliations: u16,
    /// Restrict the watch to a single namespace (all namespaces when unset)
    pub watch_namespace: Option<String>,
    /// HTTP port for metrics and probes
    pub metrics_port: u16,
    /// Tracing filter directive, e.g. `info` or `krakend_endpoints_controller=debug`
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
    /// Lower bound of the per-resource error backoff
    pub error_backoff_min: Duration,
    /// Upper bound of the per-resource error backoff
    pub error_backoff_max: Duration,
    /// How long to wait for the HTTP server to bind at startup
    pub server_startup_timeout: Duration,
    /// Poll interval while waiting for the HTTP server
    pub server_poll_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            sync_interval: Duration::from_secs(3600),
            netpol_enabled: false,
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_string(),
            reconcile_timeout: Duration::from_secs(DEFAULT_RECONCILE_TIMEOUT_SECS),
            artifact_conflict_retries: DEFAULT_ARTIFACT_CONFLICT_RETRIES,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            watch_namespace: None,
            metrics_port: DEFAULT_METRICS_PORT,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            error_backoff_min: Duration::from_secs(DEFAULT_ERROR_BACKOFF_MIN_SECS),
            error_backoff_max: Duration::from_secs(DEFAULT_ERROR_BACKOFF_MAX_SECS),
            server_startup_timeout: Duration::from_secs(DEFAULT_SERVER_STARTUP_TIMEOUT_SECS),
            server_poll_interval: Duration::from_millis(DEFAULT_SERVER_POLL_INTERVAL_MS),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unset or unparsable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        use crate::constants::*;

        let sync_interval_str =
            lookup("SYNC_INTERVAL").unwrap_or_else(|| DEFAULT_SYNC_INTERVAL.to_string());
        let sync_interval = match parse_kubernetes_duration(&sync_interval_str) {
            Ok(interval) => interval,
            Err(e) => {
                warn!(
                    "Invalid SYNC_INTERVAL '{}': {}. Falling back to {}",
                    sync_interval_str, e, DEFAULT_SYNC_INTERVAL
                );
                Duration::from_secs(3600)
            }
        };

        Self {
            sync_interval,
            netpol_enabled: parse_bool(lookup("NETPOL_ENABLED"), false),
            cluster_domain: lookup("CLUSTER_DOMAIN")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CLUSTER_DOMAIN.to_string()),
            reconcile_timeout: Duration::from_secs(parse_or(
                lookup("RECONCILE_TIMEOUT_SECS"),
                DEFAULT_RECONCILE_TIMEOUT_SECS,
            )),
            artifact_conflict_retries: parse_or(
                lookup("ARTIFACT_CONFLICT_RETRIES"),
                DEFAULT_ARTIFACT_CONFLICT_RETRIES,
            ),
            max_concurrent_reconciliations: parse_or(
                lookup("MAX_CONCURRENT_RECONCILIATIONS"),
                DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            ),
            watch_namespace: lookup("WATCH_NAMESPACE").filter(|v| !v.trim().is_empty()),
            metrics_port: parse_or(lookup("METRICS_PORT"), DEFAULT_METRICS_PORT),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format: lookup("LOG_FORMAT").unwrap_or_else(|| "text".to_string()),
            error_backoff_min: Duration::from_secs(parse_or(
                lookup("ERROR_BACKOFF_MIN_SECS"),
                DEFAULT_ERROR_BACKOFF_MIN_SECS,
            )),
            error_backoff_max: Duration::from_secs(parse_or(
                lookup("ERROR_BACKOFF_MAX_SECS"),
                DEFAULT_ERROR_BACKOFF_MAX_SECS,
            )),
            server_startup_timeout: Duration::from_secs(DEFAULT_SERVER_STARTUP_TIMEOUT_SECS),
            server_poll_interval: Duration::from_millis(DEFAULT_SERVER_POLL_INTERVAL_MS),
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| {
            let v_lower = v.trim().to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}
