//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `krakend_endpoints_reconciliations_total` - Total number of reconciliations
//! - `krakend_endpoints_reconciliation_errors_total` - Reconciliation errors by reason
//! - `krakend_endpoints_reconciliation_duration_seconds` - Duration of reconciliations
//! - `krakend_endpoints_syncs_skipped_total` - Reconciliations skipped by the sync throttle
//! - `krakend_endpoints_partials_writes_total` - Writes to partials ConfigMaps
//! - `krakend_endpoints_artifact_conflicts_total` - Partials write conflicts retried
//! - `krakend_endpoints_rollouts_triggered_total` - Deployment checksum updates
//! - `krakend_endpoints_network_policies_applied_total` - NetworkPolicy writes by operation
//! - `krakend_endpoints_finalizations_total` - Finalizers removed after cleanup

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "krakend_endpoints_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "krakend_endpoints_reconciliation_errors_total",
            "Total number of reconciliation errors by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "krakend_endpoints_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static SYNCS_SKIPPED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "krakend_endpoints_syncs_skipped_total",
        "Total number of reconciliations skipped because the spec was unchanged and recently synchronized",
    )
    .expect("Failed to create SYNCS_SKIPPED_TOTAL metric - this should never happen")
});

static PARTIALS_WRITES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "krakend_endpoints_partials_writes_total",
        "Total number of writes to partials ConfigMaps",
    )
    .expect("Failed to create PARTIALS_WRITES_TOTAL metric - this should never happen")
});

static ARTIFACT_CONFLICTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "krakend_endpoints_artifact_conflicts_total",
        "Total number of partials ConfigMap write conflicts that were retried",
    )
    .expect("Failed to create ARTIFACT_CONFLICTS_TOTAL metric - this should never happen")
});

static ROLLOUTS_TRIGGERED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "krakend_endpoints_rollouts_triggered_total",
        "Total number of KrakenD Deployment checksum annotation updates",
    )
    .expect("Failed to create ROLLOUTS_TRIGGERED_TOTAL metric - this should never happen")
});

static NETWORK_POLICIES_APPLIED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "krakend_endpoints_network_policies_applied_total",
            "Total number of allow NetworkPolicy writes by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create NETWORK_POLICIES_APPLIED_TOTAL metric - this should never happen")
});

static FINALIZATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "krakend_endpoints_finalizations_total",
        "Total number of ApiEndpoints finalizers removed after cleanup",
    )
    .expect("Failed to create FINALIZATIONS_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
/// Register all collectors with the controller registry
///
/// Fails if called twice.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(SYNCS_SKIPPED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PARTIALS_WRITES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ARTIFACT_CONFLICTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ROLLOUTS_TRIGGERED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(NETWORK_POLICIES_APPLIED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(FINALIZATIONS_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors(reason: &str) {
    RECONCILIATION_ERRORS_TOTAL
        .with_label_values(&[reason])
        .inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_skipped_syncs() {
    SYNCS_SKIPPED_TOTAL.inc();
}

pub fn increment_partials_writes() {
    PARTIALS_WRITES_TOTAL.inc();
}

pub fn increment_artifact_conflicts() {
    ARTIFACT_CONFLICTS_TOTAL.inc();
}

pub fn increment_rollouts_triggered() {
    ROLLOUTS_TRIGGERED_TOTAL.inc();
}

/// `operation` is `create` or `update`
pub fn increment_network_policies_applied(operation: &str) {
    NETWORK_POLICIES_APPLIED_TOTAL
        .with_label_values(&[operation])
        .inc();
}

pub fn increment_finalizations() {
    FINALIZATIONS_TOTAL.inc();
}
