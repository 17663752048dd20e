//! # Error Policy
//!
//! Decides when a failed reconcile runs again.
//!
//! Retryable failures back off per resource along a Fibonacci sequence so one
//! broken declaration cannot crowd out the others. Failures that only a human
//! can fix (foreign ConfigMap, missing partials key) are logged as errors and
//! retried at the regular sync interval.

use crate::controller::reconciler::naming::resource_key;
use crate::controller::reconciler::{BackoffState, Context};
use crate::crd::ApiEndpoints;
use crate::observability::metrics;
use crate::Error;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Used when the backoff table is poisoned
const FALLBACK_BACKOFF: Duration = Duration::from_secs(60);

pub fn error_policy(ae: Arc<ApiEndpoints>, error: &Error, ctx: Arc<Context>) -> Action {
    let name = ae.name_any();
    let namespace = ae.namespace().unwrap_or_default();

    let error_span = tracing::error_span!(
        "controller.reconciliation_error",
        resource.name = %name,
        resource.namespace = %namespace,
        reason = error.reason(),
    );
    let _guard = error_span.enter();

    metrics::increment_reconciliation_errors(error.reason());

    if !error.is_retryable() {
        error!(
            "Reconciliation of {}/{} needs manual intervention: {}",
            namespace, name, error
        );
        return Action::requeue(ctx.config.sync_interval.max(Duration::from_secs(1)));
    }

    let key = resource_key(&namespace, &name);
    let (delay, error_count) = match ctx.backoff_states.lock() {
        Ok(mut states) => {
            let state = states
                .entry(key)
                .or_insert_with(|| BackoffState::new(&ctx.config));
            state.increment_error();
            (state.backoff.next_backoff(), state.error_count)
        }
        Err(e) => {
            warn!("Failed to lock backoff_states: {}, using default backoff", e);
            (FALLBACK_BACKOFF, 0)
        }
    };

    warn!("Reconciliation of {}/{} failed: {}", namespace, name, error);
    info!(
        "Retrying in {}s (error count: {})",
        delay.as_secs(),
        error_count
    );

    Action::requeue(delay)
}
