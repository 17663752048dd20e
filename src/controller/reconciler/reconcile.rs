//! # Reconcile
//!
//! Sequences one reconcile invocation for an ApiEndpoints:
//!
//! 1. Re-read the declaration; a terminating one goes through cleanup
//! 2. Skip if the spec hash is unchanged and the last sync is recent
//! 3. Merge all live declarations into the partials ConfigMap
//! 4. Stamp the ConfigMap checksum on the KrakenD Deployment
//! 5. Optionally sync allow policies for the referenced apps
//! 6. Ensure finalizer and Krakend back-reference
//! 7. Record hash and timestamp in status

use crate::controller::reconciler::config_sync::sync_partials;
use crate::controller::reconciler::hash::content_hash;
use crate::controller::reconciler::lifecycle::{cleanup, ensure_finalizer_and_owner};
use crate::controller::reconciler::naming::resource_key;
use crate::controller::reconciler::policies::sync_network_policies;
use crate::controller::reconciler::rollout::annotate_rollout;
use crate::controller::reconciler::throttle::{should_sync, time_until_due};
use crate::controller::reconciler::types::Context;
use crate::crd::{ApiEndpoints, ApiEndpointsStatus};
use crate::observability::metrics;
use crate::Error;
use chrono::Utc;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};

/// Shortest requeue issued, so a zero sync interval cannot spin
const MIN_REQUEUE: Duration = Duration::from_secs(1);

/// Reconcile entry point used by the controller runtime
pub async fn reconcile(ae: Arc<ApiEndpoints>, ctx: Arc<Context>) -> Result<Action, Error> {
    let name = ae.name_any();
    let namespace = ae.namespace().ok_or_else(|| Error::MissingObjectKey {
        kind: "ApiEndpoints".to_string(),
        field: "namespace",
    })?;

    let span = tracing::info_span!(
        "reconcile",
        resource.name = %name,
        resource.namespace = %namespace,
    );

    metrics::increment_reconciliations();
    let start = Instant::now();
    let timeout = ctx.config.reconcile_timeout;

    let result = match tokio::time::timeout(timeout, reconcile_endpoints(&ctx, &name, &namespace))
        .instrument(span)
        .await
    {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(timeout)),
    };

    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
    if result.is_ok() {
        ctx.clear_backoff(&resource_key(&namespace, &name));
    }
    result
}

/// One pass over the current state of the declaration
pub async fn reconcile_endpoints(
    ctx: &Context,
    name: &str,
    namespace: &str,
) -> Result<Action, Error> {
    let Some(ae) = ctx.client.get_api_endpoints(name, namespace).await? else {
        debug!("ApiEndpoints no longer exists");
        return Ok(Action::await_change());
    };

    if ae.is_terminating() {
        cleanup(ctx, &ae).await?;
        return Ok(Action::await_change());
    }

    let interval = ctx.config.sync_interval;
    let hash = content_hash(&ae.spec)?;
    let status = ae.status.clone().unwrap_or_default();
    let last_sync = status.last_synchronized();
    let now = Utc::now();

    if !should_sync(
        status.synchronization_hash.as_deref(),
        &hash,
        last_sync,
        now,
        interval,
    ) {
        let wait = time_until_due(last_sync, now, interval).max(MIN_REQUEUE);
        metrics::increment_skipped_syncs();
        debug!(requeue_secs = wait.as_secs(), "unchanged and recently synchronized, skipping");
        return Ok(Action::requeue(wait));
    }

    let krakend_name = ae.krakend_name();
    let synced = sync_partials(ctx, &krakend_name, namespace).await?;
    annotate_rollout(ctx, &krakend_name, namespace, &synced.checksum).await?;

    if ctx.config.netpol_enabled {
        if let Err(e) = sync_network_policies(ctx, &ae, &krakend_name).await {
            warn!(error = %e, "failed to synchronize network policies");
            return Err(e);
        }
    }

    ensure_finalizer_and_owner(ctx, name, namespace, &synced.krakend).await?;

    let status = ApiEndpointsStatus::synchronized(&hash, Utc::now());
    ctx.client
        .patch_api_endpoints_status(name, namespace, &status)
        .await?;

    info!(krakend = %krakend_name, hash = %hash, "synchronized");
    Ok(Action::requeue(interval.max(MIN_REQUEUE)))
}
