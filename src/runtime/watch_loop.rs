//! # Watch Loop
//!
//! Controller watch loop that monitors ApiEndpoints resources and triggers
//! reconciliation when they change or their requeue comes due.

use crate::controller::reconciler::{reconcile, Context};
use crate::crd::ApiEndpoints;
use crate::runtime::error_policy::error_policy;
use crate::server::ServerState;
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::{controller, watcher, Controller};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// Run the controller until a shutdown signal arrives
///
/// Readiness is reported while the watch is running and withdrawn as soon as
/// SIGINT/SIGTERM is received, before in-flight reconciliations drain.
pub async fn run_watch_loop(
    api: Api<ApiEndpoints>,
    ctx: Arc<Context>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    let concurrency = ctx.config.max_concurrent_reconciliations;

    let shutdown_state = Arc::clone(&server_state);
    tokio::spawn(async move {
        if let Err(e) = shutdown_signal().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Received shutdown signal, waiting for in-flight reconciliations to complete...");
        shutdown_state.set_ready(false);
    });

    let watch_span = tracing::info_span!("controller.watch", concurrency = concurrency);

    info!("Starting controller watch loop...");
    server_state.set_ready(true);

    Controller::new(api, watcher::Config::default().any_semantic())
        .with_config(controller::Config::default().concurrency(concurrency))
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| {
            match result {
                Ok((obj, action)) => {
                    debug!(resource = %obj, action = ?action, "watch.event.reconciled");
                }
                Err(controller::Error::ReconcilerFailed(e, obj)) => {
                    debug!(resource = %obj, error = %e, "watch.event.reconciliation_failed");
                }
                Err(e) => {
                    warn!(error = %e, "Controller stream error");
                }
            }
            futures::future::ready(())
        })
        .instrument(watch_span)
        .await;

    server_state.set_ready(false);
    info!("Controller stopped gracefully");
    Ok(())
}

/// Resolves on the first SIGINT or SIGTERM
#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
