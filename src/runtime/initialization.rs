//! # Initialization
//!
//! Controller initialization: rustls setup, tracing, metrics, probe server
//! startup and Kubernetes client setup.

use crate::config::ControllerConfig;
use crate::controller::client::{EndpointsKubeClient, KubeClient};
use crate::controller::reconciler::Context;
use crate::crd::ApiEndpoints;
use crate::observability;
use crate::server::{start_server, ServerState};
use anyhow::{Context as _, Result};
use kube::{api::Api, Client};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Everything the watch loop needs
pub struct InitializationResult {
    /// API for ApiEndpoints, cluster-wide or restricted to `WATCH_NAMESPACE`
    pub api: Api<ApiEndpoints>,
    pub context: Arc<Context>,
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("context", &self.context)
            .field("server_ready", &self.server_state.ready())
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration
/// - HTTP server startup
/// - Kubernetes client creation
pub async fn initialize(config: ControllerConfig) -> Result<InitializationResult> {
    observability::init_tracing(&config)?;

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider was already installed");
    }

    info!(
        "Starting KrakenD endpoints controller (built {}, commit {})",
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        sync_interval_secs = config.sync_interval.as_secs(),
        netpol_enabled = config.netpol_enabled,
        cluster_domain = %config.cluster_domain,
        watch_namespace = config.watch_namespace.as_deref().unwrap_or("<all>"),
        "Controller configuration loaded"
    );

    observability::metrics::register_metrics().context("Failed to register metrics")?;

    let server_state = Arc::new(ServerState::default());
    let server_handle = {
        let state = Arc::clone(&server_state);
        let port = config.metrics_port;
        tokio::spawn(async move {
            if let Err(e) = start_server(port, state).await {
                error!("HTTP server error: {}", e);
            }
        })
    };
    wait_for_server_ready(&server_state, &server_handle, &config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let api: Api<ApiEndpoints> = match config.watch_namespace.as_deref() {
        Some(namespace) => {
            info!("Watching ApiEndpoints in namespace {}", namespace);
            Api::namespaced(client.clone(), namespace)
        }
        None => {
            info!("Watching ApiEndpoints in all namespaces");
            Api::all(client.clone())
        }
    };

    let kube_client: Arc<dyn EndpointsKubeClient> = Arc::new(KubeClient::new(client));
    let context = Arc::new(Context::new(kube_client, config));

    Ok(InitializationResult {
        api,
        context,
        server_state,
    })
}

/// Wait until the probe server has bound its listener
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    config: &ControllerConfig,
) -> Result<()> {
    let startup_timeout = config.server_startup_timeout;
    let poll_interval = config.server_poll_interval;
    let start_time = Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_listening.load(Ordering::Relaxed) {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            warn!("HTTP server did not bind in time");
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}
