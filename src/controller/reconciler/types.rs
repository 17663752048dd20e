//! # Types
//!
//! Shared state handed to every reconcile invocation.

use crate::config::ControllerConfig;
use crate::controller::backoff::FibonacciBackoff;
use crate::controller::client::EndpointsKubeClient;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Backoff state for a specific resource
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            backoff: FibonacciBackoff::new(
                config.error_backoff_min.as_secs(),
                config.error_backoff_max.as_secs(),
            ),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count += 1;
    }
}

/// Reconcile context
///
/// Built once at startup. Holds the store handle and configuration; no
/// remote object state is cached here between invocations.
pub struct Context {
    pub client: Arc<dyn EndpointsKubeClient>,
    pub config: ControllerConfig,
    /// Per-resource backoff state keyed by `namespace/name`
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Context {
    #[must_use]
    pub fn new(client: Arc<dyn EndpointsKubeClient>, config: ControllerConfig) -> Self {
        Self {
            client,
            config,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Forget the error history of a resource after a successful reconcile
    ///
    /// Gone and deleted declarations also end in success, so the map only
    /// holds resources that are currently failing.
    pub fn clear_backoff(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(resource_key);
        }
    }
}
