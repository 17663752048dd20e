//! # Errors
//!
//! Error taxonomy for the reconciler. Every failure the reconcile path can hit
//! maps to one variant, and [`Error::is_retryable`] decides how the error
//! policy requeues it.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("{kind} '{namespace}/{name}' not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("ConfigMap '{namespace}/{config_map}' is not owned by Krakend '{namespace}/{krakend}'")]
    NotOwned {
        namespace: String,
        config_map: String,
        krakend: String,
    },

    #[error("{key} not found in ConfigMap with name {config_map}")]
    MissingConfigKey {
        key: &'static str,
        config_map: String,
    },

    #[error("conflict writing {kind} '{namespace}/{name}': object was modified concurrently")]
    Conflict {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("{kind} is missing metadata.{field}")]
    MissingObjectKey {
        kind: String,
        field: &'static str,
    },

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("failed to render KrakenD endpoints: {0}")]
    Render(String),

    #[error("reconciliation timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Whether the failure is expected to clear on its own and should be retried with backoff.
    ///
    /// Ownership violations and malformed ConfigMaps need an operator to fix them, so
    /// they are reported and revisited on the regular sync interval instead.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Error::NotOwned { .. } | Error::MissingConfigKey { .. })
    }

    /// Short label for metrics and structured logs
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Error::Kube(_) => "kube_api",
            Error::NotFound { .. } => "not_found",
            Error::NotOwned { .. } => "not_owned",
            Error::MissingConfigKey { .. } => "missing_config_key",
            Error::Conflict { .. } => "conflict",
            Error::MissingObjectKey { .. } => "missing_object_key",
            Error::Serialization(_) => "serialization",
            Error::Render(_) => "render",
            Error::Timeout(_) => "timeout",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
