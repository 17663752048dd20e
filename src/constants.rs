//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Field manager name used for patches issued by the controller
pub const FIELD_MANAGER: &str = "krakend-endpoints-controller";

/// Finalizer placed on every reconciled ApiEndpoints resource
pub const KRAKEND_FINALIZER: &str = "finalizer.krakend.nais.io";

/// Key in the partials ConfigMap holding the serialized endpoint list
pub const KRAKEND_CONFIG_MAP_KEY: &str = "endpoints.tmpl";

/// Annotation carrying the partials checksum on the KrakenD Deployment
pub const CHECKSUM_ANNOTATION: &str = "checksum/cm-partials";

/// Pod label used to select backend applications in allow policies
pub const APP_LABEL_NAME: &str = "app";

/// Pod label identifying KrakenD gateway pods allowed to reach backends
pub const KRAKEND_POD_LABEL_NAME: &str = "app.kubernetes.io/name";

/// Value of [`KRAKEND_POD_LABEL_NAME`] on KrakenD gateway pods
pub const KRAKEND_POD_LABEL_VALUE: &str = "krakend";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default minimum interval between two synchronizations of an unchanged resource
pub const DEFAULT_SYNC_INTERVAL: &str = "1h";

/// Default cluster domain used when matching fully qualified service hostnames
pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";

/// Default deadline for a single reconcile invocation (seconds)
pub const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 30;

/// Default number of synchronizer re-runs after a ConfigMap write conflict
pub const DEFAULT_ARTIFACT_CONFLICT_RETRIES: u32 = 5;

/// Default bound on concurrently running reconciliations
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Default lower bound of the error backoff (seconds)
pub const DEFAULT_ERROR_BACKOFF_MIN_SECS: u64 = 5;

/// Default upper bound of the error backoff (seconds)
pub const DEFAULT_ERROR_BACKOFF_MAX_SECS: u64 = 300;
