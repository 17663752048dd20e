//! # Logging
//!
//! Tracing subscriber setup. `RUST_LOG` wins over `LOG_LEVEL` when both are set.

use crate::config::ControllerConfig;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `log_format = "json"` emits one JSON object per event with the current
/// span fields; anything else uses the human-readable formatter.
pub fn init_tracing(config: &ControllerConfig) -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if config.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
}
