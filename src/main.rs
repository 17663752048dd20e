//! # KrakenD Endpoints Controller
//!
//! Binary entry point. Configuration comes from the environment; see
//! `ControllerConfig::from_env` for the recognized variables.

use anyhow::Result;
use krakend_endpoints_controller::config::ControllerConfig;
use krakend_endpoints_controller::runtime::{initialize, run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ControllerConfig::from_env();

    let init = initialize(config).await?;

    run_watch_loop(init.api, init.context, init.server_state).await
}
