//! # Runtime
//!
//! - `initialization`: process bootstrap (tracing, metrics, probe server, client)
//! - `watch_loop`: the kube-runtime controller driving reconciles
//! - `error_policy`: requeue decisions for failed reconciles

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

pub use initialization::{initialize, InitializationResult};
pub use watch_loop::run_watch_loop;
