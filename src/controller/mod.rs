//! # Controller
//!
//! - `backoff`: Fibonacci backoff for failed reconciles
//! - `client`: the narrow Kubernetes API surface the reconciler uses
//! - `reconciler`: ApiEndpoints reconciliation

pub mod backoff;
pub mod client;
pub mod reconciler;
