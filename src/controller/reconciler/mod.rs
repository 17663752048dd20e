//! # Reconciler
//!
//! Reconciliation of ApiEndpoints into the shared KrakenD partials.
//!
//! - `types`: reconcile context and per-resource backoff state
//! - `naming`: deterministic names of derived objects
//! - `hash`: spec content hash
//! - `throttle`: resync decision
//! - `ownership`: owner reference identity and checks
//! - `config_sync`: partials ConfigMap synchronization
//! - `rollout`: ConfigMap checksum and Deployment annotation
//! - `discovery`: backend app discovery
//! - `policies`: allow NetworkPolicy synchronization
//! - `lifecycle`: finalizer handling
//! - `reconcile`: the orchestrator

pub mod config_sync;
pub mod discovery;
pub mod hash;
pub mod lifecycle;
pub mod naming;
pub mod ownership;
pub mod policies;
pub mod reconcile;
pub mod rollout;
pub mod throttle;
pub mod types;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use reconcile::reconcile;
pub use types::{BackoffState, Context};
