//! # KrakenD Endpoints Controller
//!
//! A Kubernetes controller that merges `ApiEndpoints` declarations into the
//! partials ConfigMap of the `Krakend` gateway they reference.
//!
//! ## Overview
//!
//! For every `ApiEndpoints` the controller:
//!
//! 1. **Merges declarations** - Renders all live declarations in the namespace
//!    into the KrakenD endpoint partials file
//! 2. **Triggers rollouts** - Stamps the ConfigMap checksum on the KrakenD
//!    Deployment so the gateway restarts with the new configuration
//! 3. **Opens the network path** - Optionally creates allow NetworkPolicies
//!    for the backend apps the declaration references
//! 4. **Cleans up on delete** - A finalizer removes the declaration's
//!    contribution before the object goes away

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod error;
pub mod netpol;
pub mod observability;
pub mod partials;
pub mod runtime;
pub mod server;

pub use error::Error;
