//! # Custom Resource Definitions
//!
//! CRD types for the KrakenD endpoints controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `ApiEndpoints` specification (the endpoint declarations users own)
//! - `status.rs` - Observed synchronization state of an `ApiEndpoints`
//! - `krakend.rs` - `Krakend` gateway instance the declarations contribute to

mod krakend;
mod spec;
mod status;

// Re-export all public types
pub use krakend::{AuthProvider, Krakend, KrakendSpec};
pub use spec::{ApiEndpoints, ApiEndpointsSpec, Auth, Endpoint, RateLimit};
pub use status::ApiEndpointsStatus;
