//! # Configuration
//!
//! - `controller`: controller settings loaded from the environment
//! - `duration`: Kubernetes duration string parsing

pub mod controller;
pub mod duration;

pub use controller::ControllerConfig;
pub use duration::parse_kubernetes_duration;
