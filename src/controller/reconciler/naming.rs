//! # Naming
//!
//! Deterministic names of the objects derived from a Krakend instance.

/// Partials ConfigMap of a Krakend: `<krakend>-krakend-partials`
#[must_use]
pub fn partials_config_map_name(krakend: &str) -> String {
    format!("{krakend}-krakend-partials")
}

/// KrakenD Deployment of a Krakend: `<krakend>-krakend`
#[must_use]
pub fn deployment_name(krakend: &str) -> String {
    format!("{krakend}-krakend")
}

/// Allow policy for one backend app: `allow-<krakend>-<app>`
#[must_use]
pub fn network_policy_name(krakend: &str, app: &str) -> String {
    format!("allow-{krakend}-{app}")
}

/// Key used for per-resource state such as backoff
#[must_use]
pub fn resource_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}
