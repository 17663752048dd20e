//! # App Discovery
//!
//! Finds the in-cluster apps an ApiEndpoints routes to, from the hostnames of
//! its `http` backend hosts. Accepted forms, for namespace `ns` and cluster
//! domain `cluster.local`:
//!
//! - `http://app`
//! - `http://app.ns`
//! - `http://app.ns.svc.cluster.local`
//!
//! Anything else (other schemes, other namespaces, `app.ns.svc`) names no app.

use crate::crd::Endpoint;
use tracing::warn;
use url::Url;

/// App named by a backend host, if any
pub fn app_from_backend_host(
    backend_host: &str,
    namespace: &str,
    cluster_domain: &str,
) -> Result<Option<String>, url::ParseError> {
    let url = Url::parse(backend_host)?;
    if url.scheme() != "http" {
        return Ok(None);
    }
    let Some(hostname) = url.host_str().filter(|h| !h.is_empty()) else {
        return Ok(None);
    };

    let parts: Vec<&str> = hostname.split('.').collect();
    let app = match parts.as_slice() {
        [app] => Some(*app),
        [app, ns] if *ns == namespace => Some(*app),
        // `app.ns.svc` is deliberately not accepted
        [app, ns, rest @ ..] if rest.len() >= 2 && *ns == namespace => {
            (rest.join(".") == format!("svc.{cluster_domain}")).then_some(*app)
        }
        _ => None,
    };
    Ok(app.map(str::to_string))
}

/// Distinct apps referenced by the endpoints, in first-seen order
///
/// Unparsable hosts are logged and skipped.
pub fn apps_in_namespace<'a>(
    endpoints: impl IntoIterator<Item = &'a Endpoint>,
    namespace: &str,
    cluster_domain: &str,
) -> Vec<String> {
    let mut apps: Vec<String> = Vec::new();
    for ep in endpoints {
        match app_from_backend_host(&ep.backend_host, namespace, cluster_domain) {
            Ok(Some(app)) if !apps.contains(&app) => apps.push(app),
            Ok(_) => {}
            Err(e) => warn!(
                backend_host = %ep.backend_host,
                path = %ep.path,
                "skipping unparsable backend host: {}",
                e
            ),
        }
    }
    apps
}
