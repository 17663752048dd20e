//! # Allow Policy Synchronization
//!
//! One `allow-<krakend>-<app>` NetworkPolicy per app the protected endpoints
//! of an ApiEndpoints route to. Open endpoints are not scanned. Policies are created or updated in place, never deleted here: a policy
//! whose app is no longer referenced stays until its owners are gone.

use crate::controller::reconciler::discovery::apps_in_namespace;
use crate::controller::reconciler::naming::network_policy_name;
use crate::controller::reconciler::ownership::{ensure_owner_reference, OwnerIdentity};
use crate::controller::reconciler::types::Context;
use crate::crd::ApiEndpoints;
use crate::netpol::{allow_krakend_ingress_spec, app_allow_krakend_ingress_netpol};
use crate::observability::metrics;
use crate::Error;
use kube::ResourceExt;
use tracing::{debug, info};

/// Ensure an allow policy exists for every app the endpoints reference
///
/// Returns the apps that were processed.
pub async fn sync_network_policies(
    ctx: &Context,
    ae: &ApiEndpoints,
    krakend_name: &str,
) -> Result<Vec<String>, Error> {
    let namespace = ae.namespace().unwrap_or_default();
    let owner = OwnerIdentity::from_resource(ae)?;
    let apps = apps_in_namespace(&ae.spec.endpoints, &namespace, &ctx.config.cluster_domain);

    for app in &apps {
        let name = network_policy_name(krakend_name, app);
        match ctx.client.get_network_policy(&name, &namespace).await? {
            None => {
                let mut policy = app_allow_krakend_ingress_netpol(&name, &namespace, app);
                ensure_owner_reference(&mut policy, &owner);
                ctx.client.create_network_policy(&policy).await?;
                metrics::increment_network_policies_applied("create");
                info!(network_policy = %name, app = %app, "created allow policy");
            }
            Some(mut existing) => {
                let desired = allow_krakend_ingress_spec(app);
                let spec_changed = existing.spec.as_ref() != Some(&desired);
                let owner_added = ensure_owner_reference(&mut existing, &owner);
                if !spec_changed && !owner_added {
                    debug!(network_policy = %name, "allow policy up to date");
                    continue;
                }
                existing.spec = Some(desired);
                ctx.client.replace_network_policy(&existing).await?;
                metrics::increment_network_policies_applied("update");
                info!(network_policy = %name, app = %app, "updated allow policy");
            }
        }
    }
    Ok(apps)
}
