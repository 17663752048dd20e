//! # Lifecycle
//!
//! Finalizer handling for ApiEndpoints.
//!
//! - Active: the first successful sync adds the finalizer and a back-reference
//!   to the Krakend
//! - Terminating: the declaration's endpoints are removed from the partials,
//!   then the finalizer is dropped
//!
//! Both directions re-read the ApiEndpoints before writing so they never
//! replace a stale resource version.

use crate::constants::KRAKEND_FINALIZER;
use crate::controller::reconciler::config_sync::sync_partials;
use crate::controller::reconciler::ownership::{ensure_owner_reference, OwnerIdentity};
use crate::controller::reconciler::rollout::annotate_rollout;
use crate::controller::reconciler::types::Context;
use crate::crd::{ApiEndpoints, Krakend};
use crate::observability::metrics;
use crate::Error;
use kube::ResourceExt;
use tracing::{debug, info};

#[must_use]
pub fn has_finalizer(ae: &ApiEndpoints) -> bool {
    ae.finalizers().iter().any(|f| f == KRAKEND_FINALIZER)
}

/// Remove a terminating declaration's contribution, then its finalizer
///
/// A missing Krakend means there is nothing to clean up. Running this on an
/// already finalized declaration does nothing.
pub async fn cleanup(ctx: &Context, ae: &ApiEndpoints) -> Result<(), Error> {
    if !has_finalizer(ae) {
        debug!("finalizer already removed");
        return Ok(());
    }

    let namespace = ae.namespace().unwrap_or_default();
    let krakend_name = ae.krakend_name();

    if ctx.client.get_krakend(&krakend_name, &namespace).await?.is_some() {
        let synced = sync_partials(ctx, &krakend_name, &namespace).await?;
        annotate_rollout(ctx, &krakend_name, &namespace, &synced.checksum).await?;
    } else {
        info!(krakend = %krakend_name, "Krakend not found, nothing to clean up");
    }

    remove_finalizer(ctx, &ae.name_any(), &namespace).await
}

/// Drop the finalizer from the current version of the declaration
pub async fn remove_finalizer(ctx: &Context, name: &str, namespace: &str) -> Result<(), Error> {
    let Some(mut current) = ctx.client.get_api_endpoints(name, namespace).await? else {
        return Ok(());
    };
    if !has_finalizer(&current) {
        return Ok(());
    }
    current.finalizers_mut().retain(|f| f != KRAKEND_FINALIZER);
    ctx.client.replace_api_endpoints(&current).await?;
    metrics::increment_finalizations();
    info!("removed finalizer");
    Ok(())
}

/// Make sure the declaration carries the finalizer and a reference to its Krakend
///
/// Both are only ever added here. Returns the current declaration.
pub async fn ensure_finalizer_and_owner(
    ctx: &Context,
    name: &str,
    namespace: &str,
    krakend: &Krakend,
) -> Result<ApiEndpoints, Error> {
    let mut current = ctx
        .client
        .get_api_endpoints(name, namespace)
        .await?
        .ok_or_else(|| Error::NotFound {
            kind: "ApiEndpoints",
            namespace: namespace.to_string(),
            name: name.to_string(),
        })?;

    let mut changed = false;
    if !has_finalizer(&current) {
        current.finalizers_mut().push(KRAKEND_FINALIZER.to_string());
        changed = true;
    }
    changed |= ensure_owner_reference(&mut current, &OwnerIdentity::from_resource(krakend)?);

    if !changed {
        return Ok(current);
    }
    let updated = ctx.client.replace_api_endpoints(&current).await?;
    debug!("ensured finalizer and owner reference");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use crate::controller::client::MockEndpointsKubeClient;
    use crate::controller::reconciler::test_fixtures::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_cleanup_without_finalizer_is_noop() {
        let mut mock = MockEndpointsKubeClient::new();
        mock.expect_get_krakend().never();
        mock.expect_replace_api_endpoints().never();
        let ctx = Context::new(Arc::new(mock), ControllerConfig::default());

        let ae = terminating(api_endpoints("app1", "ns1", "gw"));
        cleanup(&ctx, &ae).await.unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_with_missing_krakend_drops_finalizer() {
        let mut ae = terminating(api_endpoints("app1", "ns1", "gw"));
        ae.finalizers_mut().push(KRAKEND_FINALIZER.to_string());
        let fresh = ae.clone();

        let mut mock = MockEndpointsKubeClient::new();
        mock.expect_get_krakend().returning(|_, _| Ok(None));
        mock.expect_get_config_map().never();
        mock.expect_get_api_endpoints()
            .returning(move |_, _| Ok(Some(fresh.clone())));
        mock.expect_replace_api_endpoints()
            .times(1)
            .withf(|ae| !ae.finalizers().iter().any(|f| f == KRAKEND_FINALIZER))
            .returning(|ae| Ok(ae.clone()));
        let ctx = Context::new(Arc::new(mock), ControllerConfig::default());

        cleanup(&ctx, &ae).await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_adds_finalizer_and_owner_once() {
        let ae = api_endpoints("app1", "ns1", "gw");
        let mut mock = MockEndpointsKubeClient::new();
        mock.expect_get_api_endpoints()
            .returning(move |_, _| Ok(Some(ae.clone())));
        mock.expect_replace_api_endpoints()
            .times(1)
            .withf(|ae| {
                has_finalizer(ae)
                    && ae
                        .owner_references()
                        .iter()
                        .any(|r| r.kind == "Krakend" && r.uid == "uid-gw")
            })
            .returning(|ae| Ok(ae.clone()));
        let ctx = Context::new(Arc::new(mock), ControllerConfig::default());

        let updated = ensure_finalizer_and_owner(&ctx, "app1", "ns1", &krakend("gw", "ns1", "uid-gw"))
            .await
            .unwrap();
        assert!(has_finalizer(&updated));
    }
}
