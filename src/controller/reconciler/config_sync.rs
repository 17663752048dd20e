//! # Partials Synchronization
//!
//! Merges every live ApiEndpoints of a namespace into the partials ConfigMap
//! of their Krakend and computes the checksum used to roll the gateway.
//!
//! Many ApiEndpoints share one ConfigMap, so concurrent reconciles of siblings
//! race on it. The write carries the `resourceVersion` it was read at; a
//! conflict re-runs the whole synchronization from a fresh read.

use crate::constants::KRAKEND_CONFIG_MAP_KEY;
use crate::controller::reconciler::naming::partials_config_map_name;
use crate::controller::reconciler::ownership::{is_owned_by, OwnerIdentity};
use crate::controller::reconciler::rollout::config_map_checksum;
use crate::controller::reconciler::types::Context;
use crate::crd::{ApiEndpoints, Krakend};
use crate::observability::metrics;
use crate::partials;
use crate::Error;
use tracing::{debug, info, warn};

/// Result of a successful synchronization
#[derive(Debug, Clone)]
pub struct SyncedPartials {
    /// The Krakend the ConfigMap belongs to, as read during this sync
    pub krakend: Krakend,
    /// Checksum of the persisted ConfigMap
    pub checksum: String,
}

/// Synchronize the partials ConfigMap, re-running on write conflicts
pub async fn sync_partials(
    ctx: &Context,
    krakend_name: &str,
    namespace: &str,
) -> Result<SyncedPartials, Error> {
    let retries = ctx.config.artifact_conflict_retries;
    let mut attempt = 0;
    loop {
        match sync_partials_once(ctx, krakend_name, namespace).await {
            Err(Error::Conflict { kind, name, .. }) if attempt < retries => {
                attempt += 1;
                metrics::increment_artifact_conflicts();
                warn!(
                    krakend = krakend_name,
                    attempt, "conflict writing {} '{}', re-reading and retrying", kind, name
                );
            }
            other => return other,
        }
    }
}

async fn sync_partials_once(
    ctx: &Context,
    krakend_name: &str,
    namespace: &str,
) -> Result<SyncedPartials, Error> {
    let krakend = ctx
        .client
        .get_krakend(krakend_name, namespace)
        .await?
        .ok_or_else(|| Error::NotFound {
            kind: "Krakend",
            namespace: namespace.to_string(),
            name: krakend_name.to_string(),
        })?;
    let owner = OwnerIdentity::from_resource(&krakend)?;

    let cm_name = partials_config_map_name(krakend_name);
    let not_found = || Error::NotFound {
        kind: "ConfigMap",
        namespace: namespace.to_string(),
        name: cm_name.clone(),
    };
    let mut cm = ctx
        .client
        .get_config_map(&cm_name, namespace)
        .await?
        .ok_or_else(not_found)?;

    if !is_owned_by(&cm, &owner) {
        return Err(Error::NotOwned {
            namespace: namespace.to_string(),
            config_map: cm_name.clone(),
            krakend: krakend_name.to_string(),
        });
    }

    let current = cm
        .data
        .as_ref()
        .and_then(|data| data.get(KRAKEND_CONFIG_MAP_KEY))
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or_else(|| Error::MissingConfigKey {
            key: KRAKEND_CONFIG_MAP_KEY,
            config_map: cm_name.clone(),
        })?;

    let live: Vec<ApiEndpoints> = ctx
        .client
        .list_api_endpoints(namespace)
        .await?
        .into_iter()
        .filter(|ae| !ae.is_terminating())
        .collect();

    let rendered = partials::render(&krakend, &live)?;

    if rendered == current {
        debug!(config_map = %cm_name, "partials unchanged");
    } else {
        cm.data
            .get_or_insert_with(Default::default)
            .insert(KRAKEND_CONFIG_MAP_KEY.to_string(), rendered);
        ctx.client.replace_config_map(&cm).await?;
        metrics::increment_partials_writes();
        info!(
            config_map = %cm_name,
            declarations = live.len(),
            "updated partials"
        );
    }

    let persisted = ctx
        .client
        .get_config_map(&cm_name, namespace)
        .await?
        .ok_or_else(not_found)?;
    let checksum = config_map_checksum(&persisted)?;

    Ok(SyncedPartials { krakend, checksum })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use crate::controller::client::MockEndpointsKubeClient;
    use crate::controller::reconciler::test_fixtures::*;
    use std::sync::Arc;

    fn ctx_with(mock: MockEndpointsKubeClient) -> Context {
        Context::new(Arc::new(mock), ControllerConfig::default())
    }

    #[tokio::test]
    async fn test_ownership_mismatch_never_writes() {
        let mut mock = MockEndpointsKubeClient::new();
        mock.expect_get_krakend()
            .returning(|_, _| Ok(Some(krakend("gw", "ns1", "uid-gw"))));
        mock.expect_get_config_map()
            .returning(|_, _| Ok(Some(partials_config_map("gw", "ns1", "uid-other", "[]"))));
        mock.expect_list_api_endpoints().never();
        mock.expect_replace_config_map().never();

        let err = sync_partials(&ctx_with(mock), "gw", "ns1").await.unwrap_err();
        assert!(matches!(err, Error::NotOwned { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_key_is_not_fabricated() {
        let mut mock = MockEndpointsKubeClient::new();
        mock.expect_get_krakend()
            .returning(|_, _| Ok(Some(krakend("gw", "ns1", "uid-gw"))));
        mock.expect_get_config_map().returning(|_, _| {
            let mut cm = partials_config_map("gw", "ns1", "uid-gw", "");
            cm.data = None;
            Ok(Some(cm))
        });
        mock.expect_replace_config_map().never();

        let err = sync_partials(&ctx_with(mock), "gw", "ns1").await.unwrap_err();
        assert!(matches!(err, Error::MissingConfigKey { .. }));
    }

    #[tokio::test]
    async fn test_missing_krakend_is_retryable_not_found() {
        let mut mock = MockEndpointsKubeClient::new();
        mock.expect_get_krakend().returning(|_, _| Ok(None));
        mock.expect_get_config_map().never();

        let err = sync_partials(&ctx_with(mock), "gw", "ns1").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "Krakend", .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_conflict_retries_from_fresh_read() {
        let mut mock = MockEndpointsKubeClient::new();
        mock.expect_get_krakend()
            .times(2)
            .returning(|_, _| Ok(Some(krakend("gw", "ns1", "uid-gw"))));
        mock.expect_get_config_map()
            .returning(|_, _| Ok(Some(partials_config_map("gw", "ns1", "uid-gw", "[]"))));
        mock.expect_list_api_endpoints()
            .returning(|_| Ok(vec![api_endpoints("app1", "ns1", "gw")]));
        let mut calls = 0;
        mock.expect_replace_config_map().times(2).returning(move |cm| {
            calls += 1;
            if calls == 1 {
                Err(Error::Conflict {
                    kind: "ConfigMap",
                    namespace: "ns1".to_string(),
                    name: "gw-krakend-partials".to_string(),
                })
            } else {
                Ok(cm.clone())
            }
        });

        let synced = sync_partials(&ctx_with(mock), "gw", "ns1").await.unwrap();
        assert_eq!(synced.checksum.len(), 64);
    }

    #[tokio::test]
    async fn test_conflicts_exhaust_retries() {
        let mut mock = MockEndpointsKubeClient::new();
        mock.expect_get_krakend()
            .returning(|_, _| Ok(Some(krakend("gw", "ns1", "uid-gw"))));
        mock.expect_get_config_map()
            .returning(|_, _| Ok(Some(partials_config_map("gw", "ns1", "uid-gw", "[]"))));
        mock.expect_list_api_endpoints()
            .returning(|_| Ok(vec![api_endpoints("app1", "ns1", "gw")]));
        mock.expect_replace_config_map().times(3).returning(|_| {
            Err(Error::Conflict {
                kind: "ConfigMap",
                namespace: "ns1".to_string(),
                name: "gw-krakend-partials".to_string(),
            })
        });

        let mut ctx = ctx_with(mock);
        ctx.config.artifact_conflict_retries = 2;
        let err = sync_partials(&ctx, "gw", "ns1").await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
        assert!(err.is_retryable());
    }
}
