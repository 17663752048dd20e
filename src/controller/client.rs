//! # Store Access
//!
//! Every read and write the reconciler issues goes through [`EndpointsKubeClient`],
//! so the reconcile logic can be exercised against a mock or an in-memory store.
//!
//! Conventions shared by all implementations:
//! - `get_*` returns `Ok(None)` when the object does not exist
//! - `replace_*` is an optimistic-concurrency write: a stale `resourceVersion`
//!   yields [`Error::Conflict`]

use crate::constants::FIELD_MANAGER;
use crate::crd::{ApiEndpoints, ApiEndpointsStatus, Krakend};
use crate::Error;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::api::networking::v1::NetworkPolicy;
use kube::api::{Api, ListParams, Patch, PatchParams, PostParams};
use kube::{Client, Resource, ResourceExt};

#[cfg(test)]
use mockall::automock;

/// Kubernetes operations needed to reconcile ApiEndpoints
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EndpointsKubeClient: Send + Sync {
    async fn get_api_endpoints(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<ApiEndpoints>, Error>;

    /// All ApiEndpoints in a namespace, including ones marked for deletion
    async fn list_api_endpoints(&self, namespace: &str) -> Result<Vec<ApiEndpoints>, Error>;

    /// Replace metadata and spec (finalizers, owner references)
    async fn replace_api_endpoints(&self, endpoints: &ApiEndpoints) -> Result<ApiEndpoints, Error>;

    async fn patch_api_endpoints_status(
        &self,
        name: &str,
        namespace: &str,
        status: &ApiEndpointsStatus,
    ) -> Result<(), Error>;

    async fn get_krakend(&self, name: &str, namespace: &str) -> Result<Option<Krakend>, Error>;

    async fn get_config_map(&self, name: &str, namespace: &str)
        -> Result<Option<ConfigMap>, Error>;

    async fn replace_config_map(&self, config_map: &ConfigMap) -> Result<ConfigMap, Error>;

    async fn get_deployment(&self, name: &str, namespace: &str)
        -> Result<Option<Deployment>, Error>;

    async fn replace_deployment(&self, deployment: &Deployment) -> Result<Deployment, Error>;

    async fn get_network_policy(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<NetworkPolicy>, Error>;

    async fn create_network_policy(&self, policy: &NetworkPolicy) -> Result<NetworkPolicy, Error>;

    async fn replace_network_policy(&self, policy: &NetworkPolicy)
        -> Result<NetworkPolicy, Error>;
}

/// Real Kubernetes client implementation
#[derive(Clone)]
pub struct KubeClient {
    client: Client,
}

impl std::fmt::Debug for KubeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClient").finish_non_exhaustive()
    }
}

impl KubeClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Fetch an object, mapping 404 to `None`
async fn get_opt<K>(api: &Api<K>, name: &str) -> Result<Option<K>, Error>
where
    K: Clone + serde::de::DeserializeOwned + std::fmt::Debug,
{
    match api.get(name).await {
        Ok(obj) => Ok(Some(obj)),
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
        Err(e) => Err(Error::Kube(e)),
    }
}

/// Replace an object, mapping 409 to [`Error::Conflict`]
async fn replace_checked<K>(api: &Api<K>, kind: &'static str, obj: &K) -> Result<K, Error>
where
    K: Resource + Clone + serde::Serialize + serde::de::DeserializeOwned + std::fmt::Debug,
{
    let name = obj.meta().name.clone().ok_or(Error::MissingObjectKey {
        kind: kind.to_string(),
        field: "name",
    })?;
    let namespace = obj.namespace().unwrap_or_default();
    let pp = PostParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..Default::default()
    };
    match api.replace(&name, &pp, obj).await {
        Ok(updated) => Ok(updated),
        Err(kube::Error::Api(ae)) if ae.code == 409 => Err(Error::Conflict {
            kind,
            namespace,
            name,
        }),
        Err(e) => Err(Error::Kube(e)),
    }
}

fn namespace_of<K: Resource>(obj: &K, kind: &'static str) -> Result<String, Error> {
    obj.meta().namespace.clone().ok_or(Error::MissingObjectKey {
        kind: kind.to_string(),
        field: "namespace",
    })
}

#[async_trait]
impl EndpointsKubeClient for KubeClient {
    async fn get_api_endpoints(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<ApiEndpoints>, Error> {
        get_opt(&self.api::<ApiEndpoints>(namespace), name).await
    }

    async fn list_api_endpoints(&self, namespace: &str) -> Result<Vec<ApiEndpoints>, Error> {
        let list = self
            .api::<ApiEndpoints>(namespace)
            .list(&ListParams::default())
            .await?;
        Ok(list.items)
    }

    async fn replace_api_endpoints(&self, endpoints: &ApiEndpoints) -> Result<ApiEndpoints, Error> {
        let namespace = namespace_of(endpoints, "ApiEndpoints")?;
        replace_checked(&self.api::<ApiEndpoints>(&namespace), "ApiEndpoints", endpoints).await
    }

    async fn patch_api_endpoints_status(
        &self,
        name: &str,
        namespace: &str,
        status: &ApiEndpointsStatus,
    ) -> Result<(), Error> {
        let status_patch = serde_json::json!({
            "status": status
        });
        self.api::<ApiEndpoints>(namespace)
            .patch_status(
                name,
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(&status_patch),
            )
            .await?;
        Ok(())
    }

    async fn get_krakend(&self, name: &str, namespace: &str) -> Result<Option<Krakend>, Error> {
        get_opt(&self.api::<Krakend>(namespace), name).await
    }

    async fn get_config_map(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<ConfigMap>, Error> {
        get_opt(&self.api::<ConfigMap>(namespace), name).await
    }

    async fn replace_config_map(&self, config_map: &ConfigMap) -> Result<ConfigMap, Error> {
        let namespace = namespace_of(config_map, "ConfigMap")?;
        replace_checked(&self.api::<ConfigMap>(&namespace), "ConfigMap", config_map).await
    }

    async fn get_deployment(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<Deployment>, Error> {
        get_opt(&self.api::<Deployment>(namespace), name).await
    }

    async fn replace_deployment(&self, deployment: &Deployment) -> Result<Deployment, Error> {
        let namespace = namespace_of(deployment, "Deployment")?;
        replace_checked(&self.api::<Deployment>(&namespace), "Deployment", deployment).await
    }

    async fn get_network_policy(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<NetworkPolicy>, Error> {
        get_opt(&self.api::<NetworkPolicy>(namespace), name).await
    }

    async fn create_network_policy(&self, policy: &NetworkPolicy) -> Result<NetworkPolicy, Error> {
        let namespace = namespace_of(policy, "NetworkPolicy")?;
        let pp = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        match self
            .api::<NetworkPolicy>(&namespace)
            .create(&pp, policy)
            .await
        {
            Ok(created) => Ok(created),
            // Lost a race with another reconcile creating the same policy
            Err(kube::Error::Api(ae)) if ae.code == 409 => Err(Error::Conflict {
                kind: "NetworkPolicy",
                namespace,
                name: policy.name_any(),
            }),
            Err(e) => Err(Error::Kube(e)),
        }
    }

    async fn replace_network_policy(
        &self,
        policy: &NetworkPolicy,
    ) -> Result<NetworkPolicy, Error> {
        let namespace = namespace_of(policy, "NetworkPolicy")?;
        replace_checked(&self.api::<NetworkPolicy>(&namespace), "NetworkPolicy", policy).await
    }
}
