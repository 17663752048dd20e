//! Fixtures and an in-memory store for reconciler tests.

use crate::constants::KRAKEND_CONFIG_MAP_KEY;
use crate::controller::client::EndpointsKubeClient;
use crate::crd::{
    ApiEndpoints, ApiEndpointsSpec, ApiEndpointsStatus, Auth, AuthProvider, Endpoint, Krakend,
    KrakendSpec,
};
use crate::Error;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{ConfigMap, PodTemplateSpec};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::ObjectMeta;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub fn krakend(name: &str, namespace: &str, uid: &str) -> Krakend {
    let mut k = Krakend::new(
        name,
        KrakendSpec {
            auth_providers: vec![AuthProvider {
                name: "maskinporten".to_string(),
                alg: "RS256".to_string(),
                jwk_uri: "https://maskinporten.no/jwk".to_string(),
                issuer: "https://maskinporten.no/".to_string(),
            }],
        },
    );
    k.metadata.namespace = Some(namespace.to_string());
    k.metadata.uid = Some(uid.to_string());
    k
}

pub fn partials_config_map(krakend: &str, namespace: &str, owner_uid: &str, value: &str) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(format!("{krakend}-krakend-partials")),
            namespace: Some(namespace.to_string()),
            owner_references: Some(vec![OwnerReference {
                api_version: "krakend.nais.io/v1".to_string(),
                kind: "Krakend".to_string(),
                name: krakend.to_string(),
                uid: owner_uid.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(
            KRAKEND_CONFIG_MAP_KEY.to_string(),
            value.to_string(),
        )])),
        ..Default::default()
    }
}

pub fn deployment(krakend: &str, namespace: &str) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(format!("{krakend}-krakend")),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta::default()),
                spec: None,
            },
            ..Default::default()
        }),
        status: None,
    }
}

pub fn api_endpoints(name: &str, namespace: &str, krakend: &str) -> ApiEndpoints {
    ApiEndpoints {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(format!("uid-{name}")),
            ..Default::default()
        },
        spec: ApiEndpointsSpec {
            krakend_instance: krakend.to_string(),
            app_name: name.to_string(),
            auth: Auth {
                name: "maskinporten".to_string(),
                scope: vec!["nav:test".to_string()],
                ..Default::default()
            },
            endpoints: vec![Endpoint {
                path: format!("/{name}/api"),
                method: "GET".to_string(),
                backend_host: format!("http://{name}"),
                backend_path: "/api".to_string(),
                ..Default::default()
            }],
            open_endpoints: vec![Endpoint {
                path: format!("/{name}/doc"),
                method: "GET".to_string(),
                backend_host: format!("http://{name}.{namespace}"),
                backend_path: "/doc".to_string(),
                ..Default::default()
            }],
        },
        status: None,
    }
}

pub fn terminating(mut ae: ApiEndpoints) -> ApiEndpoints {
    ae.metadata.deletion_timestamp = Some(
        serde_json::from_value(serde_json::json!("2024-01-01T00:00:00Z"))
            .expect("valid timestamp"),
    );
    ae
}

type Key = (String, String);

fn key_of<K: Resource>(obj: &K) -> Key {
    (obj.namespace().unwrap_or_default(), obj.name_any())
}

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

#[derive(Default)]
struct State {
    resource_version: u64,
    writes: usize,
    api_endpoints: BTreeMap<Key, ApiEndpoints>,
    krakends: BTreeMap<Key, Krakend>,
    config_maps: BTreeMap<Key, ConfigMap>,
    deployments: BTreeMap<Key, Deployment>,
    network_policies: BTreeMap<Key, NetworkPolicy>,
}

impl State {
    fn next_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }
}

/// Optimistic-concurrency replace against one map of the store
fn replace_in<K: Resource + Clone>(
    map: &mut BTreeMap<Key, K>,
    version: String,
    kind: &'static str,
    obj: &K,
) -> Result<K, Error> {
    let k = key_of(obj);
    let existing = map.get(&k).ok_or_else(|| Error::NotFound {
        kind,
        namespace: k.0.clone(),
        name: k.1.clone(),
    })?;
    if existing.meta().resource_version != obj.meta().resource_version {
        return Err(Error::Conflict {
            kind,
            namespace: k.0,
            name: k.1,
        });
    }
    let mut stored = obj.clone();
    stored.meta_mut().resource_version = Some(version);
    map.insert(k, stored.clone());
    Ok(stored)
}

/// In-memory stand-in for the API server
///
/// Tracks resource versions so stale writes conflict, keeps the status
/// subresource separate from replaces, and drops terminating ApiEndpoints
/// once their last finalizer is removed.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<State>,
}

impl FakeStore {
    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().expect("store lock");
        f(&mut state)
    }

    pub fn insert_api_endpoints(&self, mut ae: ApiEndpoints) {
        self.with_state(|s| {
            ae.metadata.resource_version = Some(s.next_version());
            s.api_endpoints.insert(key_of(&ae), ae);
        });
    }

    pub fn insert_krakend(&self, mut k: Krakend) {
        self.with_state(|s| {
            k.metadata.resource_version = Some(s.next_version());
            s.krakends.insert(key_of(&k), k);
        });
    }

    pub fn insert_config_map(&self, mut cm: ConfigMap) {
        self.with_state(|s| {
            cm.metadata.resource_version = Some(s.next_version());
            s.config_maps.insert(key_of(&cm), cm);
        });
    }

    pub fn insert_deployment(&self, mut d: Deployment) {
        self.with_state(|s| {
            d.metadata.resource_version = Some(s.next_version());
            s.deployments.insert(key_of(&d), d);
        });
    }

    pub fn mark_for_deletion(&self, namespace: &str, name: &str) {
        self.with_state(|s| {
            let version = s.next_version();
            if let Some(ae) = s.api_endpoints.remove(&key(namespace, name)) {
                let mut ae = terminating(ae);
                ae.metadata.resource_version = Some(version);
                s.api_endpoints.insert(key(namespace, name), ae);
            }
        });
    }

    pub fn remove_krakend(&self, namespace: &str, name: &str) {
        self.with_state(|s| {
            s.krakends.remove(&key(namespace, name));
        });
    }

    pub fn api_endpoints(&self, namespace: &str, name: &str) -> Option<ApiEndpoints> {
        self.with_state(|s| s.api_endpoints.get(&key(namespace, name)).cloned())
    }

    pub fn config_map(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        self.with_state(|s| s.config_maps.get(&key(namespace, name)).cloned())
    }

    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.with_state(|s| s.deployments.get(&key(namespace, name)).cloned())
    }

    pub fn network_policies(&self, namespace: &str) -> Vec<NetworkPolicy> {
        self.with_state(|s| {
            s.network_policies
                .iter()
                .filter(|((ns, _), _)| ns == namespace)
                .map(|(_, np)| np.clone())
                .collect()
        })
    }

    /// Number of successful writes so far
    pub fn writes(&self) -> usize {
        self.with_state(|s| s.writes)
    }
}

#[async_trait]
impl EndpointsKubeClient for FakeStore {
    async fn get_api_endpoints(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<ApiEndpoints>, Error> {
        Ok(self.api_endpoints(namespace, name))
    }

    async fn list_api_endpoints(&self, namespace: &str) -> Result<Vec<ApiEndpoints>, Error> {
        Ok(self.with_state(|s| {
            s.api_endpoints
                .iter()
                .filter(|((ns, _), _)| ns == namespace)
                .map(|(_, ae)| ae.clone())
                .collect()
        }))
    }

    async fn replace_api_endpoints(&self, endpoints: &ApiEndpoints) -> Result<ApiEndpoints, Error> {
        self.with_state(|s| {
            let version = s.next_version();
            let mut incoming = endpoints.clone();
            // status is only written through the status subresource
            incoming.status = s
                .api_endpoints
                .get(&key_of(endpoints))
                .and_then(|ae| ae.status.clone());
            let stored = replace_in(&mut s.api_endpoints, version, "ApiEndpoints", &incoming)?;
            s.writes += 1;
            if stored.metadata.deletion_timestamp.is_some() && stored.finalizers().is_empty() {
                s.api_endpoints.remove(&key_of(&stored));
            }
            Ok(stored)
        })
    }

    async fn patch_api_endpoints_status(
        &self,
        name: &str,
        namespace: &str,
        status: &ApiEndpointsStatus,
    ) -> Result<(), Error> {
        self.with_state(|s| {
            let version = s.next_version();
            let ae = s
                .api_endpoints
                .get_mut(&key(namespace, name))
                .ok_or_else(|| Error::NotFound {
                    kind: "ApiEndpoints",
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                })?;
            ae.status = Some(status.clone());
            ae.metadata.resource_version = Some(version);
            s.writes += 1;
            Ok(())
        })
    }

    async fn get_krakend(&self, name: &str, namespace: &str) -> Result<Option<Krakend>, Error> {
        Ok(self.with_state(|s| s.krakends.get(&key(namespace, name)).cloned()))
    }

    async fn get_config_map(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<ConfigMap>, Error> {
        Ok(self.config_map(namespace, name))
    }

    async fn replace_config_map(&self, config_map: &ConfigMap) -> Result<ConfigMap, Error> {
        self.with_state(|s| {
            let version = s.next_version();
            let stored = replace_in(&mut s.config_maps, version, "ConfigMap", config_map)?;
            s.writes += 1;
            Ok(stored)
        })
    }

    async fn get_deployment(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<Deployment>, Error> {
        Ok(self.deployment(namespace, name))
    }

    async fn replace_deployment(&self, deployment: &Deployment) -> Result<Deployment, Error> {
        self.with_state(|s| {
            let version = s.next_version();
            let stored = replace_in(&mut s.deployments, version, "Deployment", deployment)?;
            s.writes += 1;
            Ok(stored)
        })
    }

    async fn get_network_policy(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<NetworkPolicy>, Error> {
        Ok(self.with_state(|s| s.network_policies.get(&key(namespace, name)).cloned()))
    }

    async fn create_network_policy(&self, policy: &NetworkPolicy) -> Result<NetworkPolicy, Error> {
        self.with_state(|s| {
            let k = key_of(policy);
            if s.network_policies.contains_key(&k) {
                return Err(Error::Conflict {
                    kind: "NetworkPolicy",
                    namespace: k.0,
                    name: k.1,
                });
            }
            let mut stored = policy.clone();
            stored.metadata.resource_version = Some(s.next_version());
            s.network_policies.insert(k, stored.clone());
            s.writes += 1;
            Ok(stored)
        })
    }

    async fn replace_network_policy(
        &self,
        policy: &NetworkPolicy,
    ) -> Result<NetworkPolicy, Error> {
        self.with_state(|s| {
            let version = s.next_version();
            let stored = replace_in(&mut s.network_policies, version, "NetworkPolicy", policy)?;
            s.writes += 1;
            Ok(stored)
        })
    }
}
