//! # ApiEndpoints Spec
//!
//! Endpoint declarations owned by application teams.

use serde::{Deserialize, Serialize};

/// ApiEndpoints Custom Resource Definition
///
/// Declares the endpoints an application exposes through a KrakenD instance.
/// All ApiEndpoints in a namespace are merged into the partials ConfigMap of
/// the Krakend they reference.
///
/// # Example
///
/// ```yaml
/// apiVersion: krakend.nais.io/v1
/// kind: ApiEndpoints
/// metadata:
///   name: app1
///   namespace: team1
/// spec:
///   krakendInstance: team1
///   appName: app1
///   auth:
///     name: maskinporten
///     scope: ["nav:some/scope"]
///   endpoints:
///     - path: /app1/api
///       method: GET
///       backendHost: http://app1
///       backendPath: /api
///   openEndpoints:
///     - path: /app1/doc
///       method: GET
///       backendHost: http://app1
///       backendPath: /doc
/// ```
#[derive(
    kube::CustomResource, Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema,
)]
#[kube(
    kind = "ApiEndpoints",
    group = "krakend.nais.io",
    version = "v1",
    namespaced,
    status = "crate::crd::ApiEndpointsStatus",
    shortname = "ae",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Krakend", "type":"string", "jsonPath":".spec.krakendInstance"}, {"name":"Synchronized", "type":"string", "jsonPath":".status.synchronizationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpointsSpec {
    /// Name of the Krakend instance in the same namespace.
    /// Defaults to the namespace name when empty.
    #[serde(default)]
    pub krakend_instance: String,
    /// Name of the API, e.g. name of the application or service
    #[serde(default)]
    pub app_name: String,
    /// Authentication applied to the protected endpoints
    #[serde(default)]
    pub auth: Auth,
    /// Endpoints protected by the configured auth provider
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    /// Endpoints exposed without authentication
    #[serde(default)]
    pub open_endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub method: String,
    /// Backend base URL, e.g. `http://app1` or `https://api.example.com`
    #[serde(default)]
    pub backend_host: String,
    #[serde(default)]
    pub backend_path: String,
    #[serde(default)]
    pub forward_headers: Vec<String>,
    #[serde(default)]
    pub query_params: Vec<String>,
    #[serde(default)]
    pub rate_limit: RateLimit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    #[serde(default)]
    pub max_rate: i32,
    #[serde(default)]
    pub client_max_rate: i32,
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub capacity: i32,
    #[serde(default)]
    pub client_capacity: i32,
}

impl RateLimit {
    /// A rate limit with every field unset imposes no limit
    #[must_use]
    pub fn is_unset(&self) -> bool {
        *self == RateLimit::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Auth {
    /// Name of the auth provider defined in the Krakend resource, e.g. maskinporten
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cache: bool,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub audience: Vec<String>,
    #[serde(default)]
    pub scope: Vec<String>,
}

impl ApiEndpoints {
    /// Name of the Krakend instance this declaration contributes to
    ///
    /// Falls back to the namespace name when `krakendInstance` is empty.
    #[must_use]
    pub fn krakend_name(&self) -> String {
        if self.spec.krakend_instance.is_empty() {
            self.metadata.namespace.clone().unwrap_or_default()
        } else {
            self.spec.krakend_instance.clone()
        }
    }

    /// Whether the resource has been marked for deletion
    #[must_use]
    pub fn is_terminating(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;

    #[test]
    fn test_krakend_name_defaults_to_namespace() {
        let ae = ApiEndpoints {
            metadata: ObjectMeta {
                name: Some("app1".to_string()),
                namespace: Some("team1".to_string()),
                ..Default::default()
            },
            spec: ApiEndpointsSpec::default(),
            status: None,
        };
        assert_eq!(ae.krakend_name(), "team1");
    }

    #[test]
    fn test_krakend_name_uses_instance() {
        let ae = ApiEndpoints {
            metadata: ObjectMeta {
                name: Some("app1".to_string()),
                namespace: Some("team1".to_string()),
                ..Default::default()
            },
            spec: ApiEndpointsSpec {
                krakend_instance: "shared-gw".to_string(),
                ..Default::default()
            },
            status: None,
        };
        assert_eq!(ae.krakend_name(), "shared-gw");
    }

    #[test]
    fn test_spec_deserializes_camel_case() {
        let yaml = r#"
krakendInstance: gw
appName: app1
auth:
  name: maskinporten
  cache: true
  scope: ["nav:test"]
endpoints:
  - path: /app1/api
    method: GET
    backendHost: http://app1
    backendPath: /api
    forwardHeaders: ["Authorization"]
    queryParams: ["page"]
    rateLimit:
      maxRate: 10
      clientMaxRate: 2
      strategy: ip
      capacity: 10
      clientCapacity: 2
"#;
        let spec: ApiEndpointsSpec = serde_yaml::from_str(yaml).expect("valid spec");
        assert_eq!(spec.krakend_instance, "gw");
        assert!(spec.auth.cache);
        assert_eq!(spec.endpoints[0].rate_limit.client_max_rate, 2);
        assert_eq!(spec.endpoints[0].forward_headers, vec!["Authorization"]);
        assert!(spec.open_endpoints.is_empty());
    }

    #[test]
    fn test_rate_limit_is_unset() {
        assert!(RateLimit::default().is_unset());
        let limited = RateLimit {
            max_rate: 5,
            ..Default::default()
        };
        assert!(!limited.is_unset());
    }
}
