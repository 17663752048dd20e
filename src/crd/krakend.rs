//! # Krakend
//!
//! The gateway instance ApiEndpoints contribute to. The controller only reads
//! it: the partials ConfigMap and the Deployment are created by whatever
//! provisions the Krakend itself.

use serde::{Deserialize, Serialize};

/// Krakend Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: krakend.nais.io/v1
/// kind: Krakend
/// metadata:
///   name: team1
///   namespace: team1
/// spec:
///   authProviders:
///     - name: maskinporten
///       alg: RS256
///       jwkUri: https://maskinporten.no/jwk
///       issuer: https://maskinporten.no/
/// ```
#[derive(kube::CustomResource, Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Krakend",
    group = "krakend.nais.io",
    version = "v1",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct KrakendSpec {
    /// Auth providers ApiEndpoints can reference by name
    #[serde(default)]
    pub auth_providers: Vec<AuthProvider>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthProvider {
    pub name: String,
    #[serde(default = "default_alg")]
    pub alg: String,
    pub jwk_uri: String,
    pub issuer: String,
}

fn default_alg() -> String {
    "RS256".to_string()
}

impl Krakend {
    /// Look up an auth provider by name
    #[must_use]
    pub fn auth_provider(&self, name: &str) -> Option<&AuthProvider> {
        self.spec.auth_providers.iter().find(|p| p.name == name)
    }
}
