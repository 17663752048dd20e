//! # Partials Rendering
//!
//! Turns the live ApiEndpoints of a namespace into the KrakenD endpoint list
//! stored under `endpoints.tmpl` in the partials ConfigMap. The KrakenD
//! template includes this list verbatim, so the output must be valid JSON and
//! stable for identical input.

use crate::crd::{ApiEndpoints, AuthProvider, Endpoint, Krakend, RateLimit};
use crate::Error;
use kube::ResourceExt;
use serde::Serialize;

/// One entry of the KrakenD `endpoints` array
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KrakendEndpoint {
    pub endpoint: String,
    pub method: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub input_headers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub input_query_strings: Vec<String>,
    #[serde(skip_serializing_if = "ExtraConfig::is_empty")]
    pub extra_config: ExtraConfig,
    pub backend: Vec<Backend>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Backend {
    pub host: Vec<String>,
    pub url_pattern: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtraConfig {
    #[serde(rename = "auth/validator", skip_serializing_if = "Option::is_none")]
    pub auth_validator: Option<AuthValidator>,
    #[serde(rename = "qos/ratelimit/router", skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitRouter>,
}

impl ExtraConfig {
    fn is_empty(&self) -> bool {
        self.auth_validator.is_none() && self.rate_limit.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthValidator {
    pub alg: String,
    pub jwk_url: String,
    pub issuer: String,
    pub cache: bool,
    pub disable_jwk_security: bool,
    pub operation_debug: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub audience: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitRouter {
    pub max_rate: i32,
    pub client_max_rate: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub strategy: String,
    pub capacity: i32,
    pub client_capacity: i32,
}

impl From<&RateLimit> for RateLimitRouter {
    fn from(rl: &RateLimit) -> Self {
        Self {
            max_rate: rl.max_rate,
            client_max_rate: rl.client_max_rate,
            strategy: rl.strategy.clone(),
            capacity: rl.capacity,
            client_capacity: rl.client_capacity,
        }
    }
}

/// Build the KrakenD endpoint list for a Krakend from its live declarations
///
/// Declarations are ordered by name so the output does not depend on list order
/// from the API server. Within a declaration, protected endpoints come first.
pub fn to_krakend_endpoints(
    krakend: &Krakend,
    declarations: &[ApiEndpoints],
) -> Result<Vec<KrakendEndpoint>, Error> {
    let mut sorted: Vec<&ApiEndpoints> = declarations.iter().collect();
    sorted.sort_by_key(|ae| ae.name_any());

    let mut out = Vec::new();
    for ae in sorted {
        if !ae.spec.endpoints.is_empty() {
            let provider = krakend.auth_provider(&ae.spec.auth.name).ok_or_else(|| {
                Error::Render(format!(
                    "ApiEndpoints '{}' references auth provider '{}' which is not defined on Krakend '{}'",
                    ae.name_any(),
                    ae.spec.auth.name,
                    krakend.name_any()
                ))
            })?;
            let validator = auth_validator(ae, provider);
            for ep in &ae.spec.endpoints {
                out.push(endpoint(ep, Some(validator.clone())));
            }
        }
        for ep in &ae.spec.open_endpoints {
            out.push(endpoint(ep, None));
        }
    }
    Ok(out)
}

/// Render the partial stored in the ConfigMap
pub fn render(krakend: &Krakend, declarations: &[ApiEndpoints]) -> Result<String, Error> {
    let endpoints = to_krakend_endpoints(krakend, declarations)?;
    Ok(serde_json::to_string(&endpoints)?)
}

fn auth_validator(ae: &ApiEndpoints, provider: &AuthProvider) -> AuthValidator {
    let auth = &ae.spec.auth;
    AuthValidator {
        alg: provider.alg.clone(),
        jwk_url: provider.jwk_uri.clone(),
        issuer: provider.issuer.clone(),
        cache: auth.cache,
        disable_jwk_security: false,
        operation_debug: auth.debug,
        audience: auth.audience.clone(),
        scopes: auth.scope.clone(),
        scopes_key: (!auth.scope.is_empty()).then(|| "scope".to_string()),
    }
}

fn endpoint(ep: &Endpoint, validator: Option<AuthValidator>) -> KrakendEndpoint {
    let rate_limit = (!ep.rate_limit.is_unset()).then(|| RateLimitRouter::from(&ep.rate_limit));
    KrakendEndpoint {
        endpoint: ep.path.clone(),
        method: if ep.method.is_empty() {
            "GET".to_string()
        } else {
            ep.method.to_uppercase()
        },
        input_headers: ep.forward_headers.clone(),
        input_query_strings: ep.query_params.clone(),
        extra_config: ExtraConfig {
            auth_validator: validator,
            rate_limit,
        },
        backend: vec![Backend {
            host: vec![ep.backend_host.clone()],
            url_pattern: ep.backend_path.clone(),
        }],
    }
}
