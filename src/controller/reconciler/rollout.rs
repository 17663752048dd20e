//! # Rollout
//!
//! Stamps the partials checksum onto the KrakenD Deployment so a changed
//! ConfigMap rolls the gateway pods.

use crate::constants::CHECKSUM_ANNOTATION;
use crate::controller::reconciler::naming::deployment_name;
use crate::controller::reconciler::types::Context;
use crate::observability::metrics;
use crate::Error;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::ByteString;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// The parts of a ConfigMap that make up its content
///
/// Server-managed metadata (resourceVersion, managedFields, timestamps) is
/// left out so an unchanged ConfigMap always yields the same checksum.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigMapContent<'a> {
    name: Option<&'a str>,
    namespace: Option<&'a str>,
    data: Option<&'a BTreeMap<String, String>>,
    binary_data: Option<&'a BTreeMap<String, ByteString>>,
}

/// Lowercase hex SHA-256 of the YAML serialization of the ConfigMap content
pub fn config_map_checksum(cm: &ConfigMap) -> Result<String, Error> {
    let content = ConfigMapContent {
        name: cm.metadata.name.as_deref(),
        namespace: cm.metadata.namespace.as_deref(),
        data: cm.data.as_ref(),
        binary_data: cm.binary_data.as_ref(),
    };
    let yaml = serde_yaml::to_string(&content)?;
    Ok(format!("{:x}", Sha256::digest(yaml.as_bytes())))
}

/// Set the checksum annotation on the Deployment and its pod template
///
/// A missing Deployment is not an error. Returns whether the Deployment was
/// updated.
pub async fn annotate_rollout(
    ctx: &Context,
    krakend_name: &str,
    namespace: &str,
    checksum: &str,
) -> Result<bool, Error> {
    let name = deployment_name(krakend_name);
    let Some(mut deployment) = ctx.client.get_deployment(&name, namespace).await? else {
        debug!(deployment = %name, "deployment not found, skipping rollout annotation");
        return Ok(false);
    };

    let mut changed = set_annotation(
        deployment.metadata.annotations.get_or_insert_with(BTreeMap::new),
        checksum,
    );
    if let Some(spec) = deployment.spec.as_mut() {
        let template_meta = spec.template.metadata.get_or_insert_with(Default::default);
        changed |= set_annotation(
            template_meta.annotations.get_or_insert_with(BTreeMap::new),
            checksum,
        );
    }

    if !changed {
        debug!(deployment = %name, "checksum annotation up to date");
        return Ok(false);
    }

    ctx.client.replace_deployment(&deployment).await?;
    metrics::increment_rollouts_triggered();
    info!(deployment = %name, checksum, "triggered rollout");
    Ok(true)
}

fn set_annotation(annotations: &mut BTreeMap<String, String>, checksum: &str) -> bool {
    if annotations.get(CHECKSUM_ANNOTATION).map(String::as_str) == Some(checksum) {
        return false;
    }
    annotations.insert(CHECKSUM_ANNOTATION.to_string(), checksum.to_string());
    true
}
