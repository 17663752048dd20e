//! # Allow Policies
//!
//! Builds the NetworkPolicy that lets KrakenD pods reach one backend app.

use crate::constants::{APP_LABEL_NAME, KRAKEND_POD_LABEL_NAME, KRAKEND_POD_LABEL_VALUE};
use k8s_openapi::api::networking::v1::{
    NetworkPolicy, NetworkPolicyIngressRule, NetworkPolicyPeer, NetworkPolicySpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;

/// NetworkPolicy admitting ingress from KrakenD pods to pods labelled `app=<app>`
#[must_use]
pub fn app_allow_krakend_ingress_netpol(name: &str, namespace: &str, app: &str) -> NetworkPolicy {
    NetworkPolicy {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Some(allow_krakend_ingress_spec(app)),
    }
}

/// Desired spec of the allow policy for `app`
#[must_use]
pub fn allow_krakend_ingress_spec(app: &str) -> NetworkPolicySpec {
    NetworkPolicySpec {
        pod_selector: Some(match_labels(APP_LABEL_NAME, app)),
        policy_types: Some(vec!["Ingress".to_string()]),
        ingress: Some(vec![NetworkPolicyIngressRule {
            from: Some(vec![NetworkPolicyPeer {
                pod_selector: Some(match_labels(
                    KRAKEND_POD_LABEL_NAME,
                    KRAKEND_POD_LABEL_VALUE,
                )),
                ..Default::default()
            }]),
            ..Default::default()
        }]),
        ..Default::default()
    }
}

fn match_labels(key: &str, value: &str) -> LabelSelector {
    LabelSelector {
        match_labels: Some(BTreeMap::from([(key.to_string(), value.to_string())])),
        ..Default::default()
    }
}
