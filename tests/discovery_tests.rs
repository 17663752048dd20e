//! # App Discovery Tests
//!
//! Backend hosts to app names, and the allow policy each discovered app gets.

use krakend_endpoints_controller::controller::reconciler::discovery::{
    app_from_backend_host, apps_in_namespace,
};
use krakend_endpoints_controller::controller::reconciler::naming::network_policy_name;
use krakend_endpoints_controller::crd::Endpoint;
use krakend_endpoints_controller::netpol::app_allow_krakend_ingress_netpol;

fn endpoint(backend_host: &str) -> Endpoint {
    Endpoint {
        path: "/x".to_string(),
        backend_host: backend_host.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_accepted_host_forms() {
    let cases = [
        ("http://app1", Some("app1")),
        ("http://app1.ns1", Some("app1")),
        ("http://app1.ns1.svc.cluster.local", Some("app1")),
        ("http://app1.ns1.svc", None),
        ("http://app1.other", None),
        ("http://app1.other.svc.cluster.local", None),
        ("http://app1.ns1.svc.other.domain", None),
        ("https://app1", None),
        ("https://api.example.com", None),
    ];

    for (host, expected) in cases {
        let app = app_from_backend_host(host, "ns1", "cluster.local")
            .unwrap_or_else(|e| panic!("{host} should parse: {e}"));
        assert_eq!(app.as_deref(), expected, "backend host {host}");
    }
}

#[test]
fn test_custom_cluster_domain() {
    let app = app_from_backend_host("http://app1.ns1.svc.example.internal", "ns1", "example.internal")
        .unwrap();
    assert_eq!(app.as_deref(), Some("app1"));
}

#[test]
fn test_unparsable_host_is_error() {
    assert!(app_from_backend_host("not a url", "ns1", "cluster.local").is_err());
}

#[test]
fn test_apps_are_distinct_and_skip_bad_hosts() {
    let endpoints = [
        endpoint("http://app1"),
        endpoint("not a url"),
        endpoint("http://app2.ns1"),
        endpoint("http://app1.ns1.svc.cluster.local"),
        endpoint("https://external.example.com"),
    ];

    let apps = apps_in_namespace(&endpoints, "ns1", "cluster.local");

    assert_eq!(apps, vec!["app1", "app2"]);
}

#[test]
fn test_policy_for_discovered_app() {
    let apps = apps_in_namespace(&[endpoint("http://app1.ns1")], "ns1", "cluster.local");
    let name = network_policy_name("gw", &apps[0]);

    let policy = app_allow_krakend_ingress_netpol(&name, "ns1", &apps[0]);

    assert_eq!(policy.metadata.name.as_deref(), Some("allow-gw-app1"));
    let spec = serde_json::to_value(policy.spec.unwrap()).unwrap();
    assert_eq!(spec["podSelector"]["matchLabels"]["app"], "app1");
}
