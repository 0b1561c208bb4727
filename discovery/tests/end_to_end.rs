//! Literal end-to-end scenarios against stub HTTP servers.
//!
//! Docker and PortScan scenarios are covered as inline `#[cfg(test)]` unit tests next to
//! their implementations (bollard and `/proc/net/tcp` aren't practical to stand up behind
//! an HTTP stub); this file covers the scenarios that go over a REST endpoint this crate
//! actually dials itself: Kubernetes and Nomad.

use fleetwatch_discovery::config::{KubernetesConfig, NomadConfig};
use fleetwatch_discovery::providers::{KubernetesDiscoverer, NomadDiscoverer};
use fleetwatch_discovery::{Discoverer, DiscoveryContext};
use std::io::Write;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_kubeconfig(server_uri: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
current-context: default
clusters:
  - name: default-cluster
    cluster:
      server: {server_uri}
contexts:
  - name: default
    context:
      cluster: default-cluster
      user: default-user
users:
  - name: default-user
    user:
      token: test-token
"#
    )
    .unwrap();
    file
}

#[tokio::test]
async fn kubernetes_single_namespace_running_pod() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/default/pods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{
                "metadata": {"name": "nginx-pod", "labels": {}},
                "spec": {"containers": [{"ports": [{"containerPort": 80, "protocol": "TCP"}]}]},
                "status": {"phase": "Running", "podIP": "10.0.0.1"}
            }]
        })))
        .mount(&server)
        .await;

    let kubeconfig = write_kubeconfig(&server.uri());
    let discoverer = KubernetesDiscoverer::new(&KubernetesConfig {
        enabled: true,
        kubeconfig_path: Some(kubeconfig.path().to_string_lossy().to_string()),
        namespaces: vec![],
        label_selector: None,
    })
    .expect("kubeconfig resolves cleanly");

    let targets = discoverer.discover(&DiscoveryContext::new()).await.unwrap();
    assert_eq!(targets.len(), 1);
    let target = &targets[0];
    assert_eq!(target.id, "kubernetes:default/nginx-pod");
    assert_eq!(target.labels.get("kubernetes.namespace"), Some(&"default".to_string()));
    assert_eq!(target.labels.get("kubernetes.pod"), Some(&"nginx-pod".to_string()));
    assert_eq!(target.labels.get("kubernetes.phase"), Some(&"Running".to_string()));
}

#[tokio::test]
async fn kubeconfig_missing_cluster_fails_construction() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
current-context: default
clusters:
  - name: some-other-cluster
    cluster:
      server: https://example.invalid
contexts:
  - name: default
    context:
      cluster: nonexistent-cluster
      user: default-user
users:
  - name: default-user
    user:
      token: t
"#
    )
    .unwrap();

    let result = KubernetesDiscoverer::new(&KubernetesConfig {
        enabled: true,
        kubeconfig_path: Some(file.path().to_string_lossy().to_string()),
        namespaces: vec![],
        label_selector: None,
    });

    assert!(result.is_err(), "cluster-not-found kubeconfig must fail construction");
}

#[tokio::test]
async fn nomad_two_phase_discovery_emits_target_with_reserved_port() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/allocations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "ID": "abcd1234-efgh-5678",
            "JobID": "web-server",
            "TaskGroup": "group",
            "ClientStatus": "running",
            "Namespace": "default"
        }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/allocation/abcd1234-efgh-5678"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "TaskStates": {"nginx": {"State": "running"}},
            "Resources": {
                "Networks": [{
                    "IP": "192.168.1.10",
                    "ReservedPorts": [{"Label": "http", "Value": 8080}],
                    "DynamicPorts": []
                }]
            }
        })))
        .mount(&server)
        .await;

    let discoverer = NomadDiscoverer::new(&NomadConfig {
        enabled: true,
        address: server.uri(),
        namespace: None,
        job_filter: None,
    })
    .unwrap();

    let targets = discoverer.discover(&DiscoveryContext::new()).await.unwrap();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].id, "nomad:abcd1234/nginx");
    assert_eq!(targets[0].labels.get("nomad.port_label"), Some(&"http".to_string()));
}

#[tokio::test]
async fn nomad_job_filter_excludes_non_matching_allocations() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/allocations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"ID": "aaa11111", "JobID": "web-server", "TaskGroup": "g", "ClientStatus": "running", "Namespace": "default"},
            {"ID": "bbb22222", "JobID": "db-postgres", "TaskGroup": "g", "ClientStatus": "running", "Namespace": "default"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/allocation/aaa11111"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "TaskStates": {"nginx": {"State": "running"}},
            "Resources": {"Networks": []}
        })))
        .mount(&server)
        .await;

    let discoverer = NomadDiscoverer::new(&NomadConfig {
        enabled: true,
        address: server.uri(),
        namespace: None,
        job_filter: Some("web-".to_string()),
    })
    .unwrap();

    let targets = discoverer.discover(&DiscoveryContext::new()).await.unwrap();
    assert_eq!(targets.len(), 1);
    assert!(targets[0].id.starts_with("nomad:aaa11111"));
}

#[tokio::test]
async fn empty_pod_list_yields_empty_targets_no_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/default/pods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
        .mount(&server)
        .await;

    let kubeconfig = write_kubeconfig(&server.uri());
    let discoverer = KubernetesDiscoverer::new(&KubernetesConfig {
        enabled: true,
        kubeconfig_path: Some(kubeconfig.path().to_string_lossy().to_string()),
        namespaces: vec![],
        label_selector: None,
    })
    .unwrap();

    let targets = discoverer.discover(&DiscoveryContext::new()).await.unwrap();
    assert!(targets.is_empty());
}

#[tokio::test]
async fn discover_on_cancelled_context_errors_before_any_http_call() {
    let server = MockServer::start().await;
    // No mock registered: a request reaching the server at all would panic on mismatch.
    let kubeconfig = write_kubeconfig(&server.uri());
    let discoverer = KubernetesDiscoverer::new(&KubernetesConfig {
        enabled: true,
        kubeconfig_path: Some(kubeconfig.path().to_string_lossy().to_string()),
        namespaces: vec![],
        label_selector: None,
    })
    .unwrap();

    let ctx = DiscoveryContext::new();
    ctx.cancel();
    let result = discoverer.discover(&ctx).await;
    assert!(result.is_err());
}
