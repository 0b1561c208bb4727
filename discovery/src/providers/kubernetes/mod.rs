//! `KubernetesDiscoverer`: queries the Kubernetes pods API per configured namespace.

mod auth;
mod client;

use crate::config::KubernetesConfig;
use crate::discoverer::{DiscoveryContext, Discoverer};
use crate::error::DiscoveryError;
use crate::target::{ExternalTarget, ProbeSpec, TargetSource, TargetType};
use async_trait::async_trait;
use client::{KubernetesClient, Pod};
use fleetwatch_shared::os::env_var::{ActualEnvVarQuery, EnvVarQuery};
use std::path::Path;

pub struct KubernetesDiscoverer {
    client: KubernetesClient,
    namespaces: Vec<String>,
    label_selector: Option<String>,
}

impl KubernetesDiscoverer {
    /// Resolves auth once (explicit path -> `$HOME/.kube/config` -> in-cluster) and builds
    /// the HTTP client. A failure here (e.g. `cluster-not-found`) is returned to the
    /// caller so the assembling `Factory` can log and omit this provider.
    pub fn new(config: &KubernetesConfig) -> Result<Self, DiscoveryError> {
        let env = ActualEnvVarQuery;
        Self::new_with_env(config, &env)
    }

    fn new_with_env(config: &KubernetesConfig, env: &dyn EnvVarQuery) -> Result<Self, DiscoveryError> {
        let explicit_path = config.kubeconfig_path.as_ref().map(Path::new);
        let kube_auth = auth::load_auth(explicit_path, env)?;
        let client = KubernetesClient::new(kube_auth)?;

        let namespaces = if config.namespaces.is_empty() {
            vec!["default".to_string()]
        } else {
            config.namespaces.clone()
        };

        Ok(Self {
            client,
            namespaces,
            label_selector: config.label_selector.clone(),
        })
    }

    fn pod_to_target(namespace: &str, pod: Pod) -> ExternalTarget {
        let id = format!("kubernetes:{namespace}/{}", pod.metadata.name);
        let mut target = ExternalTarget::new(
            id,
            pod.metadata.name.clone(),
            TargetType::Kubernetes,
            TargetSource::Discovered,
        )
        .with_labels(pod.metadata.labels)
        .with_label("kubernetes.namespace", namespace.to_string())
        .with_label("kubernetes.pod", pod.metadata.name.clone())
        .with_label(
            "kubernetes.phase",
            pod.status.phase.clone().unwrap_or_default(),
        );

        let probe_port = pod.spec.containers.iter().find_map(|c| {
            c.ports.iter().find(|p| {
                p.protocol
                    .as_deref()
                    .map(|proto| proto.eq_ignore_ascii_case("tcp"))
                    .unwrap_or(true)
            })
        });

        if let Some(port) = probe_port {
            target = target.with_probe(ProbeSpec::tcp(pod.status.pod_ip.clone(), port.container_port));
        }

        target
    }
}

#[async_trait]
impl Discoverer for KubernetesDiscoverer {
    fn kind(&self) -> TargetType {
        TargetType::Kubernetes
    }

    async fn discover(&self, ctx: &DiscoveryContext) -> Result<Vec<ExternalTarget>, DiscoveryError> {
        log::trace!("kubernetes discoverer: entering discover");
        ctx.check()?;
        let mut targets = Vec::new();

        for namespace in &self.namespaces {
            ctx.check()?;
            let pods = self
                .client
                .list_pods(namespace, self.label_selector.as_deref())
                .await
                .map_err(|e| {
                    log::error!("{e}");
                    e
                })?;

            let running = pods
                .into_iter()
                .filter(|p| p.status.phase.as_deref() == Some("Running") && !p.status.pod_ip.is_empty());

            targets.extend(running.map(|pod| Self::pod_to_target(namespace, pod)));
        }

        log::info!("kubernetes discoverer: emitted {} targets", targets.len());
        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::client::{ContainerPort, Pod, PodContainer, PodMetadata, PodSpec, PodStatus};
    use super::*;
    use std::collections::HashMap;

    fn running_pod(name: &str, ip: &str, port: u16, protocol: Option<&str>) -> Pod {
        Pod {
            metadata: PodMetadata {
                name: name.to_string(),
                labels: HashMap::new(),
            },
            spec: PodSpec {
                containers: vec![PodContainer {
                    ports: vec![ContainerPort {
                        container_port: port,
                        protocol: protocol.map(str::to_string),
                    }],
                }],
            },
            status: PodStatus {
                phase: Some("Running".to_string()),
                pod_ip: ip.to_string(),
            },
        }
    }

    #[test]
    fn converts_running_pod_with_tcp_port_to_target() {
        let pod = running_pod("nginx-pod", "10.0.0.1", 80, Some("TCP"));
        let target = KubernetesDiscoverer::pod_to_target("default", pod);
        assert_eq!(target.id, "kubernetes:default/nginx-pod");
        assert_eq!(target.labels.get("kubernetes.namespace"), Some(&"default".to_string()));
        assert!(matches!(target.probe, Some(ProbeSpec::Tcp(ref s)) if s.address == "10.0.0.1" && s.port == 80));
    }

    #[test]
    fn empty_protocol_is_treated_as_tcp() {
        let pod = running_pod("nginx-pod", "10.0.0.1", 80, None);
        let target = KubernetesDiscoverer::pod_to_target("default", pod);
        assert!(target.probe.is_some());
    }

    #[test]
    fn udp_only_port_leaves_probe_unset() {
        let pod = running_pod("dns-pod", "10.0.0.2", 53, Some("UDP"));
        let target = KubernetesDiscoverer::pod_to_target("default", pod);
        assert!(target.probe.is_none());
    }
}
