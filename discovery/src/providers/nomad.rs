//! `NomadDiscoverer`: two-phase allocation listing and per-allocation detail fetch.

use crate::config::NomadConfig;
use crate::discoverer::{DiscoveryContext, Discoverer};
use crate::error::DiscoveryError;
use crate::target::{ExternalTarget, ProbeSpec, TargetSource, TargetType};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, serde::Deserialize)]
struct Allocation {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "JobID")]
    job_id: String,
    #[serde(rename = "TaskGroup")]
    task_group: String,
    #[serde(rename = "ClientStatus")]
    client_status: String,
    #[serde(default, rename = "Namespace")]
    namespace: String,
}

#[derive(Debug, serde::Deserialize)]
struct AllocationDetail {
    /// `BTreeMap`, not `HashMap`: task names must iterate in a stable order so that two
    /// successive `discover()` calls against an unchanged allocation emit targets in the
    /// same order (the idempotence invariant of spec.md §8).
    #[serde(default, rename = "TaskStates")]
    task_states: BTreeMap<String, TaskState>,
    #[serde(rename = "Resources")]
    resources: AllocResources,
}

#[derive(Debug, serde::Deserialize)]
struct TaskState {
    #[serde(rename = "State")]
    state: String,
}

#[derive(Debug, serde::Deserialize)]
struct AllocResources {
    #[serde(default, rename = "Networks")]
    networks: Vec<AllocNetwork>,
}

#[derive(Debug, serde::Deserialize)]
struct AllocNetwork {
    #[serde(default, rename = "IP")]
    ip: String,
    #[serde(default, rename = "ReservedPorts")]
    reserved_ports: Vec<NetworkPort>,
    #[serde(default, rename = "DynamicPorts")]
    dynamic_ports: Vec<NetworkPort>,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct NetworkPort {
    #[serde(rename = "Label")]
    label: String,
    #[serde(rename = "Value")]
    value: u16,
}

pub struct NomadDiscoverer {
    address: String,
    namespace: Option<String>,
    job_filter: Option<String>,
    http: reqwest::Client,
}

impl NomadDiscoverer {
    pub fn new(config: &NomadConfig) -> Result<Self, DiscoveryError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DiscoveryError::network("build nomad client", e))?;

        Ok(Self {
            address: config.address.clone(),
            namespace: config.namespace.clone(),
            job_filter: config.job_filter.clone(),
            http,
        })
    }

    async fn fetch_allocations(&self) -> Result<Vec<Allocation>, DiscoveryError> {
        let mut url = format!("{}/v1/allocations", self.address);
        if let Some(ns) = &self.namespace {
            url.push_str("?namespace=");
            url.push_str(ns);
        }

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DiscoveryError::network("fetch allocations", e))?;
        if !response.status().is_success() {
            return Err(DiscoveryError::network(
                "fetch allocations",
                format!("unexpected status code {}", response.status()),
            ));
        }
        response
            .json()
            .await
            .map_err(|e| DiscoveryError::Decode(format!("fetch allocations: {e}")))
    }

    async fn fetch_allocation_detail(&self, alloc_id: &str) -> Result<AllocationDetail, DiscoveryError> {
        let url = format!("{}/v1/allocation/{}", self.address, alloc_id);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DiscoveryError::network(format!("fetch allocation detail {alloc_id}"), e))?;
        if !response.status().is_success() {
            return Err(DiscoveryError::network(
                format!("fetch allocation detail {alloc_id}"),
                format!("unexpected status code {}", response.status()),
            ));
        }
        response
            .json()
            .await
            .map_err(|e| DiscoveryError::Decode(format!("fetch allocation detail {alloc_id}: {e}")))
    }

    /// Accepts only running allocations whose `JobID` begins with the configured prefix
    /// (plain prefix match, not glob).
    fn matches_filters(&self, allocation: &Allocation) -> bool {
        if allocation.client_status != "running" {
            return false;
        }
        match &self.job_filter {
            Some(prefix) => allocation.job_id.starts_with(prefix.as_str()),
            None => true,
        }
    }

    fn select_probe(network: &AllocNetwork) -> Option<ProbeSpec> {
        let port = network.reserved_ports.first().or_else(|| network.dynamic_ports.first())?;
        let address = if network.ip.is_empty() { "127.0.0.1".to_string() } else { network.ip.clone() };
        Some(ProbeSpec::tcp(address, port.value))
    }

    fn alloc_targets(allocation: &Allocation, detail: AllocationDetail) -> Vec<ExternalTarget> {
        let alloc_prefix: String = allocation.id.chars().take(8).collect();
        let network = detail.resources.networks.first();
        let port_label = network.and_then(|n| n.reserved_ports.first().or_else(|| n.dynamic_ports.first()));

        detail
            .task_states
            .into_iter()
            .filter(|(_, state)| state.state == "running")
            .map(|(task_name, _)| {
                let id = format!("nomad:{alloc_prefix}/{task_name}");
                let name = format!("{}/{}", allocation.job_id, task_name);
                let mut target = ExternalTarget::new(id, name, TargetType::Nomad, TargetSource::Discovered)
                    .with_label("nomad.alloc_id", allocation.id.clone())
                    .with_label("nomad.job", allocation.job_id.clone())
                    .with_label("nomad.task_group", allocation.task_group.clone())
                    .with_label("nomad.task", task_name.clone())
                    .with_label("nomad.namespace", allocation.namespace.clone());

                if let Some(n) = network {
                    if let Some(probe) = Self::select_probe(n) {
                        target = target.with_probe(probe);
                    }
                }
                if let Some(port) = port_label {
                    target = target.with_label("nomad.port_label", port.label.clone());
                }
                target
            })
            .collect()
    }
}

#[async_trait]
impl Discoverer for NomadDiscoverer {
    fn kind(&self) -> TargetType {
        TargetType::Nomad
    }

    async fn discover(&self, ctx: &DiscoveryContext) -> Result<Vec<ExternalTarget>, DiscoveryError> {
        log::trace!("nomad discoverer: entering discover");
        ctx.check()?;
        let allocations = self.fetch_allocations().await.map_err(|e| {
            log::error!("{e}");
            e
        })?;
        ctx.check()?;

        let mut targets = Vec::new();
        for allocation in allocations.iter().filter(|a| self.matches_filters(a)) {
            ctx.check()?;
            // Detail-fetch errors are tolerated: skip this allocation, not the whole call.
            let detail = match self.fetch_allocation_detail(&allocation.id).await {
                Ok(detail) => detail,
                Err(e) => {
                    log::warn!("skipping allocation {}: {e}", allocation.id);
                    continue;
                }
            };
            targets.extend(Self::alloc_targets(allocation, detail));
        }

        log::info!("nomad discoverer: emitted {} targets", targets.len());
        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocation(id: &str, job_id: &str, status: &str) -> Allocation {
        Allocation {
            id: id.to_string(),
            job_id: job_id.to_string(),
            task_group: "group".to_string(),
            client_status: status.to_string(),
            namespace: "default".to_string(),
        }
    }

    #[test]
    fn job_filter_is_prefix_not_glob() {
        let discoverer = NomadDiscoverer::new(&NomadConfig {
            enabled: true,
            job_filter: Some("web-".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(discoverer.matches_filters(&allocation("a", "web-server", "running")));
        assert!(!discoverer.matches_filters(&allocation("b", "db-postgres", "running")));
    }

    #[test]
    fn non_running_allocation_never_matches() {
        let discoverer = NomadDiscoverer::new(&NomadConfig::default()).unwrap();
        assert!(!discoverer.matches_filters(&allocation("a", "web-server", "complete")));
    }

    #[test]
    fn alloc_targets_emits_one_target_per_running_task_with_reserved_port() {
        let allocation = allocation("abcd1234-efgh", "web-server", "running");
        let mut task_states = BTreeMap::new();
        task_states.insert(
            "nginx".to_string(),
            TaskState {
                state: "running".to_string(),
            },
        );
        let detail = AllocationDetail {
            task_states,
            resources: AllocResources {
                networks: vec![AllocNetwork {
                    ip: "192.168.1.10".to_string(),
                    reserved_ports: vec![NetworkPort {
                        label: "http".to_string(),
                        value: 8080,
                    }],
                    dynamic_ports: vec![],
                }],
            },
        };
        let targets = NomadDiscoverer::alloc_targets(&allocation, detail);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].id, "nomad:abcd1234/nginx");
        assert!(matches!(targets[0].probe, Some(ProbeSpec::Tcp(ref s)) if s.address == "192.168.1.10" && s.port == 8080));
        assert_eq!(targets[0].labels.get("nomad.port_label"), Some(&"http".to_string()));
    }

    #[test]
    fn non_running_task_is_skipped() {
        let allocation = allocation("abcd1234", "web-server", "running");
        let mut task_states = BTreeMap::new();
        task_states.insert(
            "sidecar".to_string(),
            TaskState {
                state: "dead".to_string(),
            },
        );
        let detail = AllocationDetail {
            task_states,
            resources: AllocResources { networks: vec![] },
        };
        assert!(NomadDiscoverer::alloc_targets(&allocation, detail).is_empty());
    }

    #[test]
    fn multiple_running_tasks_emit_in_stable_sorted_order_across_calls() {
        let allocation = allocation("abcd1234", "web-server", "running");
        let mut task_states = BTreeMap::new();
        task_states.insert("web".to_string(), TaskState { state: "running".to_string() });
        task_states.insert("nginx".to_string(), TaskState { state: "running".to_string() });
        let detail = AllocationDetail {
            task_states,
            resources: AllocResources { networks: vec![] },
        };
        let first = NomadDiscoverer::alloc_targets(&allocation, detail);
        let ids: Vec<_> = first.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["nomad:abcd1234/nginx".to_string(), "nomad:abcd1234/web".to_string()]);
    }
}
