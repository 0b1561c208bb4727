//! Shared Docker/Podman container discovery.
//!
//! Both runtimes speak the same Docker Engine API over a Unix domain socket, so
//! [`DockerDiscoverer`] and [`PodmanDiscoverer`] are thin wrappers around one
//! [`ContainerRuntimeDiscoverer`] that differs only in socket path, id prefix, and
//! `TargetType`. Connection and listing go through `bollard`'s list-containers call against
//! `/containers/json`; no per-container inspect call is needed, since the list endpoint's
//! summaries already carry everything a target needs.

mod docker;
mod podman;

pub use docker::DockerDiscoverer;
pub use podman::PodmanDiscoverer;

use crate::discoverer::DiscoveryContext;
use crate::error::DiscoveryError;
use crate::filtering::matches_labels;
use crate::target::{ExternalTarget, ProbeSpec, TargetSource, TargetType};
use bollard::container::ListContainersOptions;
use bollard::models::ContainerSummary;
use bollard::Docker;
use std::collections::HashMap;
use std::time::Duration;

const DIAL_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) struct ContainerRuntimeDiscoverer {
    prefix: &'static str,
    target_type: TargetType,
    socket_path: String,
    label_filter: HashMap<String, String>,
    probe_port_type: String,
}

impl ContainerRuntimeDiscoverer {
    pub(crate) fn new(
        prefix: &'static str,
        target_type: TargetType,
        socket_path: String,
        label_filter: HashMap<String, String>,
        probe_port_type: String,
    ) -> Self {
        Self {
            prefix,
            target_type,
            socket_path,
            label_filter,
            probe_port_type,
        }
    }

    fn connect(&self) -> Result<Docker, DiscoveryError> {
        Docker::connect_with_unix(
            &self.socket_path,
            REQUEST_TIMEOUT.as_secs(),
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| DiscoveryError::network(format!("connect {}", self.socket_path), e))
    }

    /// One list call against `/containers/json`, restricted to running containers. An
    /// empty container list yields an empty target slice, never an error.
    pub(crate) async fn discover(
        &self,
        ctx: &DiscoveryContext,
    ) -> Result<Vec<ExternalTarget>, DiscoveryError> {
        log::trace!("{} discoverer: entering discover", self.prefix);
        ctx.check()?;
        let docker = self.connect().map_err(|e| {
            log::error!("{e}");
            e
        })?;

        let containers = tokio::time::timeout(DIAL_TIMEOUT + REQUEST_TIMEOUT, async {
            let options = ListContainersOptions::<String> {
                all: false,
                ..Default::default()
            };
            docker.list_containers(Some(options)).await
        })
        .await
        .map_err(|_| DiscoveryError::network(format!("{} list containers", self.prefix), "timed out"))?
        .map_err(|e| DiscoveryError::network(format!("{} list containers", self.prefix), e))?;

        ctx.check()?;

        let targets = containers
            .iter()
            .filter(|c| matches_labels(&self.label_filter, &container_labels(c)))
            .map(|c| self.container_to_target(c))
            .collect();

        log::info!("{} discoverer: emitted {} targets", self.prefix, targets.len());
        Ok(targets)
    }

    /// Converts one container summary into an `ExternalTarget`.
    fn container_to_target(&self, container: &ContainerSummary) -> ExternalTarget {
        let id_full = container.id.clone().unwrap_or_default();
        let short_id: String = id_full.chars().take(12).collect();

        let name = container
            .names
            .as_ref()
            .and_then(|names| names.first())
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_else(|| short_id.clone());

        let id = format!("{}:{}", self.prefix, short_id);
        let labels = container_labels(container);
        let state = container.state.clone().unwrap_or_default();
        let status = container.status.clone().unwrap_or_default();

        let mut target = ExternalTarget::new(id, name, self.target_type, TargetSource::Discovered)
            .with_labels(labels)
            .with_label(format!("{}.state", self.prefix), state)
            .with_label(format!("{}.status", self.prefix), status);

        if let Some(probe) = self.select_probe(container) {
            target = target.with_probe(probe);
        }

        target
    }

    /// Port 4 of §4.7: first port whose `Type == probeType` and `public > 0`, else the
    /// first port's private port, else unset.
    fn select_probe(&self, container: &ContainerSummary) -> Option<ProbeSpec> {
        let ports = container.ports.as_ref()?;
        if ports.is_empty() {
            return None;
        }

        let preferred = ports.iter().find(|p| {
            p.typ
                .as_ref()
                .map(|t| format!("{t:?}").eq_ignore_ascii_case(&self.probe_port_type))
                .unwrap_or(false)
                && p.public_port.unwrap_or(0) > 0
        });

        if let Some(p) = preferred {
            return Some(ProbeSpec::tcp("127.0.0.1", p.public_port.unwrap_or(0) as u16));
        }

        let first = ports.first()?;
        Some(ProbeSpec::tcp("127.0.0.1", first.private_port))
    }
}

fn container_labels(container: &ContainerSummary) -> HashMap<String, String> {
    container.labels.clone().unwrap_or_default()
}
