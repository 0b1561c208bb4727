use super::ContainerRuntimeDiscoverer;
use crate::config::PodmanConfig;
use crate::discoverer::{DiscoveryContext, Discoverer};
use crate::error::DiscoveryError;
use crate::target::{ExternalTarget, TargetType};
use async_trait::async_trait;

pub struct PodmanDiscoverer {
    inner: ContainerRuntimeDiscoverer,
}

impl PodmanDiscoverer {
    pub fn new(config: &PodmanConfig) -> Self {
        Self {
            inner: ContainerRuntimeDiscoverer::new(
                "podman",
                TargetType::Podman,
                config.socket_path.clone(),
                config.label_filter.clone(),
                config.probe_port_type.clone(),
            ),
        }
    }
}

#[async_trait]
impl Discoverer for PodmanDiscoverer {
    fn kind(&self) -> TargetType {
        TargetType::Podman
    }

    async fn discover(&self, ctx: &DiscoveryContext) -> Result<Vec<ExternalTarget>, DiscoveryError> {
        self.inner.discover(ctx).await
    }
}
