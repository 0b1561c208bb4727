use super::ContainerRuntimeDiscoverer;
use crate::config::DockerConfig;
use crate::discoverer::{DiscoveryContext, Discoverer};
use crate::error::DiscoveryError;
use crate::target::{ExternalTarget, TargetType};
use async_trait::async_trait;

pub struct DockerDiscoverer {
    inner: ContainerRuntimeDiscoverer,
}

impl DockerDiscoverer {
    pub fn new(config: &DockerConfig) -> Self {
        Self {
            inner: ContainerRuntimeDiscoverer::new(
                "docker",
                TargetType::Docker,
                config.socket_path.clone(),
                config.label_filter.clone(),
                config.probe_port_type.clone(),
            ),
        }
    }
}

#[async_trait]
impl Discoverer for DockerDiscoverer {
    fn kind(&self) -> TargetType {
        TargetType::Docker
    }

    async fn discover(&self, ctx: &DiscoveryContext) -> Result<Vec<ExternalTarget>, DiscoveryError> {
        self.inner.discover(ctx).await
    }
}
