//! `StaticDiscoverer`: turns pre-configured targets straight into [`ExternalTarget`]s.
//!
//! No I/O, no cancellation points worth checking mid-loop — this is the simplest provider
//! in the crate, reading its target list straight out of its config with no external calls.

use crate::config::TargetConfig;
use crate::discoverer::{DiscoveryContext, Discoverer};
use crate::error::DiscoveryError;
use crate::target::{ExternalTarget, ProbeSpec, TargetSource, TargetType};
use async_trait::async_trait;

pub struct StaticDiscoverer {
    targets: Vec<TargetConfig>,
}

impl StaticDiscoverer {
    pub fn new(targets: Vec<TargetConfig>) -> Self {
        Self { targets }
    }

    fn to_external_target(cfg: &TargetConfig) -> ExternalTarget {
        let target_type = TargetType::from_config_str(&cfg.target_type);
        let id = format!("{}:{}", target_type.prefix(), cfg.name);
        let mut target = ExternalTarget::new(id, cfg.name.clone(), target_type, TargetSource::Static)
            .with_labels(cfg.labels.clone());
        if let (Some(address), Some(port)) = (&cfg.address, cfg.port) {
            target = target.with_probe(ProbeSpec::tcp(address.clone(), port));
        }
        target
    }
}

#[async_trait]
impl Discoverer for StaticDiscoverer {
    fn kind(&self) -> TargetType {
        TargetType::Remote
    }

    async fn discover(&self, ctx: &DiscoveryContext) -> Result<Vec<ExternalTarget>, DiscoveryError> {
        log::trace!("static discoverer: entering discover");
        ctx.check()?;
        let targets: Vec<_> = self.targets.iter().map(Self::to_external_target).collect();
        log::info!("static discoverer: emitted {} targets", targets.len());
        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn target_config(name: &str, target_type: &str) -> TargetConfig {
        TargetConfig {
            name: name.to_string(),
            target_type: target_type.to_string(),
            address: Some("10.0.0.5".to_string()),
            port: Some(8080),
            labels: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn emits_one_target_per_config_entry_with_tcp_probe() {
        let discoverer = StaticDiscoverer::new(vec![target_config("db", "remote")]);
        let targets = discoverer.discover(&DiscoveryContext::new()).await.unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].id, "remote:db");
        assert_eq!(targets[0].source, TargetSource::Static);
        assert_eq!(targets[0].probe_type(), Some("tcp"));
    }

    #[tokio::test]
    async fn honors_cancellation_before_any_work() {
        let ctx = DiscoveryContext::new();
        ctx.cancel();
        let discoverer = StaticDiscoverer::new(vec![target_config("db", "remote")]);
        assert!(matches!(
            discoverer.discover(&ctx).await,
            Err(DiscoveryError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn unmapped_type_string_falls_back_to_custom() {
        let discoverer = StaticDiscoverer::new(vec![target_config("widget", "widget-service")]);
        let targets = discoverer.discover(&DiscoveryContext::new()).await.unwrap();
        assert_eq!(targets[0].target_type, TargetType::Custom);
        assert_eq!(targets[0].id, "custom:widget");
    }
}
