//! Assembles the set of enabled [`Discoverer`]s from a [`DiscoveryConfig`].
//!
//! Each provider is constructed independently and a construction failure is logged and
//! the provider omitted rather than aborting the whole assembly: a bad kubeconfig skips
//! only the Kubernetes provider, everything else still runs.

use crate::config::DiscoveryConfig;
use crate::discoverer::Discoverer;
use crate::providers::{DockerDiscoverer, KubernetesDiscoverer, NomadDiscoverer, PodmanDiscoverer, StaticDiscoverer};

#[cfg(any(target_os = "linux", test))]
use crate::providers::{OpenRCDiscoverer, PortScanDiscoverer, SystemdDiscoverer};

#[cfg(any(target_os = "freebsd", target_os = "openbsd", target_os = "netbsd", test))]
use crate::providers::BSDRCDiscoverer;

pub struct Factory;

impl Factory {
    /// Builds every provider whose sub-config is present, `enabled`, and supported on the
    /// current platform. Ordering is deterministic and fixed: static, systemd, docker,
    /// kubernetes, nomad, podman, openrc, bsdrc, portscan. There is no ordering guarantee
    /// *between* providers' own output, only in which order they are assembled.
    pub fn build(config: &DiscoveryConfig) -> Vec<Box<dyn Discoverer>> {
        let mut discoverers: Vec<Box<dyn Discoverer>> = Vec::new();

        if let Some(cfg) = &config.static_targets {
            if cfg.enabled {
                discoverers.push(Box::new(StaticDiscoverer::new(cfg.targets.clone())));
            }
        }

        #[cfg(target_os = "linux")]
        if let Some(cfg) = &config.systemd {
            if cfg.enabled {
                discoverers.push(Box::new(SystemdDiscoverer::new(cfg)));
            }
        }

        if let Some(cfg) = &config.docker {
            if cfg.enabled {
                discoverers.push(Box::new(DockerDiscoverer::new(cfg)));
            }
        }

        if let Some(cfg) = &config.kubernetes {
            if cfg.enabled {
                match KubernetesDiscoverer::new(cfg) {
                    Ok(discoverer) => discoverers.push(Box::new(discoverer)),
                    Err(e) => log::warn!("skipping kubernetes discoverer: {e}"),
                }
            }
        }

        if let Some(cfg) = &config.nomad {
            if cfg.enabled {
                match NomadDiscoverer::new(cfg) {
                    Ok(discoverer) => discoverers.push(Box::new(discoverer)),
                    Err(e) => log::warn!("skipping nomad discoverer: {e}"),
                }
            }
        }

        if let Some(cfg) = &config.podman {
            if cfg.enabled {
                discoverers.push(Box::new(PodmanDiscoverer::new(cfg)));
            }
        }

        #[cfg(target_os = "linux")]
        if let Some(cfg) = &config.open_rc {
            if cfg.enabled {
                discoverers.push(Box::new(OpenRCDiscoverer::new(cfg)));
            }
        }

        #[cfg(any(target_os = "freebsd", target_os = "openbsd", target_os = "netbsd"))]
        if let Some(cfg) = &config.bsd_rc {
            if cfg.enabled {
                discoverers.push(Box::new(BSDRCDiscoverer::new(cfg)));
            }
        }

        #[cfg(target_os = "linux")]
        if let Some(cfg) = &config.port_scan {
            if cfg.enabled {
                discoverers.push(Box::new(PortScanDiscoverer::new(cfg)));
            }
        }

        discoverers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DockerConfig, StaticConfig};

    #[test]
    fn disabled_providers_are_omitted() {
        let config = DiscoveryConfig {
            static_targets: Some(StaticConfig {
                enabled: false,
                targets: vec![],
            }),
            ..Default::default()
        };
        assert!(Factory::build(&config).is_empty());
    }

    #[test]
    fn absent_sub_config_is_omitted() {
        let config = DiscoveryConfig::default();
        assert!(Factory::build(&config).is_empty());
    }

    #[test]
    fn enabled_static_provider_is_constructed() {
        let config = DiscoveryConfig {
            static_targets: Some(StaticConfig {
                enabled: true,
                targets: vec![],
            }),
            ..Default::default()
        };
        let discoverers = Factory::build(&config);
        assert_eq!(discoverers.len(), 1);
    }

    #[test]
    fn bad_kubernetes_config_is_skipped_without_affecting_other_providers() {
        let config = DiscoveryConfig {
            static_targets: Some(StaticConfig {
                enabled: true,
                targets: vec![],
            }),
            kubernetes: Some(crate::config::KubernetesConfig {
                enabled: true,
                kubeconfig_path: Some("/nonexistent/kubeconfig".to_string()),
                namespaces: vec![],
                label_selector: None,
            }),
            docker: Some(DockerConfig {
                enabled: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let discoverers = Factory::build(&config);
        // static + docker construct fine; kubernetes fails to read its kubeconfig and is skipped.
        assert_eq!(discoverers.len(), 2);
    }
}
