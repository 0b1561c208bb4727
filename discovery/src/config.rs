//! Discovery configuration types.
//!
//! `DiscoveryConfig` and its per-provider sub-configs are plain `serde`-derived structs,
//! `camelCase` on the wire. This crate only *consumes* an already-populated
//! `DiscoveryConfig` — reading it from a file or CLI flags is someone else's job.

use crate::filtering::FilterList;
use std::collections::HashMap;

/// One statically-configured target, as read from the outer daemon's config file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetConfig {
    pub name: String,
    /// Maps via [`crate::target::TargetType::from_config_str`].
    #[serde(default)]
    pub target_type: String,
    pub address: Option<String>,
    pub port: Option<u16>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticConfig {
    pub enabled: bool,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemdConfig {
    pub enabled: bool,
    /// Shell-glob unit-name patterns; empty accepts every unit.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Run `systemctl --user` instead of the system manager.
    #[serde(default)]
    pub user_scope: bool,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRCConfig {
    pub enabled: bool,
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BSDRCConfig {
    pub enabled: bool,
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerConfig {
    pub enabled: bool,
    /// Defaults to `/var/run/docker.sock`.
    #[serde(default = "default_docker_socket")]
    pub socket_path: String,
    #[serde(default)]
    pub label_filter: HashMap<String, String>,
    /// Port `Type` (`"tcp"` / `"udp"`) preferred when selecting a container's probe port.
    #[serde(default = "default_probe_port_type")]
    pub probe_port_type: String,
}

fn default_docker_socket() -> String {
    "/var/run/docker.sock".to_string()
}

fn default_probe_port_type() -> String {
    "tcp".to_string()
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            socket_path: default_docker_socket(),
            label_filter: HashMap::new(),
            probe_port_type: default_probe_port_type(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodmanConfig {
    pub enabled: bool,
    #[serde(default = "default_podman_socket")]
    pub socket_path: String,
    #[serde(default)]
    pub label_filter: HashMap<String, String>,
    #[serde(default = "default_probe_port_type")]
    pub probe_port_type: String,
}

fn default_podman_socket() -> String {
    "/run/podman/podman.sock".to_string()
}

impl Default for PodmanConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            socket_path: default_podman_socket(),
            label_filter: HashMap::new(),
            probe_port_type: default_probe_port_type(),
        }
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesConfig {
    pub enabled: bool,
    /// Explicit kubeconfig path; falls back to `$HOME/.kube/config`, then in-cluster.
    pub kubeconfig_path: Option<String>,
    /// Empty normalizes to `["default"]`.
    #[serde(default)]
    pub namespaces: Vec<String>,
    pub label_selector: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NomadConfig {
    pub enabled: bool,
    #[serde(default = "default_nomad_addr")]
    pub address: String,
    pub namespace: Option<String>,
    /// Prefix match (not glob) against `JobID`.
    pub job_filter: Option<String>,
}

fn default_nomad_addr() -> String {
    "http://localhost:4646".to_string()
}

impl Default for NomadConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: default_nomad_addr(),
            namespace: None,
            job_filter: None,
        }
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortScanConfig {
    pub enabled: bool,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub include_ports: Vec<u16>,
    #[serde(default)]
    pub exclude_ports: Vec<u16>,
}

/// Top-level discovery configuration: one optional sub-config per provider. A provider
/// is instantiated iff its sub-config is `Some` with `enabled == true` and the platform
/// supports it.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryConfig {
    pub static_targets: Option<StaticConfig>,
    pub systemd: Option<SystemdConfig>,
    pub open_rc: Option<OpenRCConfig>,
    pub bsd_rc: Option<BSDRCConfig>,
    pub docker: Option<DockerConfig>,
    pub podman: Option<PodmanConfig>,
    pub kubernetes: Option<KubernetesConfig>,
    pub nomad: Option<NomadConfig>,
    pub port_scan: Option<PortScanConfig>,
}

/// A filter list anchor re-exported here so config-file authors can reference
/// `discovery::config::FilterList` without reaching into the `filtering` module.
pub type LabelFilterList = FilterList;
