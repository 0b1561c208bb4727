//! The single output shape of every discoverer: [`ExternalTarget`].

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Default probe cadence when a discoverer does not specify one.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);
/// Default per-attempt probe deadline when a discoverer does not specify one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default number of consecutive successful samples required to flip healthy.
pub const DEFAULT_SUCCESS_THRESHOLD: u32 = 1;
/// Default number of consecutive failed samples required to flip unhealthy.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
/// Default expected HTTP status code for an HTTP probe.
pub const DEFAULT_HTTP_EXPECTED_STATUS: u16 = 200;

/// Runtime class a target was discovered from. Lowercased, this is also the `{runtime}:`
/// prefix every `ExternalTarget::id` must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetType {
    Systemd,
    OpenRC,
    BSDRC,
    Docker,
    Podman,
    Kubernetes,
    Nomad,
    Remote,
    Custom,
}

impl TargetType {
    /// The `{runtime}:` id prefix this type uses, e.g. `"docker"`, `"openrc"`.
    pub fn prefix(&self) -> &'static str {
        match self {
            TargetType::Systemd => "systemd",
            TargetType::OpenRC => "openrc",
            TargetType::BSDRC => "bsdrc",
            TargetType::Docker => "docker",
            TargetType::Podman => "podman",
            TargetType::Kubernetes => "kubernetes",
            TargetType::Nomad => "nomad",
            TargetType::Remote => "remote",
            TargetType::Custom => "custom",
        }
    }

    /// Maps a config-supplied type string (as used by `StaticDiscoverer`) to a `TargetType`.
    /// Unknown strings map to `Custom`; `"remote"` and the empty string both map to `Remote`.
    pub fn from_config_str(s: &str) -> TargetType {
        match s {
            "systemd" => TargetType::Systemd,
            "docker" => TargetType::Docker,
            "kubernetes" | "k8s" => TargetType::Kubernetes,
            "nomad" => TargetType::Nomad,
            "remote" | "" => TargetType::Remote,
            _ => TargetType::Custom,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Whether a target came from live enumeration or from static configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetSource {
    Discovered,
    Static,
}

/// An address-and-port pair used by TCP/UDP/ICMP probes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SocketAddrSpec {
    pub address: String,
    pub port: u16,
}

impl SocketAddrSpec {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    pub fn to_socket_string(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// An address-bearing probe specification. The active variant determines `ProbeType`
/// (via [`ProbeSpec::kind`]) instead of storing the type string redundantly alongside the
/// payload, which would otherwise let a `ProbeType` disagree with its own payload.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProbeSpec {
    Tcp(SocketAddrSpec),
    Udp(SocketAddrSpec),
    Http {
        url: String,
        #[serde(default = "default_http_method")]
        method: String,
        #[serde(default = "default_http_expected_status")]
        expected_status: u16,
    },
    Icmp(SocketAddrSpec),
    Exec {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

fn default_http_method() -> String {
    "GET".to_string()
}

fn default_http_expected_status() -> u16 {
    DEFAULT_HTTP_EXPECTED_STATUS
}

impl ProbeSpec {
    /// The spec's `ProbeType` string token for this variant: `tcp`, `udp`, `http`, `icmp`,
    /// or `exec`. `https` is not a distinct variant — it is an `Http` probe whose `url`
    /// begins with `https://`; callers that need the exact wire token can inspect the URL.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeSpec::Tcp(_) => "tcp",
            ProbeSpec::Udp(_) => "udp",
            ProbeSpec::Http { .. } => "http",
            ProbeSpec::Icmp(_) => "icmp",
            ProbeSpec::Exec { .. } => "exec",
        }
    }

    pub fn exec(command: impl Into<String>, args: Vec<String>) -> Self {
        ProbeSpec::Exec {
            command: command.into(),
            args,
        }
    }

    pub fn tcp(address: impl Into<String>, port: u16) -> Self {
        ProbeSpec::Tcp(SocketAddrSpec::new(address, port))
    }
}

/// The uniform record every discoverer emits. `id` is globally unique within one
/// discovery cycle, and whenever a `probe` is present its type-specific payload is fully
/// populated.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExternalTarget {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub target_type: TargetType,
    pub source: TargetSource,
    pub labels: HashMap<String, String>,
    pub probe: Option<ProbeSpec>,
    #[serde(with = "duration_secs")]
    pub interval: Duration,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    pub success_threshold: u32,
    pub failure_threshold: u32,
}

impl ExternalTarget {
    /// Constructs a target pre-filled with the spec's defaults (30s interval, 5s timeout,
    /// success=1, failure=3); callers override only what their runtime knows.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        target_type: TargetType,
        source: TargetSource,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            target_type,
            source,
            labels: HashMap::new(),
            probe: None,
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }

    pub fn with_probe(mut self, probe: ProbeSpec) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.labels.extend(labels);
        self
    }

    /// The spec's `ProbeType` string, or `None` when no probe could be derived.
    pub fn probe_type(&self) -> Option<&'static str> {
        self.probe.as_ref().map(ProbeSpec::kind)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
