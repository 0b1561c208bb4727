//! `PortScanDiscoverer`: parses `/proc/net/tcp{,6}` for listening sockets.

#![cfg(any(target_os = "linux", test))]

use crate::config::PortScanConfig;
use crate::discoverer::{DiscoveryContext, Discoverer};
use crate::error::DiscoveryError;
use crate::target::{ExternalTarget, ProbeSpec, TargetSource, TargetType};
use async_trait::async_trait;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};

const LISTEN_STATE: &str = "0A";
const DEFAULT_TCP_PATH: &str = "/proc/net/tcp";
const DEFAULT_TCP6_PATH: &str = "/proc/net/tcp6";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ListeningSocket {
    address: IpAddr,
    port: u16,
    protocol: &'static str,
}

pub struct PortScanDiscoverer {
    interfaces: Vec<String>,
    include_ports: HashSet<u16>,
    exclude_ports: HashSet<u16>,
    tcp_path: PathBuf,
    tcp6_path: PathBuf,
}

impl PortScanDiscoverer {
    pub fn new(config: &PortScanConfig) -> Self {
        Self {
            interfaces: config.interfaces.clone(),
            include_ports: config.include_ports.iter().copied().collect(),
            exclude_ports: config.exclude_ports.iter().copied().collect(),
            tcp_path: PathBuf::from(DEFAULT_TCP_PATH),
            tcp6_path: PathBuf::from(DEFAULT_TCP6_PATH),
        }
    }

    /// Same as [`Self::new`] but reading from the given paths instead of the real
    /// `/proc/net/tcp{,6}`, so tests can drive `discover()` end-to-end against a
    /// `tempfile`-backed fixture tree instead of only unit-testing the pure helpers.
    pub fn with_proc_paths(config: &PortScanConfig, tcp_path: impl AsRef<Path>, tcp6_path: impl AsRef<Path>) -> Self {
        Self {
            tcp_path: tcp_path.as_ref().to_path_buf(),
            tcp6_path: tcp6_path.as_ref().to_path_buf(),
            ..Self::new(config)
        }
    }

    /// Decodes one non-header `/proc/net/tcp{,6}` line into a listening socket, or `None`
    /// if the line isn't in `LISTEN` state or fails to parse. A malformed line is skipped
    /// silently and is never treated as a fatal error.
    fn parse_line(line: &str, protocol: &'static str) -> Option<ListeningSocket> {
        let mut fields = line.split_whitespace();
        let _sl = fields.next()?;
        let local_address = fields.next()?;
        let _rem_address = fields.next()?;
        let state = fields.next()?;

        if state != LISTEN_STATE {
            return None;
        }

        let (hex_ip, hex_port) = local_address.split_once(':')?;
        let port = u16::from_str_radix(hex_port, 16).ok()?;
        let address = decode_hex_address(hex_ip)?;

        Some(ListeningSocket {
            address,
            port,
            protocol,
        })
    }

    fn parse_file(contents: &str, protocol: &'static str) -> Vec<ListeningSocket> {
        contents
            .lines()
            .skip(1)
            .filter_map(|line| Self::parse_line(line, protocol))
            .collect()
    }

    fn passes_port_filter(&self, port: u16) -> bool {
        if !self.include_ports.is_empty() {
            return self.include_ports.contains(&port);
        }
        !self.exclude_ports.contains(&port)
    }

    /// Permissive on enumeration failure: if interface addresses can't be listed at all,
    /// every socket passes rather than silently dropping all results.
    fn passes_interface_filter(&self, address: &IpAddr) -> bool {
        if self.interfaces.is_empty() {
            return true;
        }
        let Ok(all) = if_addrs::get_if_addrs() else {
            return true;
        };
        all.iter()
            .filter(|iface| self.interfaces.iter().any(|name| name == &iface.name))
            .any(|iface| &iface.ip() == address)
    }
}

fn decode_hex_address(hex_ip: &str) -> Option<IpAddr> {
    let bytes = hex_decode(hex_ip)?;
    match bytes.len() {
        4 => {
            let mut reversed = [0u8; 4];
            for (i, b) in bytes.iter().rev().enumerate() {
                reversed[i] = *b;
            }
            Some(IpAddr::V4(Ipv4Addr::from(reversed)))
        }
        16 => {
            let mut buf = [0u8; 16];
            buf.copy_from_slice(&bytes);
            Some(IpAddr::V6(Ipv6Addr::from(buf)))
        }
        _ => None,
    }
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

async fn read_proc_net(path: &Path) -> Option<String> {
    tokio::fs::read_to_string(path).await.ok()
}

#[async_trait]
impl Discoverer for PortScanDiscoverer {
    fn kind(&self) -> TargetType {
        TargetType::Custom
    }

    async fn discover(&self, ctx: &DiscoveryContext) -> Result<Vec<ExternalTarget>, DiscoveryError> {
        log::trace!("portscan discoverer: entering discover");
        ctx.check()?;

        let mut sockets = Vec::new();
        if let Some(v4) = read_proc_net(&self.tcp_path).await {
            sockets.extend(Self::parse_file(&v4, "tcp"));
        }
        ctx.check()?;
        // Missing file (no IPv6 support) is not an error.
        if let Some(v6) = read_proc_net(&self.tcp6_path).await {
            sockets.extend(Self::parse_file(&v6, "tcp6"));
        }

        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        for socket in sockets {
            if !seen.insert((socket.address, socket.port)) {
                continue;
            }
            if !self.passes_port_filter(socket.port) {
                continue;
            }
            if !self.passes_interface_filter(&socket.address) {
                continue;
            }

            let id = format!("portscan:{}:{}", socket.address, socket.port);
            let name = format!("{}:{}", socket.protocol, socket.port);
            let target = ExternalTarget::new(id, name, TargetType::Custom, TargetSource::Discovered)
                .with_probe(ProbeSpec::tcp(socket.address.to_string(), socket.port))
                .with_label("portscan.protocol", socket.protocol.to_string())
                .with_label("portscan.port", socket.port.to_string())
                .with_label("portscan.address", socket.address.to_string());
            targets.push(target);
        }

        log::info!("portscan discoverer: emitted {} targets", targets.len());
        Ok(targets)
    }
}
