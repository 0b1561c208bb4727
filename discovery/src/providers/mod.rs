//! Concrete [`crate::Discoverer`] implementations, one module per runtime class.

pub mod bsdrc;
pub mod docker_podman;
pub mod kubernetes;
pub mod nomad;
pub mod openrc;
pub mod portscan;
pub mod static_target;
pub mod systemd;

pub use docker_podman::{DockerDiscoverer, PodmanDiscoverer};
pub use kubernetes::KubernetesDiscoverer;
pub use nomad::NomadDiscoverer;
pub use static_target::StaticDiscoverer;

#[cfg(any(target_os = "linux", test))]
pub use openrc::OpenRCDiscoverer;
#[cfg(any(target_os = "linux", test))]
pub use portscan::PortScanDiscoverer;
#[cfg(any(target_os = "linux", test))]
pub use systemd::SystemdDiscoverer;

#[cfg(any(target_os = "freebsd", target_os = "openbsd", target_os = "netbsd", test))]
pub use bsdrc::BSDRCDiscoverer;
