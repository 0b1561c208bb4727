//! `BSDRCDiscoverer`: enumerates rc.d-managed services on FreeBSD, OpenBSD, and NetBSD.
//!
//! Platform dispatch happens both at compile time (`cfg(target_os = ...)`) and at run
//! time inside [`BSDRCDiscoverer::discover`], since the three BSDs share this one type but
//! run different enumeration commands, dispatched on the detected flavor at call time.

#![cfg(any(
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    test
))]

use crate::config::BSDRCConfig;
use crate::discoverer::{DiscoveryContext, Discoverer};
use crate::error::DiscoveryError;
use crate::filtering::matches_any_glob;
use crate::target::{ExternalTarget, ProbeSpec, TargetSource, TargetType};
use async_trait::async_trait;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BsdFlavor {
    FreeBsd,
    OpenBsd,
    NetBsd,
}

impl BsdFlavor {
    fn current() -> Self {
        if cfg!(target_os = "freebsd") {
            BsdFlavor::FreeBsd
        } else if cfg!(target_os = "openbsd") {
            BsdFlavor::OpenBsd
        } else {
            BsdFlavor::NetBsd
        }
    }

    fn label(&self) -> &'static str {
        match self {
            BsdFlavor::FreeBsd => "freebsd",
            BsdFlavor::OpenBsd => "openbsd",
            BsdFlavor::NetBsd => "netbsd",
        }
    }

    fn probe_for(&self, name: &str) -> ProbeSpec {
        match self {
            BsdFlavor::FreeBsd => ProbeSpec::exec("service", vec![name.to_string(), "status".to_string()]),
            BsdFlavor::OpenBsd => ProbeSpec::exec("rcctl", vec!["check".to_string(), name.to_string()]),
            BsdFlavor::NetBsd => ProbeSpec::exec(format!("/etc/rc.d/{name}"), vec!["status".to_string()]),
        }
    }
}

pub struct BSDRCDiscoverer {
    patterns: Vec<String>,
    flavor: BsdFlavor,
}

impl BSDRCDiscoverer {
    pub fn new(config: &BSDRCConfig) -> Self {
        Self {
            patterns: config.patterns.clone(),
            flavor: BsdFlavor::current(),
        }
    }

    async fn list_names(&self) -> Result<Vec<String>, DiscoveryError> {
        match self.flavor {
            BsdFlavor::FreeBsd => {
                let output = Command::new("service")
                    .arg("-l")
                    .output()
                    .await
                    .map_err(|e| DiscoveryError::tool("service -l", e))?;
                if !output.status.success() {
                    return Err(DiscoveryError::tool("service -l", format!("exit status {}", output.status)));
                }
                Ok(lines_of(&output.stdout))
            }
            BsdFlavor::OpenBsd => {
                let output = Command::new("rcctl")
                    .args(["ls", "started"])
                    .output()
                    .await
                    .map_err(|e| DiscoveryError::tool("rcctl ls started", e))?;
                if !output.status.success() {
                    return Err(DiscoveryError::tool(
                        "rcctl ls started",
                        format!("exit status {}", output.status),
                    ));
                }
                Ok(lines_of(&output.stdout))
            }
            BsdFlavor::NetBsd => {
                let mut names = Vec::new();
                let mut entries = tokio::fs::read_dir("/etc/rc.d")
                    .await
                    .map_err(|e| DiscoveryError::tool("read /etc/rc.d", e))?;
                while let Some(entry) = entries
                    .next_entry()
                    .await
                    .map_err(|e| DiscoveryError::tool("read /etc/rc.d", e))?
                {
                    if let Some(name) = entry.file_name().to_str() {
                        names.push(name.to_string());
                    }
                }
                names.sort();
                Ok(names)
            }
        }
    }
}

fn lines_of(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Discoverer for BSDRCDiscoverer {
    fn kind(&self) -> TargetType {
        TargetType::BSDRC
    }

    async fn discover(&self, ctx: &DiscoveryContext) -> Result<Vec<ExternalTarget>, DiscoveryError> {
        log::trace!("bsdrc discoverer: entering discover ({})", self.flavor.label());
        ctx.check()?;
        let names = self.list_names().await.map_err(|e| {
            log::error!("{e}");
            e
        })?;
        ctx.check()?;

        let targets = names
            .into_iter()
            .filter(|name| matches_any_glob(&self.patterns, name))
            .map(|name| {
                let id = format!("bsdrc:{name}");
                ExternalTarget::new(id, name.clone(), TargetType::BSDRC, TargetSource::Discovered)
                    .with_probe(self.flavor.probe_for(&name))
                    .with_label("bsdrc.service", name)
                    .with_label("bsdrc.os", self.flavor.label())
            })
            .collect();

        log::info!("bsdrc discoverer: emitted {} targets", targets.len());
        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freebsd_probe_is_service_status() {
        let probe = BsdFlavor::FreeBsd.probe_for("sshd");
        assert_eq!(probe.kind(), "exec");
    }

    #[test]
    fn lines_of_trims_and_skips_blank_lines() {
        let out = b"sshd\n\ncron\n  \n".to_vec();
        assert_eq!(lines_of(&out), vec!["sshd".to_string(), "cron".to_string()]);
    }

    #[tokio::test]
    async fn honors_cancellation_before_any_enumeration() {
        let ctx = DiscoveryContext::new();
        ctx.cancel();
        let discoverer = BSDRCDiscoverer::new(&BSDRCConfig::default());
        assert!(matches!(
            discoverer.discover(&ctx).await,
            Err(DiscoveryError::Cancelled)
        ));
    }
}
