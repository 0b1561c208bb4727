//! `OpenRCDiscoverer`: enumerates OpenRC services via `rc-status -s`.

#![cfg(any(target_os = "linux", test))]

use crate::config::OpenRCConfig;
use crate::discoverer::{DiscoveryContext, Discoverer};
use crate::error::DiscoveryError;
use crate::filtering::matches_any_glob;
use crate::target::{ExternalTarget, ProbeSpec, TargetSource, TargetType};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

pub struct OpenRCDiscoverer {
    patterns: Vec<String>,
}

impl OpenRCDiscoverer {
    pub fn new(config: &OpenRCConfig) -> Self {
        Self {
            patterns: config.patterns.clone(),
        }
    }

    /// Extracts the service name from one `rc-status -s` line: the substring before the
    /// first whitespace run, e.g. `"sshd [started]"` -> `"sshd"`.
    fn parse_service_name(line: &str) -> Option<&str> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(trimmed.split_whitespace().next().unwrap_or(trimmed))
    }
}

#[async_trait]
impl Discoverer for OpenRCDiscoverer {
    fn kind(&self) -> TargetType {
        TargetType::OpenRC
    }

    async fn discover(&self, ctx: &DiscoveryContext) -> Result<Vec<ExternalTarget>, DiscoveryError> {
        log::trace!("openrc discoverer: entering discover");
        ctx.check()?;

        let mut child = Command::new("rc-status")
            .arg("-s")
            .stdout(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| DiscoveryError::tool("rc-status -s", e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DiscoveryError::tool("rc-status -s", "no stdout pipe"))?;
        let mut lines = BufReader::new(stdout).lines();

        let mut targets = Vec::new();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| DiscoveryError::tool("rc-status -s", e))?
        {
            ctx.check()?;
            let Some(name) = Self::parse_service_name(&line) else {
                continue;
            };
            if !matches_any_glob(&self.patterns, name) {
                continue;
            }
            let id = format!("openrc:{name}");
            targets.push(
                ExternalTarget::new(id, name.to_string(), TargetType::OpenRC, TargetSource::Discovered)
                    .with_probe(ProbeSpec::exec("rc-service", vec![name.to_string(), "status".to_string()]))
                    .with_label("openrc.service", name.to_string()),
            );
        }

        let status = child
            .wait()
            .await
            .map_err(|e| DiscoveryError::tool("rc-status -s", e))?;
        if !status.success() {
            let err = DiscoveryError::tool("rc-status -s", format!("exit status {status}"));
            log::error!("{err}");
            return Err(err);
        }

        log::info!("openrc discoverer: emitted {} targets", targets.len());
        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_before_first_space() {
        assert_eq!(OpenRCDiscoverer::parse_service_name("sshd [started]"), Some("sshd"));
        assert_eq!(OpenRCDiscoverer::parse_service_name("   "), None);
        assert_eq!(OpenRCDiscoverer::parse_service_name(""), None);
    }

    #[tokio::test]
    async fn honors_cancellation_before_spawning_rc_status() {
        let ctx = DiscoveryContext::new();
        ctx.cancel();
        let discoverer = OpenRCDiscoverer::new(&OpenRCConfig::default());
        assert!(matches!(
            discoverer.discover(&ctx).await,
            Err(DiscoveryError::Cancelled)
        ));
    }
}
