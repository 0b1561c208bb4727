//! `SystemdDiscoverer`: enumerates systemd service units via `systemctl list-unit-files`.
//!
//! Runs `systemctl list-unit-files` through `tokio::process::Command`, the same async
//! subprocess pattern the rest of this crate uses for tool I/O.

#![cfg(any(target_os = "linux", test))]

use crate::config::SystemdConfig;
use crate::discoverer::{DiscoveryContext, Discoverer};
use crate::error::DiscoveryError;
use crate::filtering::matches_any_glob;
use crate::target::{ExternalTarget, ProbeSpec, TargetSource, TargetType};
use async_trait::async_trait;
use tokio::process::Command;

pub struct SystemdDiscoverer {
    patterns: Vec<String>,
    user_scope: bool,
}

impl SystemdDiscoverer {
    pub fn new(config: &SystemdConfig) -> Self {
        Self {
            patterns: config.patterns.clone(),
            user_scope: config.user_scope,
        }
    }

    fn systemctl(&self) -> Command {
        let mut cmd = Command::new("systemctl");
        if self.user_scope {
            cmd.arg("--user");
        }
        cmd
    }

    /// Parses `systemctl list-unit-files --type=service --no-legend` output into unit
    /// names: the first whitespace-delimited column of each non-empty line. Every listed
    /// unit is a candidate (spec.md §4.4 names no enable-state gate); glob filtering
    /// against the configured patterns happens afterward in `discover`.
    fn parse_unit_files(stdout: &str) -> Vec<String> {
        stdout
            .lines()
            .filter_map(|line| line.split_whitespace().next().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Discoverer for SystemdDiscoverer {
    fn kind(&self) -> TargetType {
        TargetType::Systemd
    }

    async fn discover(&self, ctx: &DiscoveryContext) -> Result<Vec<ExternalTarget>, DiscoveryError> {
        log::trace!("systemd discoverer: entering discover");
        ctx.check()?;
        let output = self
            .systemctl()
            .args(["list-unit-files", "--type=service", "--no-pager", "--no-legend"])
            .output()
            .await
            .map_err(|e| {
                log::error!("systemctl list-unit-files failed to run: {e}");
                DiscoveryError::tool("systemctl list-unit-files", e)
            })?;

        if !output.status.success() {
            let err = DiscoveryError::tool(
                "systemctl list-unit-files",
                format!("exit status {}", output.status),
            );
            log::error!("{err}");
            return Err(err);
        }

        ctx.check()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let units = Self::parse_unit_files(&stdout);

        let targets = units
            .into_iter()
            .filter(|name| matches_any_glob(&self.patterns, name))
            .map(|name| {
                let id = format!("systemd:{name}");
                let mut args = vec!["is-active".to_string(), name.clone()];
                if self.user_scope {
                    args.insert(0, "--user".to_string());
                }
                ExternalTarget::new(id, name, TargetType::Systemd, TargetSource::Discovered)
                    .with_probe(ProbeSpec::exec("systemctl", args))
            })
            .collect();

        log::info!("systemd discoverer: emitted {} targets", targets.len());
        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_listed_unit_regardless_of_enable_state() {
        let stdout = "nginx.service enabled\nfoo.service generated\nbar.service static\nbaz.service masked\n";
        let units = SystemdDiscoverer::parse_unit_files(stdout);
        assert_eq!(
            units,
            vec![
                "nginx.service".to_string(),
                "foo.service".to_string(),
                "bar.service".to_string(),
                "baz.service".to_string(),
            ]
        );
    }

    #[test]
    fn parses_empty_output_as_no_units() {
        assert!(SystemdDiscoverer::parse_unit_files("").is_empty());
    }

    #[tokio::test]
    async fn honors_cancellation_before_spawning_systemctl() {
        let ctx = DiscoveryContext::new();
        ctx.cancel();
        let discoverer = SystemdDiscoverer::new(&SystemdConfig::default());
        assert!(matches!(
            discoverer.discover(&ctx).await,
            Err(DiscoveryError::Cancelled)
        ));
    }
}
