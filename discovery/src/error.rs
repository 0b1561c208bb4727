//! Error kinds for the discovery subsystem.
//!
//! A named variant per failure class a provider can hit, plus a `#[error(transparent)]`
//! escape hatch to `anyhow::Error` for internal plumbing that doesn't need its own variant.

use thiserror::Error;

/// Structural failure returned from [`crate::Discoverer::discover`]. Per-item failures
/// (a single bad container, a single unreachable Nomad allocation detail, a malformed
/// `/proc/net/tcp` line) are never surfaced as a `DiscoveryError` — they are skipped
/// silently at the call site.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Malformed kubeconfig, or missing in-cluster files/env vars.
    #[error("config error: {0}")]
    Config(String),

    /// CA PEM that won't parse, or an unreadable service-account token file.
    #[error("auth error: {0}")]
    Auth(String),

    /// Socket dial / HTTP request failure, or a non-2xx response.
    #[error("network error: {0}")]
    Network(String),

    /// A list/detail payload could not be decoded as JSON.
    #[error("decode error: {0}")]
    Decode(String),

    /// Reserved for a malformed input line. By construction this variant is never
    /// returned by a provider — malformed lines are skipped in place — but it is kept in
    /// the enum so tests can assert the policy by exhaustive match.
    #[error("parse error: {0}")]
    Parse(String),

    /// The calling `DiscoveryContext` was cancelled before or during the call.
    #[error("discovery cancelled")]
    Cancelled,

    /// A subprocess (`systemctl`, `rc-status`, `service`, `rcctl`) failed to run or
    /// exited non-zero when a zero exit was required.
    #[error("tool error: {0}")]
    Tool(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DiscoveryError {
    /// Wraps a lower-level error with an operation label, producing a
    /// `"{operation}: {cause}"` message for structural errors.
    pub fn network(operation: impl AsRef<str>, cause: impl std::fmt::Display) -> Self {
        DiscoveryError::Network(format!("{}: {}", operation.as_ref(), cause))
    }

    pub fn config(operation: impl AsRef<str>, cause: impl std::fmt::Display) -> Self {
        DiscoveryError::Config(format!("{}: {}", operation.as_ref(), cause))
    }

    pub fn tool(operation: impl AsRef<str>, cause: impl std::fmt::Display) -> Self {
        DiscoveryError::Tool(format!("{}: {}", operation.as_ref(), cause))
    }
}
