//! The `Discoverer` capability contract and its cancellation primitive.

use crate::error::DiscoveryError;
use crate::target::{ExternalTarget, TargetType};
use async_trait::async_trait;
use tokio::sync::watch;

/// Cooperative cancellation token passed to every [`Discoverer::discover`] call.
///
/// A `Clone`, `Send + Sync` wrapper around a `tokio::sync::watch` channel. Providers check
/// [`DiscoveryContext::is_cancelled`] before starting I/O and race
/// [`DiscoveryContext::cancelled`] against any suspension point (`tokio::select!`) so that
/// a cancellation lands before any I/O, and between major steps.
#[derive(Clone)]
pub struct DiscoveryContext {
    state: watch::Sender<bool>,
}

impl DiscoveryContext {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self { state }
    }

    /// Marks the context cancelled. Idempotent.
    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once the context has been cancelled. Await this inside `tokio::select!`
    /// alongside any in-flight I/O to abort promptly.
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        if !*rx.borrow_and_update() {
            let _ = rx.changed().await;
        }
    }

    /// Returns `Err(DiscoveryError::Cancelled)` if the context is already cancelled;
    /// otherwise `Ok(())`. Call this at the top of `discover` and between major steps.
    pub fn check(&self) -> Result<(), DiscoveryError> {
        if self.is_cancelled() {
            Err(DiscoveryError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for DiscoveryContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A pluggable provider that enumerates monitorable entities of one runtime class.
///
/// Implementers are unrelated concrete types sharing this one capability. Every suspension
/// point inside `discover` must honor `ctx` cancellation; see [`DiscoveryContext`].
///
/// Partial-failure policy: within one `discover` call, transient per-item errors are
/// swallowed (the item is simply absent from the result); structural failures return
/// `Err` with no partial result.
#[async_trait]
pub trait Discoverer: Send + Sync {
    /// The runtime tag this discoverer reports under. Constant, side-effect-free.
    fn kind(&self) -> TargetType;

    /// Performs one snapshot pass.
    async fn discover(&self, ctx: &DiscoveryContext) -> Result<Vec<ExternalTarget>, DiscoveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_is_observed_immediately_if_already_cancelled() {
        let ctx = DiscoveryContext::new();
        ctx.cancel();
        assert!(ctx.is_cancelled());
        assert!(matches!(ctx.check(), Err(DiscoveryError::Cancelled)));
        tokio::time::timeout(std::time::Duration::from_millis(50), ctx.cancelled())
            .await
            .expect("cancelled() must resolve immediately once already cancelled");
    }

    #[tokio::test]
    async fn cancelled_resolves_after_a_later_cancel() {
        let ctx = DiscoveryContext::new();
        assert!(ctx.check().is_ok());
        let bg = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            bg.cancel();
        });
        tokio::time::timeout(std::time::Duration::from_secs(2), ctx.cancelled())
            .await
            .expect("cancelled() must resolve once cancel() is called");
        assert!(ctx.is_cancelled());
    }
}
