//! Target discovery subsystem.
//!
//! Enumerates monitorable entities across init systems, container runtimes,
//! orchestrators, static configuration, and raw listening TCP ports, producing a
//! uniform stream of [`target::ExternalTarget`] records for a downstream health-probe
//! engine (out of scope here — only the emitted shape is specified).

pub mod config;
pub mod discoverer;
pub mod error;
pub mod event;
pub mod factory;
pub mod filtering;
pub mod target;

pub mod providers;

pub use config::DiscoveryConfig;
pub use discoverer::{DiscoveryContext, Discoverer};
pub use error::DiscoveryError;
pub use factory::Factory;
pub use target::{ExternalTarget, ProbeSpec, SocketAddrSpec, TargetSource, TargetType};
