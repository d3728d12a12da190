//! TowerLink - control gateway for remote flight-simulation engines
//!
//! This library maintains a persistent link to a continuously-running
//! simulation engine, reconciles its asynchronous broadcast state into
//! queryable snapshots, and converts its fire-and-forget command protocol
//! into synchronous calls with explicit success, failure, and timeout
//! semantics.
//!
//! # High-Level API
//!
//! Most callers go through the [`gateway`] facade:
//!
//! ```ignore
//! use towerlink::gateway::{Gateway, GatewayConfig};
//!
//! let gateway = Gateway::connect(GatewayConfig::default()).await?;
//!
//! let aircraft = gateway.aircraft().all_properties().await?;
//! gateway.coordinator().step().await?;
//! ```
//!
//! Layering, bottom to top: [`protocol`] (wire framing and payloads),
//! [`engine`] (connection, event classification, raw caches), [`control`]
//! (typed command encoding and confirmation waits), [`proxy`] (reconciled
//! read-through caches), [`coordinator`] (operating modes), [`gateway`]
//! (wiring and shutdown).

pub mod catalog;
pub mod config;
pub mod control;
pub mod coordinator;
pub mod engine;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod protocol;
pub mod proxy;

/// Version of the TowerLink library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
