//! Engine link: transport, protocol client, and the in-process backend.
//!
//! # Architecture
//!
//! The remote engine speaks over two persistent TCP connections: an event
//! channel (commands out, asynchronous events in) and a stream channel
//! (periodic state broadcasts in). One background task owns both:
//!
//! ```text
//!   engine ──stream──▶ reader task ──┐
//!   engine ──events──▶ reader task ──┤
//!                                    ├──▶ client task ──▶ Arc<RwLock<LinkState>>
//!   controllers ──commands──────────▶┘         │
//!                                              └──▶ broadcast::Sender<LinkUpdate>
//! ```
//!
//! The client task is the only writer of the raw link state; controllers
//! read snapshots through [`EngineHandle`] and wake on [`LinkUpdate`]
//! notifications. Command issuance is serialized through the task's queue,
//! one command in flight at a time, so echo lines are attributed without
//! ambiguity.
//!
//! The engine sends no disconnect notification; the only liveness signal is
//! the broadcast cadence. When the stream goes silent past the staleness
//! threshold the task fails with [`EngineError::ConnectionLost`] and every
//! waiter fails fast.
//!
//! [`LocalEngine`] is the second backend: a deterministic in-process engine
//! behind the same capability traits, used for offline operation and tests.

pub mod client;
pub mod events;
pub mod local;
pub mod transport;

pub use client::{EngineClient, EngineHandle, EngineLink, LinkUpdate, RawSimulation};
pub use events::{EngineEvent, StreamEvent};
pub use local::LocalEngine;

use std::time::Duration;

use thiserror::Error;

use crate::protocol::ProtocolError;

/// Configuration for the engine link.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Engine host name or address.
    pub host: String,
    /// Event channel port (commands out, events in).
    pub event_port: u16,
    /// Stream channel port (broadcasts in).
    pub stream_port: u16,
    /// Bound on each TCP connect and on the wait for the first broadcast.
    pub connect_timeout: Duration,
    /// Client task tick driving echo deadlines and staleness checks.
    pub tick_interval: Duration,
    /// How long after sending a command its echo lines are collected.
    pub echo_window: Duration,
    /// Bound on confirmation waits (step advancement, reset confirmation).
    pub command_timeout: Duration,
    /// Broadcast silence beyond this declares the connection lost.
    pub staleness_threshold: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            event_port: 11000,
            stream_port: 11001,
            connect_timeout: Duration::from_secs(5),
            tick_interval: Duration::from_millis(25),
            echo_window: Duration::from_millis(150),
            command_timeout: Duration::from_secs(5),
            staleness_threshold: Duration::from_secs(3),
        }
    }
}

impl EngineConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_ports(mut self, event_port: u16, stream_port: u16) -> Self {
        self.event_port = event_port;
        self.stream_port = stream_port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_staleness_threshold(mut self, threshold: Duration) -> Self {
        self.staleness_threshold = threshold;
        self
    }
}

/// Errors from the engine link and command confirmation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No connection or no first broadcast within the configured bound.
    #[error("engine did not answer within {0:?}")]
    ConnectTimeout(Duration),

    /// The broadcast stream went silent past the staleness threshold.
    #[error("connection lost: no broadcast for {stale_for:?}")]
    ConnectionLost { stale_for: Duration },

    #[error("engine transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The engine answered a silence-expected command with echo lines,
    /// preserved verbatim.
    #[error("command rejected by engine: {0}")]
    Rejected(String),

    /// A confirmation wait (step advancement, reset, scenario stored) ran
    /// out its bound.
    #[error("command not confirmed within {0:?}")]
    CommandTimeout(Duration),

    /// The client task has exited; no further commands are possible.
    #[error("engine link closed")]
    LinkClosed,

    /// A snapshot was requested before any broadcast arrived.
    #[error("no broadcast data received yet")]
    NoData,
}
