//! Wire protocol toward the remote engine.
//!
//! Both engine connections carry the same outer framing: multipart frames
//! where part 0 is an ASCII topic tag and part 1 (when present) is the
//! payload. Payloads on the stream channel are compact binary
//! (bincode/serde); command payloads are plain `VERB ARG1 ARG2 ...` text.
//!
//! # Modules
//!
//! - [`frame`]: multipart framing, length-prefixed encode/decode.
//! - [`payload`]: broadcast payload types and the bincode codec.
//! - [`command`]: command text builders (unit conversions applied here).
//! - [`units`]: aviation unit conversions.

pub mod command;
pub mod frame;
pub mod payload;
pub mod units;

pub use frame::{Frame, MAX_PART_LEN};
pub use payload::{AircraftBroadcast, RawAircraft, ScenarioStored, SimulationBroadcast};

use thiserror::Error;

/// Framing or payload codec failure.
///
/// These are per-message errors: the affected frame or broadcast is dropped
/// and logged, the connection itself stays up.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A frame must carry at least the topic part.
    #[error("frame contains no parts")]
    EmptyFrame,

    /// Part length prefix exceeds the allowed maximum.
    #[error("frame part of {len} bytes exceeds maximum {max}")]
    PartTooLarge { len: usize, max: usize },

    /// Frame ended before the announced part count was read.
    #[error("truncated frame: expected {expected} parts, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Binary payload failed to decode.
    #[error("payload decode failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// Binary payload failed to encode.
    #[error("payload encode failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Parallel arrays in an aircraft broadcast disagree on length.
    #[error("aircraft broadcast field `{field}` has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Simulation broadcast carried an unknown run-state code.
    #[error("unknown run-state code {0}")]
    BadRunState(u8),
}
