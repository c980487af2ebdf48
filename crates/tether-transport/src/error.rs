//! Error types for the link layer.

use thiserror::Error;

/// Errors surfaced by [`Endpoint`](crate::Endpoint) operations.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The connection id does not name a live connection
    #[error("no live connection with id {0}")]
    UnknownConnection(usize),

    /// The send window is full; retry after the next acknowledgement
    #[error("send queue full")]
    QueueFull,

    /// Record payload is empty or exceeds the per-record ceiling
    #[error("invalid record payload size: {len}")]
    PayloadSize {
        /// Offending payload length
        len: usize,
    },
}

/// Wire decoding errors. Malformed packets are dropped without state change.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    /// Packet shorter than its fixed header
    #[error("packet too short: {0} bytes")]
    TooShort(usize),

    /// First byte is not a known link packet type
    #[error("unknown packet type: {0}")]
    UnknownType(u8),

    /// Body length does not match the declared type
    #[error("bad packet length: {0}")]
    BadLength(usize),

    /// Data payload exceeds the per-record ceiling
    #[error("oversized data payload: {0} bytes")]
    OversizedPayload(usize),
}
