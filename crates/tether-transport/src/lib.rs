//! # TETHER Transport
//!
//! The reliable link layer of the TETHER protocol: ordered, lossless record
//! delivery over an unreliable datagram service.
//!
//! This crate provides:
//! - **Datagram abstraction**: the [`DatagramLink`] and [`Clock`] traits, a
//!   non-blocking UDP implementation, and an in-memory loopback network for
//!   deterministic tests
//! - **Wire codec**: the three link packet types (handshake, sync, data)
//! - **Connection table**: per-peer sliding-window state with stable ids
//! - **Reliable transfer**: selective retransmission driven by periodic sync
//!   packets, with simple send-rate adjustment
//!
//! ## Protocol sketch
//!
//! ```text
//! initiator                               responder
//!     |--- handshake(id_self, 0) ------------->|   (stateless reply)
//!     |<-- handshake(id_peer, id_self) --------|
//!     |--- sync(recv, sent, requests) -------->|   (allocates entry)
//!     |<-- sync ------------------------------ |
//!     |=== data / sync both ways ==============|
//! ```
//!
//! Each direction carries at most [`WINDOW`] unacknowledged records. Sync
//! packets flow at a few per second in both directions; each one reports the
//! receive cursor (acknowledging everything before it) and the sequence
//! numbers of any holes, which the sender retransmits ahead of new data.
//!
//! The caller owns the event loop: feed inbound datagrams and timers by
//! calling [`Endpoint::poll`] and [`Endpoint::tick`] a few times per second
//! or more.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod connection;
pub mod endpoint;
pub mod error;
pub mod link;
pub mod loopback;
pub mod packet;

pub use connection::LinkStatus;
pub use endpoint::{Endpoint, LinkConfig, LinkId};
pub use error::{LinkError, PacketError};
pub use link::{Clock, DatagramLink, MonotonicClock, PeerAddr, UdpLink};
pub use loopback::{LoopbackLink, LoopbackNetwork, ManualClock};
pub use packet::{LinkPacket, PACKET_DATA, PACKET_HANDSHAKE, PACKET_SYNC};

/// Largest record payload carried by one data packet.
pub const MAX_DATA_SIZE: usize = 1024;

/// Ring buffer slots per direction.
pub const QUEUE_LEN: usize = 16;

/// Usable in-flight records per direction (one slot stays reserved).
pub const WINDOW: usize = QUEUE_LEN - 1;

/// Idle sync packet rate, packets per second.
pub const SYNC_RATE: u16 = 2;

/// Active sync packet rate, packets per second.
pub const MAX_SYNC_RATE: u16 = 10;

/// Initial data packet rate, packets per second.
pub const DATA_SYNC_RATE: u16 = 30;

/// Base connection timeout in seconds; each connection draws its timeout
/// from `[BASE_TIMEOUT_SECS, 2 * BASE_TIMEOUT_SECS)`.
pub const BASE_TIMEOUT_SECS: u8 = 5;

/// Largest datagram the underlying socket contract accepts.
pub const MAX_DATAGRAM_SIZE: usize = 65507;
