//! # TETHER Core
//!
//! The session layer of the TETHER protocol: end-to-end authenticated
//! encryption between two peers identified by long-term public keys, riding
//! the reliable link provided by [`tether_transport`].
//!
//! This crate provides:
//! - **Node API**: one [`Node`] value owns the identity, the link endpoint,
//!   the session table and the inbound queue
//! - **Session handshake**: encrypted exchange of ephemeral session keys and
//!   starting nonces over the reliable stream
//! - **Data path**: one AEAD envelope per record, one nonce per envelope
//! - **One-shot requests**: signed-and-sealed datagrams that bypass the
//!   reliable link entirely
//!
//! ## Session establishment
//!
//! ```text
//! initiator                                   responder
//!     |--- hello(long pub, sealed{nonce, spub}) -->|  (via next_inbound /
//!     |<-- hello(long pub, sealed{nonce, spub}) ---|   accept_inbound)
//!     |<-- confirm(sealed zeros) ------------------|
//!     |--- confirm(sealed zeros) ----------------->|
//!     |========= encrypted records both ways ======|
//! ```
//!
//! Each side announces a secret starting nonce inside its hello; the peer
//! encrypts toward it with that nonce incremented once per record. A session
//! is confirmed by the first record: four zero bytes under the new keys.
//!
//! The caller drives everything from a single-threaded loop by calling
//! [`Node::tick`] a few times per second or more.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod error;
pub mod handshake;
pub mod node;
pub mod request;
pub mod session;

pub use error::SessionError;
pub use handshake::{SESSION_DATA, SESSION_HELLO, SESSION_REQUEST};
pub use node::{IncomingRequest, InboundHello, Node, SessionRead};
pub use session::{SessionId, SessionStatus};

/// Session table capacity.
pub const MAX_SESSIONS: usize = 256;

/// Inbound queue capacity: accepted links waiting for a session handshake.
pub const MAX_INCOMING: usize = 64;

/// Link kill delay armed once a session is confirmed. Pushes the transport
/// reaper far enough out that session-level liveness governs from then on.
pub const CONFIRM_KILL_DELAY_SECS: u32 = 3_000;
