//! Error types for the session layer.

use thiserror::Error;

/// Errors surfaced by [`Node`](crate::Node) operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// All session slots are occupied
    #[error("session table full")]
    TableFull,

    /// A live session already targets this (key, address) pair
    #[error("session with this peer already exists")]
    DuplicateSession,

    /// The session id does not name a live session
    #[error("no live session with id {0}")]
    UnknownSession(usize),

    /// Operation requires an established session
    #[error("session not established")]
    NotEstablished,

    /// Plaintext record is empty or too large to fit one link record once
    /// sealed and framed
    #[error("invalid record payload size: {len}")]
    PayloadSize {
        /// Offending payload length
        len: usize,
    },

    /// Session hello packet failed structural or cryptographic checks
    #[error("malformed session hello")]
    MalformedHello,

    /// One-shot request packet failed structural checks or is not addressed
    /// to this node
    #[error("malformed request packet")]
    MalformedRequest,

    /// Link-layer failure
    #[error("link error: {0}")]
    Link(#[from] tether_transport::LinkError),

    /// Cryptographic failure
    #[error("crypto error: {0}")]
    Crypto(#[from] tether_crypto::CryptoError),

    /// Socket failure while sending a one-shot request
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
