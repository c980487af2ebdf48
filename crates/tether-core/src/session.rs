//! Per-session state.

use tether_crypto::{Nonce, PairCipher, PublicKey, SessionKeypair};
use tether_transport::LinkId;

/// Stable handle to one session table slot.
pub type SessionId = usize;

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Our hello is queued on the link; waiting for the peer's
    HandshakeSent,
    /// Keys agreed; waiting for the peer's zero-record confirmation
    NotConfirmed,
    /// Fully established; encrypted records flow
    Established,
    /// The underlying link died; waiting for the application to kill us
    TimedOut,
}

/// One encrypted session with a peer.
///
/// Holds the peer's long-term key, our fresh ephemeral keypair, the derived
/// record cipher once the peer's session key is known, and the two nonce
/// counters. `link_id` points at the reliable link connection carrying this
/// session; exactly one session owns a link at a time.
pub(crate) struct Session {
    pub peer_pub: PublicKey,
    pub keys: SessionKeypair,
    pub peer_session_pub: Option<PublicKey>,
    pub cipher: Option<PairCipher>,
    /// Nonce the peer encrypts toward us with; advanced on every record we
    /// successfully decrypt, never on failure.
    pub recv_nonce: Nonce,
    /// Nonce we encrypt toward the peer with; advanced on every record we
    /// successfully hand to the link.
    pub sent_nonce: Nonce,
    pub status: SessionStatus,
    pub link_id: LinkId,
}
