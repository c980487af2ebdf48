//! Session hello packets.
//!
//! A hello is the first record a peer sends on a fresh link. It rides the
//! reliable stream as record type 2:
//!
//! ```text
//! 2 . sender_long_pub(32) . nonce(24) . sealed{ secret_nonce(24) . session_pub(32) }
//! ```
//!
//! The sealed body is encrypted from the sender's long-term key to the
//! receiver's long-term key under the fresh plaintext `nonce`, so only the
//! addressed peer learns the announced secret nonce and ephemeral session
//! key, and the sender is authenticated by being able to seal at all.

use crate::error::SessionError;
use tether_crypto::{
    Identity, MAC_SIZE, NONCE_SIZE, Nonce, PUBLIC_KEY_SIZE, PairCipher, PublicKey,
};

/// Record type: one-shot request (only expected on bare datagrams; a stray
/// one on the reliable stream is dropped).
pub const SESSION_REQUEST: u8 = 1;

/// Record type: session hello.
pub const SESSION_HELLO: u8 = 2;

/// Record type: encrypted data record.
pub const SESSION_DATA: u8 = 3;

const SEALED_LEN: usize = NONCE_SIZE + PUBLIC_KEY_SIZE + MAC_SIZE;

/// Exact hello record length: type, sender key, transport nonce, sealed body.
pub const HELLO_LEN: usize = 1 + PUBLIC_KEY_SIZE + NONCE_SIZE + SEALED_LEN;

/// A decrypted session hello.
pub struct SessionHello {
    /// Sender's long-term public key
    pub sender_pub: PublicKey,
    /// Starting nonce the sender will expect our records under
    pub secret_nonce: Nonce,
    /// Sender's ephemeral session public key
    pub session_pub: PublicKey,
}

/// Build a hello record announcing `secret_nonce` and `session_pub` to
/// `peer_pub`.
pub(crate) fn build_hello(
    identity: &Identity,
    peer_pub: &PublicKey,
    secret_nonce: &Nonce,
    session_pub: &PublicKey,
) -> Result<Vec<u8>, SessionError> {
    let transport_nonce = Nonce::random()?;
    let cipher = PairCipher::new(peer_pub, identity.secret_key())?;

    let mut body = [0u8; NONCE_SIZE + PUBLIC_KEY_SIZE];
    body[..NONCE_SIZE].copy_from_slice(secret_nonce.as_bytes());
    body[NONCE_SIZE..].copy_from_slice(session_pub.as_bytes());
    let sealed = cipher.seal(&transport_nonce, &body)?;

    let mut out = Vec::with_capacity(HELLO_LEN);
    out.push(SESSION_HELLO);
    out.extend_from_slice(identity.public_key().as_bytes());
    out.extend_from_slice(transport_nonce.as_bytes());
    out.extend_from_slice(&sealed);
    debug_assert_eq!(out.len(), HELLO_LEN);
    Ok(out)
}

/// Decrypt and validate a hello record addressed to `identity`.
pub(crate) fn parse_hello(identity: &Identity, data: &[u8]) -> Result<SessionHello, SessionError> {
    if data.len() != HELLO_LEN || data[0] != SESSION_HELLO {
        return Err(SessionError::MalformedHello);
    }
    let sender_pub = PublicKey::from_bytes(
        data[1..1 + PUBLIC_KEY_SIZE]
            .try_into()
            .map_err(|_| SessionError::MalformedHello)?,
    );
    let transport_nonce = Nonce::from_bytes(
        data[1 + PUBLIC_KEY_SIZE..1 + PUBLIC_KEY_SIZE + NONCE_SIZE]
            .try_into()
            .map_err(|_| SessionError::MalformedHello)?,
    );

    let cipher = PairCipher::new(&sender_pub, identity.secret_key())?;
    let body = cipher.open(&transport_nonce, &data[1 + PUBLIC_KEY_SIZE + NONCE_SIZE..])?;
    if body.len() != NONCE_SIZE + PUBLIC_KEY_SIZE {
        return Err(SessionError::MalformedHello);
    }

    let secret_nonce = Nonce::from_bytes(
        body[..NONCE_SIZE]
            .try_into()
            .map_err(|_| SessionError::MalformedHello)?,
    );
    let session_pub = PublicKey::from_bytes(
        body[NONCE_SIZE..]
            .try_into()
            .map_err(|_| SessionError::MalformedHello)?,
    );
    Ok(SessionHello {
        sender_pub,
        secret_nonce,
        session_pub,
    })
}
