//! One-shot signed requests.
//!
//! For messages that need no session (contact requests, pings) a node sends
//! a single sealed datagram, bypassing the reliable link:
//!
//! ```text
//! kind(1) . peer_pub(32) . self_pub(32) . nonce(24) . sealed{ body }
//! ```
//!
//! The receiver checks the destination key is its own, then opens the body
//! with the embedded sender key. Anyone can see who is talking to whom;
//! only the addressed peer can read the body or verify it is genuine.

use crate::error::SessionError;
use tether_crypto::{Identity, MAC_SIZE, NONCE_SIZE, Nonce, PUBLIC_KEY_SIZE, PairCipher, PublicKey};
use tether_transport::MAX_DATA_SIZE;

const HEADER_LEN: usize = 1 + 2 * PUBLIC_KEY_SIZE + NONCE_SIZE;

/// A validated, decrypted one-shot request.
pub struct Request {
    /// Sender's long-term public key
    pub sender: PublicKey,
    /// Request kind byte chosen by the sender
    pub kind: u8,
    /// Decrypted request body
    pub body: Vec<u8>,
}

/// Build a one-shot request datagram for `peer_pub`.
///
/// # Errors
///
/// Returns [`SessionError::PayloadSize`] if `body` is empty or the sealed
/// packet would exceed the record ceiling, and propagates crypto failures.
pub fn create_request(
    identity: &Identity,
    peer_pub: &PublicKey,
    kind: u8,
    body: &[u8],
) -> Result<Vec<u8>, SessionError> {
    if body.is_empty() || HEADER_LEN + body.len() + MAC_SIZE > MAX_DATA_SIZE {
        return Err(SessionError::PayloadSize { len: body.len() });
    }
    let nonce = Nonce::random()?;
    let cipher = PairCipher::new(peer_pub, identity.secret_key())?;
    let sealed = cipher.seal(&nonce, body)?;

    let mut out = Vec::with_capacity(HEADER_LEN + sealed.len());
    out.push(kind);
    out.extend_from_slice(peer_pub.as_bytes());
    out.extend_from_slice(identity.public_key().as_bytes());
    out.extend_from_slice(nonce.as_bytes());
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Validate and decrypt a request datagram addressed to `identity`.
///
/// # Errors
///
/// Returns [`SessionError::MalformedRequest`] for bad framing or a foreign
/// destination key, and [`SessionError::Crypto`] when the seal does not
/// verify.
pub fn handle_request(identity: &Identity, packet: &[u8]) -> Result<Request, SessionError> {
    if packet.len() <= HEADER_LEN + MAC_SIZE || packet.len() > MAX_DATA_SIZE + MAC_SIZE {
        return Err(SessionError::MalformedRequest);
    }
    if packet[1..1 + PUBLIC_KEY_SIZE] != identity.public_key().as_bytes()[..] {
        return Err(SessionError::MalformedRequest);
    }
    let sender = PublicKey::from_bytes(
        packet[1 + PUBLIC_KEY_SIZE..1 + 2 * PUBLIC_KEY_SIZE]
            .try_into()
            .map_err(|_| SessionError::MalformedRequest)?,
    );
    let nonce = Nonce::from_bytes(
        packet[1 + 2 * PUBLIC_KEY_SIZE..HEADER_LEN]
            .try_into()
            .map_err(|_| SessionError::MalformedRequest)?,
    );

    let cipher = PairCipher::new(&sender, identity.secret_key())?;
    let body = cipher.open(&nonce, &packet[HEADER_LEN..])?;
    Ok(Request {
        sender,
        kind: packet[0],
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_roundtrip() {
        let alice = Identity::generate();
        let bob = Identity::generate();

        let packet = create_request(&alice, bob.public_key(), 1, b"be my contact").unwrap();
        assert_eq!(packet.len(), HEADER_LEN + 13 + MAC_SIZE);
        assert_eq!(packet[0], 1);

        let request = handle_request(&bob, &packet).unwrap();
        assert_eq!(request.sender, *alice.public_key());
        assert_eq!(request.kind, 1);
        assert_eq!(request.body, b"be my contact");
    }

    #[test]
    fn test_request_wrong_recipient_rejected() {
        let alice = Identity::generate();
        let bob = Identity::generate();
        let eve = Identity::generate();

        let packet = create_request(&alice, bob.public_key(), 1, b"hi").unwrap();
        assert!(matches!(
            handle_request(&eve, &packet),
            Err(SessionError::MalformedRequest)
        ));
    }

    #[test]
    fn test_request_tamper_rejected() {
        let alice = Identity::generate();
        let bob = Identity::generate();

        let mut packet = create_request(&alice, bob.public_key(), 1, b"hi").unwrap();
        let last = packet.len() - 1;
        packet[last] ^= 0x01;
        assert!(matches!(
            handle_request(&bob, &packet),
            Err(SessionError::Crypto(_))
        ));
    }

    #[test]
    fn test_request_size_limits() {
        let alice = Identity::generate();
        let bob = Identity::generate();

        assert!(matches!(
            create_request(&alice, bob.public_key(), 1, &[]),
            Err(SessionError::PayloadSize { len: 0 })
        ));

        let too_big = vec![0u8; MAX_DATA_SIZE - HEADER_LEN - MAC_SIZE + 1];
        assert!(create_request(&alice, bob.public_key(), 1, &too_big).is_err());

        let max = vec![0u8; MAX_DATA_SIZE - HEADER_LEN - MAC_SIZE];
        let packet = create_request(&alice, bob.public_key(), 1, &max).unwrap();
        assert_eq!(packet.len(), MAX_DATA_SIZE);
        assert!(handle_request(&bob, &packet).is_ok());
    }

    #[test]
    fn test_request_truncated_rejected() {
        let bob = Identity::generate();
        assert!(handle_request(&bob, &[1u8; 50]).is_err());
    }

    #[test]
    fn test_request_kind_preserved() {
        let alice = Identity::generate();
        let bob = Identity::generate();

        for kind in [1u8, 32, 254] {
            let packet = create_request(&alice, bob.public_key(), kind, b"x").unwrap();
            assert_eq!(handle_request(&bob, &packet).unwrap().kind, kind);
        }
    }
}
