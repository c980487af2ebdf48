//! Node identity and session keypairs.
//!
//! A node carries one long-term X25519 keypair; peers address each other by
//! its public half. Each encrypted session additionally generates a fresh
//! ephemeral keypair so that long-term keys only ever sign session setup,
//! never bulk traffic.

use crate::error::CryptoError;
use crate::{PUBLIC_KEY_SIZE, SECRET_KEY_SIZE};
use rand_core::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// X25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

/// X25519 secret key (32 bytes).
#[derive(Clone, ZeroizeOnDrop, Zeroize)]
pub struct SecretKey(x25519_dalek::StaticSecret);

impl PublicKey {
    /// Import a public key from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.0[..8]))
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl SecretKey {
    /// Generate a new random secret key.
    #[must_use]
    pub fn generate() -> Self {
        Self(x25519_dalek::StaticSecret::random_from_rng(&mut OsRng))
    }

    /// Derive the matching public key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey(*x25519_dalek::PublicKey::from(&self.0).as_bytes())
    }

    /// Perform Diffie-Hellman agreement with a peer public key.
    ///
    /// Returns `None` if the peer key is a low-order point.
    #[must_use]
    pub fn exchange(&self, peer: &PublicKey) -> Option<[u8; 32]> {
        let shared = self
            .0
            .diffie_hellman(&x25519_dalek::PublicKey::from(peer.0));
        if shared.as_bytes() == &[0u8; 32] {
            return None;
        }
        Some(*shared.as_bytes())
    }

    /// Export the raw secret bytes. Handle with care.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_SIZE] {
        self.0.to_bytes()
    }

    /// Import a secret key from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; SECRET_KEY_SIZE]) -> Self {
        Self(x25519_dalek::StaticSecret::from(bytes))
    }
}

/// Long-term node identity: an X25519 keypair.
///
/// The public half is how peers name this node; the secret half keys the
/// session handshake and one-shot signed requests. The only state a node
/// persists across restarts is this pair.
#[derive(Clone)]
pub struct Identity {
    public: PublicKey,
    secret: SecretKey,
}

/// Serialized identity size: `pub(32) . sec(32)`.
pub const IDENTITY_SIZE: usize = PUBLIC_KEY_SIZE + SECRET_KEY_SIZE;

impl Identity {
    /// Generate a fresh random identity.
    ///
    /// Call once on first start; afterwards restore the saved pair with
    /// [`Identity::from_bytes`].
    #[must_use]
    pub fn generate() -> Self {
        let secret = SecretKey::generate();
        let public = secret.public_key();
        Self { public, secret }
    }

    /// The node's long-term public key.
    #[must_use]
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// The node's long-term secret key.
    #[must_use]
    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    /// Serialize as `pub(32) . sec(32)` for persistence.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; IDENTITY_SIZE] {
        let mut out = [0u8; IDENTITY_SIZE];
        out[..PUBLIC_KEY_SIZE].copy_from_slice(self.public.as_bytes());
        out[PUBLIC_KEY_SIZE..].copy_from_slice(&self.secret.to_bytes());
        out
    }

    /// Restore an identity saved with [`Identity::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if `bytes` is not exactly
    /// 64 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != IDENTITY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: IDENTITY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut public = [0u8; PUBLIC_KEY_SIZE];
        public.copy_from_slice(&bytes[..PUBLIC_KEY_SIZE]);
        let mut secret = [0u8; SECRET_KEY_SIZE];
        secret.copy_from_slice(&bytes[PUBLIC_KEY_SIZE..]);
        Ok(Self {
            public: PublicKey::from_bytes(public),
            secret: SecretKey::from_bytes(secret),
        })
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Ephemeral keypair generated fresh for every encrypted session.
#[derive(Clone)]
pub struct SessionKeypair {
    /// Session public key, announced to the peer during the handshake.
    pub public: PublicKey,
    /// Session secret key, never leaves this node.
    pub secret: SecretKey,
}

impl SessionKeypair {
    /// Generate a fresh session keypair.
    #[must_use]
    pub fn generate() -> Self {
        let secret = SecretKey::generate();
        let public = secret.public_key();
        Self { public, secret }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_roundtrip() {
        let identity = Identity::generate();
        let restored = Identity::from_bytes(&identity.to_bytes()).unwrap();

        assert_eq!(identity.public_key(), restored.public_key());
        assert_eq!(
            identity.secret_key().to_bytes(),
            restored.secret_key().to_bytes()
        );
    }

    #[test]
    fn test_identity_bad_length() {
        assert!(matches!(
            Identity::from_bytes(&[0u8; 63]),
            Err(CryptoError::InvalidKeyLength {
                expected: 64,
                actual: 63
            })
        ));
    }

    #[test]
    fn test_identities_unique() {
        let a = Identity::generate();
        let b = Identity::generate();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_exchange_agrees() {
        let a = SecretKey::generate();
        let b = SecretKey::generate();

        let ab = a.exchange(&b.public_key()).unwrap();
        let ba = b.exchange(&a.public_key()).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_exchange_rejects_low_order() {
        let a = SecretKey::generate();
        let zero = PublicKey::from_bytes([0u8; 32]);
        assert!(a.exchange(&zero).is_none());
    }

    #[test]
    fn test_session_keypair_matches() {
        let pair = SessionKeypair::generate();
        assert_eq!(pair.secret.public_key(), pair.public);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let identity = Identity::generate();
        let debug = format!("{identity:?}");
        let secret_hex = hex::encode(identity.secret_key().to_bytes());
        assert!(!debug.contains(&secret_hex));
    }
}
