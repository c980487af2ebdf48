//! Pair-keyed AEAD.
//!
//! The cipher for a (sender, receiver) pair is derived once: X25519
//! agreement between our secret key and their public key, hashed through
//! BLAKE3 `derive_key` into an `XChaCha20-Poly1305` key. Both directions of
//! a pair share the key; nonce discipline keeps the streams apart.

use crate::error::CryptoError;
use crate::identity::{PublicKey, SecretKey};
use crate::nonce::Nonce;
use chacha20poly1305::{
    XChaCha20Poly1305,
    aead::{Aead, KeyInit},
};

const KDF_CONTEXT: &str = "tether-crypto v1 pair cipher";

/// AEAD cipher bound to one (peer public, local secret) pair.
pub struct PairCipher {
    cipher: XChaCha20Poly1305,
}

impl PairCipher {
    /// Derive the pair cipher from the peer's public key and our secret key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::WeakPublicKey`] if the peer key is a low-order
    /// point.
    pub fn new(peer: &PublicKey, local: &SecretKey) -> Result<Self, CryptoError> {
        let shared = local.exchange(peer).ok_or(CryptoError::WeakPublicKey)?;
        let key = blake3::derive_key(KDF_CONTEXT, &shared);
        Ok(Self {
            cipher: XChaCha20Poly1305::new(&key.into()),
        })
    }

    /// Encrypt `plaintext` under `nonce`.
    ///
    /// Returns ciphertext of `plaintext.len() + 16` bytes (tag appended).
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EncryptionFailed`] on cipher failure.
    pub fn seal(&self, nonce: &Nonce, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.cipher
            .encrypt(nonce.as_bytes().into(), plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)
    }

    /// Decrypt and authenticate `ciphertext` under `nonce`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::DecryptionFailed`] if authentication fails.
    pub fn open(&self, nonce: &Nonce, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.cipher
            .decrypt(nonce.as_bytes().into(), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}
