//! 24-byte counter nonces.
//!
//! A session uses each nonce exactly once: the starting value is random, and
//! every successful encryption or decryption steps the counter by one. The
//! 24-byte counter is treated as a little-digit-first big integer, byte 0
//! being the least significant.

use crate::NONCE_SIZE;
use crate::error::CryptoError;
use crate::random::fill_random;

/// A 24-byte AEAD nonce with counter semantics.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Generate a random starting nonce from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::RandomFailed`] if the CSPRNG is unavailable.
    pub fn random() -> Result<Self, CryptoError> {
        let mut bytes = [0u8; NONCE_SIZE];
        fill_random(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Import a nonce from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the nonce bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }

    /// Step the counter by one, carrying from byte 0 upward.
    ///
    /// Overflow of the full 24 bytes wraps silently; exhausting a 192-bit
    /// counter within one session is not a reachable condition.
    pub fn increment(&mut self) {
        for byte in &mut self.0 {
            let (next, carry) = byte.overflowing_add(1);
            *byte = next;
            if !carry {
                break;
            }
        }
    }
}

impl std::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Nonce({})", hex::encode(&self.0[..6]))
    }
}
