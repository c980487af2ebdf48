//! Secure random number generation.
//!
//! All key and nonce randomness comes from the operating system CSPRNG.

use crate::error::CryptoError;

/// Fill a buffer with random bytes from the OS CSPRNG
pub fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    getrandom::getrandom(buf).map_err(|_| CryptoError::RandomFailed)
}
