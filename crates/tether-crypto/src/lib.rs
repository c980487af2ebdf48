//! # TETHER Crypto
//!
//! Cryptographic primitives for the TETHER protocol.
//!
//! This crate provides:
//! - Long-term node identity keypairs with flat-byte persistence
//! - Ephemeral per-session keypairs
//! - Pair-keyed AEAD: X25519 agreement hashed into an `XChaCha20-Poly1305` key
//! - 24-byte counter nonces with carry increment
//! - Secure random generation for nonces and keys
//!
//! ## Cryptographic Suite
//!
//! | Function | Algorithm |
//! |----------|-----------|
//! | Key Exchange | X25519 |
//! | AEAD | XChaCha20-Poly1305 |
//! | KDF | BLAKE3 derive_key |
//!
//! Every encrypted message is addressed to exactly one peer: the cipher key
//! is derived from the sender's secret key and the receiver's public key, so
//! possession of either private half authenticates the other end.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod aead;
pub mod error;
pub mod identity;
pub mod nonce;
pub mod random;

pub use aead::PairCipher;
pub use error::CryptoError;
pub use identity::{Identity, PublicKey, SecretKey, SessionKeypair};
pub use nonce::Nonce;

/// X25519 public key size
pub const PUBLIC_KEY_SIZE: usize = 32;

/// X25519 secret key size
pub const SECRET_KEY_SIZE: usize = 32;

/// AEAD nonce size
pub const NONCE_SIZE: usize = 24;

/// AEAD authentication tag size
pub const MAC_SIZE: usize = 16;
