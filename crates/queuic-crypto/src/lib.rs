//! Symmetric envelope crypto for Queuic datagrams.
//!
//! A 32-byte key is derived once at startup by hashing the configured shared
//! secret with SHA-256 ([`derive_key`]). Every datagram in either direction
//! is then sealed as `nonce || ciphertext || tag` with AES-256-GCM
//! ([`seal`] / [`open`]), a fresh random nonce per datagram.
//!
//! There is no handshake and no per-peer state: anyone holding the secret is
//! a legitimate peer, and a datagram that fails to open is dropped.

mod envelope;
mod error;
mod key;

pub use envelope::{KEY_LEN, NONCE_LEN, OVERHEAD, TAG_LEN, open, seal};
pub use error::EnvelopeError;
pub use key::derive_key;
