//! AEAD envelope sealing and opening.
//!
//! Wire shape of every datagram: `nonce(12) || ciphertext || tag(16)` under
//! AES-256-GCM with empty associated data. Nonces are drawn from the OS RNG
//! for every seal; the same nonce must never be observed twice under one
//! key.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};

use crate::error::EnvelopeError;

/// GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Required symmetric key length in bytes.
pub const KEY_LEN: usize = 32;

/// Fixed per-datagram envelope overhead (nonce plus tag).
pub const OVERHEAD: usize = NONCE_LEN + TAG_LEN;

fn cipher(key: &[u8]) -> Result<Aes256Gcm, EnvelopeError> {
    if key.len() != KEY_LEN {
        return Err(EnvelopeError::BadKey { len: key.len() });
    }
    let Ok(cipher) = Aes256Gcm::new_from_slice(key) else {
        unreachable!("key length checked above");
    };
    Ok(cipher)
}

/// Seal a plaintext frame into an authenticated envelope.
///
/// # Errors
///
/// [`EnvelopeError::BadKey`] when `key` is not exactly 32 bytes.
pub fn seal(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let cipher = cipher(key)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let Ok(ciphertext) = cipher.encrypt(&nonce, plaintext) else {
        unreachable!("AES-GCM encryption cannot fail with valid inputs");
    };

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Open an authenticated envelope, returning the plaintext frame.
///
/// # Errors
///
/// - [`EnvelopeError::BadKey`] when `key` is not exactly 32 bytes.
/// - [`EnvelopeError::Authentication`] when the datagram is shorter than a
///   nonce or its tag does not verify (truncated, tampered, or sealed under
///   a different key).
pub fn open(key: &[u8], sealed: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let cipher = cipher(key)?;

    if sealed.len() < NONCE_LEN {
        return Err(EnvelopeError::Authentication);
    }

    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    cipher.decrypt(Nonce::from_slice(nonce), ciphertext).map_err(|_| EnvelopeError::Authentication)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::derive_key;

    #[test]
    fn seal_open_roundtrip() {
        let key = derive_key("test");
        let sealed = seal(&key, b"hello broker").unwrap();
        assert_eq!(open(&key, &sealed).unwrap(), b"hello broker");
    }

    #[test]
    fn roundtrip_empty_plaintext() {
        let key = derive_key("test");
        let sealed = seal(&key, b"").unwrap();
        assert_eq!(sealed.len(), OVERHEAD);
        assert_eq!(open(&key, &sealed).unwrap(), b"");
    }

    #[test]
    fn sealed_length_is_plaintext_plus_overhead() {
        let key = derive_key("test");
        let sealed = seal(&key, &[0u8; 100]).unwrap();
        assert_eq!(sealed.len(), 100 + OVERHEAD);
    }

    #[test]
    fn nonces_are_fresh_per_seal() {
        let key = derive_key("test");
        let a = seal(&key, b"same message").unwrap();
        let b = seal(&key, b"same message").unwrap();

        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn tampered_datagram_fails_authentication() {
        let key = derive_key("test");
        let mut sealed = seal(&key, b"important payload").unwrap();

        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;

        assert_eq!(open(&key, &sealed), Err(EnvelopeError::Authentication));
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let sealed = seal(&derive_key("one"), b"payload").unwrap();
        assert_eq!(open(&derive_key("two"), &sealed), Err(EnvelopeError::Authentication));
    }

    #[test]
    fn short_datagram_fails_authentication() {
        let key = derive_key("test");
        assert_eq!(open(&key, &[0u8; NONCE_LEN - 1]), Err(EnvelopeError::Authentication));
        assert_eq!(open(&key, &[]), Err(EnvelopeError::Authentication));
    }

    #[test]
    fn bad_key_length_rejected() {
        assert_eq!(seal(&[0u8; 16], b"x"), Err(EnvelopeError::BadKey { len: 16 }));
        assert_eq!(open(&[0u8; 31], &[0u8; 64]), Err(EnvelopeError::BadKey { len: 31 }));
        assert_eq!(seal(&[0u8; 33], b"x"), Err(EnvelopeError::BadKey { len: 33 }));
    }
}
