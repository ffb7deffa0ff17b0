//! Key derivation from the shared secret.

use sha2::{Digest, Sha256};

/// Derive the 32-byte envelope key by hashing the configured secret.
///
/// Deterministic: every process configured with the same secret derives the
/// same key, which is all the peering model requires.
#[must_use]
pub fn derive_key(secret: &str) -> [u8; 32] {
    Sha256::digest(secret.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic() {
        assert_eq!(derive_key("QUEUEIC"), derive_key("QUEUEIC"));
    }

    #[test]
    fn different_secrets_produce_different_keys() {
        assert_ne!(derive_key("a"), derive_key("b"));
    }

    #[test]
    fn known_vector() {
        // First bytes of SHA-256("test").
        let key = derive_key("test");
        assert_eq!(
            key[..4],
            [0x9f, 0x86, 0xd0, 0x81],
            "derivation must stay plain SHA-256 of the secret bytes"
        );
    }
}
