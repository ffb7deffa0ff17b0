//! Property-based tests for the datagram envelope.

use proptest::prelude::*;
use queuic_crypto::{EnvelopeError, NONCE_LEN, OVERHEAD, derive_key, open, seal};

#[test]
fn prop_seal_open_roundtrip() {
    proptest!(|(secret in ".{0,32}", plaintext in prop::collection::vec(any::<u8>(), 0..2048))| {
        let key = derive_key(&secret);

        let sealed = seal(&key, &plaintext).expect("seal should succeed");
        let opened = open(&key, &sealed).expect("open should succeed");

        prop_assert_eq!(sealed.len(), plaintext.len() + OVERHEAD);
        prop_assert_eq!(opened, plaintext);
    });
}

#[test]
fn prop_any_bit_flip_fails_authentication() {
    proptest!(|(
        plaintext in prop::collection::vec(any::<u8>(), 1..256),
        flip_bit in 0usize..8,
    )| {
        let key = derive_key("property");
        let mut sealed = seal(&key, &plaintext).expect("seal should succeed");

        // Flip one bit somewhere past the nonce: either ciphertext or tag.
        let index = NONCE_LEN + (plaintext.len() / 2);
        sealed[index] ^= 1 << flip_bit;

        prop_assert_eq!(open(&key, &sealed), Err(EnvelopeError::Authentication));
    });
}

#[test]
fn prop_garbage_never_opens() {
    proptest!(|(garbage in prop::collection::vec(any::<u8>(), 0..128))| {
        let key = derive_key("property");
        prop_assert_eq!(open(&key, &garbage), Err(EnvelopeError::Authentication));
    });
}
