//! Envelope error types.

use thiserror::Error;

/// Errors from sealing or opening datagram envelopes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Key material is not exactly 32 bytes.
    #[error("bad key: {len} bytes, need exactly 32")]
    BadKey {
        /// Length of the rejected key.
        len: usize,
    },

    /// The datagram could not be authenticated.
    ///
    /// Covers both a datagram too short to hold a nonce and a tag that does
    /// not verify; the receiver drops the datagram either way.
    #[error("envelope authentication failed")]
    Authentication,
}
