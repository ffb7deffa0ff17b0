//! Error types for the wire codec.

use thiserror::Error;

/// Convenience alias for codec results.
pub type Result<T> = std::result::Result<T, FrameError>;

/// Errors produced while decoding or constructing wire frames.
///
/// Every variant is a *malformed frame* from the protocol's point of view:
/// the server logs the datagram and drops it without a reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Buffer is shorter than the fixed 17-byte header.
    #[error("frame too short: {actual} bytes, need at least 17")]
    TooShort {
        /// Length of the rejected buffer.
        actual: usize,
    },

    /// Buffer is long enough to carry an item but bytes 17..33 do not form
    /// a full 16-byte identifier.
    #[error("item id truncated: frame is only {actual} bytes")]
    TruncatedId {
        /// Length of the rejected buffer.
        actual: usize,
    },

    /// First byte does not name a known command.
    #[error("unknown command code {0:#04x}")]
    UnknownCommand(u8),

    /// Queue name does not fit the fixed 16-byte field.
    #[error("queue name too long: {actual} bytes, limit is 16")]
    NameTooLong {
        /// Byte length of the rejected name.
        actual: usize,
    },
}
