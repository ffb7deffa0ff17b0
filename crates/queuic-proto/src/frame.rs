//! Frame encoding and decoding.
//!
//! Wire layout (all offsets fixed):
//!
//! ```text
//! offset 0      command     (1 byte)
//! offset 1..17  queue name  (16 bytes, zero-padded)
//! offset 17..33 item id     (16 bytes, iff the frame carries an item)
//! offset 33..   payload     (variable, may be empty)
//! ```
//!
//! A frame without an item ends at offset 17; one carrying an id but no
//! payload ends at offset 33.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Command, QueueName,
    errors::{FrameError, Result},
};

/// Offset of the 16-byte queue name.
const NAME_OFFSET: usize = 1;
/// Offset of the 16-byte item identifier, when present.
const ID_OFFSET: usize = 17;
/// Offset of the payload, when present.
const PAYLOAD_OFFSET: usize = 33;

/// A queued unit of work: identifier plus opaque payload bytes.
///
/// The identifier is opaque to clients except that peek replies echo it so a
/// later accept or release can target the reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// 128-bit identifier, unique for the lifetime of the item.
    pub id: Uuid,
    /// Opaque payload; bounded only by the maximum datagram size.
    pub payload: Vec<u8>,
}

impl Item {
    /// Build an item with a freshly generated identifier.
    #[must_use]
    pub fn new(payload: Vec<u8>) -> Self {
        Self { id: Uuid::new_v4(), payload }
    }

    /// Build an item carrying an identifier and no payload, as accept and
    /// release requests do.
    #[must_use]
    pub fn id_only(id: Uuid) -> Self {
        Self { id, payload: Vec::new() }
    }
}

/// A decoded protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Operation this frame requests or acknowledges.
    pub command: Command,
    /// Target queue.
    pub queue: QueueName,
    /// Identifier and payload, for commands that carry an item.
    pub item: Option<Item>,
}

impl Frame {
    /// Minimum wire length: the command byte plus the queue name.
    pub const MIN_LEN: usize = ID_OFFSET;

    /// Build a frame without an item.
    #[must_use]
    pub fn bare(command: Command, queue: QueueName) -> Self {
        Self { command, queue, item: None }
    }

    /// Build a frame carrying an item.
    #[must_use]
    pub fn with_item(command: Command, queue: QueueName, item: Item) -> Self {
        Self { command, queue, item: Some(item) }
    }

    /// Encode into wire bytes.
    ///
    /// Exactly [`Frame::MIN_LEN`] bytes without an item; otherwise the
    /// identifier and payload follow the header, so an item with an empty
    /// payload encodes to 33 bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let len = match &self.item {
            None => Self::MIN_LEN,
            Some(item) => PAYLOAD_OFFSET + item.payload.len(),
        };
        let mut buf = vec![0u8; len];
        buf[0] = self.command.to_u8();
        buf[NAME_OFFSET..ID_OFFSET].copy_from_slice(self.queue.as_bytes());
        if let Some(item) = &self.item {
            buf[ID_OFFSET..PAYLOAD_OFFSET].copy_from_slice(item.id.as_bytes());
            buf[PAYLOAD_OFFSET..].copy_from_slice(&item.payload);
        }
        buf
    }

    /// Decode a frame from wire bytes.
    ///
    /// Any buffer of at least 17 bytes is accepted; bytes past the header
    /// must begin with a full 16-byte identifier and the remainder (possibly
    /// empty) is the payload.
    ///
    /// # Errors
    ///
    /// - [`FrameError::TooShort`] for buffers under 17 bytes.
    /// - [`FrameError::UnknownCommand`] when the first byte is not a valid
    ///   command code.
    /// - [`FrameError::TruncatedId`] for buffers of 18..=32 bytes, which
    ///   claim an item but cannot hold its identifier.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::MIN_LEN {
            return Err(FrameError::TooShort { actual: bytes.len() });
        }

        let command = Command::from_u8(bytes[0]).ok_or(FrameError::UnknownCommand(bytes[0]))?;

        let mut name = [0u8; QueueName::LEN];
        name.copy_from_slice(&bytes[NAME_OFFSET..ID_OFFSET]);
        let queue = QueueName::from_bytes(name);

        let item = if bytes.len() > Self::MIN_LEN {
            let id_bytes = bytes
                .get(ID_OFFSET..PAYLOAD_OFFSET)
                .ok_or(FrameError::TruncatedId { actual: bytes.len() })?;
            let id = Uuid::from_slice(id_bytes)
                .map_err(|_| FrameError::TruncatedId { actual: bytes.len() })?;
            Some(Item { id, payload: bytes[PAYLOAD_OFFSET..].to_vec() })
        } else {
            None
        };

        Ok(Self { command, queue, item })
    }
}
