//! Fixed-width queue identifiers.

use std::{fmt, str::FromStr};

use crate::errors::FrameError;

/// A queue name: exactly 16 bytes on the wire, zero-padded on the right.
///
/// Names are compared byte-wise; two names are equal iff all 16 bytes are
/// equal. Parsing a shorter human-readable name pads it with trailing NULs,
/// which [`fmt::Display`] strips again.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueName([u8; 16]);

impl QueueName {
    /// Width of the name field in every frame.
    pub const LEN: usize = 16;

    /// Wrap a raw, already padded 16-byte name.
    #[must_use]
    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// The padded wire representation.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl FromStr for QueueName {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim_end_matches('\0').as_bytes();
        if raw.len() > Self::LEN {
            return Err(FrameError::NameTooLong { actual: raw.len() });
        }
        let mut name = [0u8; Self::LEN];
        name[..raw.len()].copy_from_slice(raw);
        Ok(Self(name))
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.0.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        write!(f, "{}", String::from_utf8_lossy(&self.0[..end]))
    }
}

impl fmt::Debug for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueueName({self})")
    }
}
