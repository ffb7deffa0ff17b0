//! Command codes.

/// Operation code carried in the first byte of every frame.
///
/// Values are wire-stable: assigned consecutively from zero, never
/// reordered. Requests use the even codes, their acknowledgements the odd
/// ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Append an item to the tail of a queue.
    Enqueue = 0,
    /// Reply to [`Command::Enqueue`].
    EnqueueAck = 1,
    /// Reserve the item at the head of a queue.
    Peek = 2,
    /// Reply to [`Command::Peek`]; carries the reserved item.
    PeekAck = 3,
    /// Commit removal of a reserved item.
    Accept = 4,
    /// Reply to [`Command::Accept`].
    AcceptAck = 5,
    /// Return a reserved item to the head of its queue.
    Release = 6,
    /// Reply to [`Command::Release`].
    ReleaseAck = 7,
    /// Ask how many items a queue holds.
    Size = 8,
    /// Reply to [`Command::Size`]; payload is the count as little-endian
    /// `u64`.
    SizeAck = 9,
}

impl Command {
    /// Decode a command from its wire byte. `None` if unrecognized.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Enqueue),
            1 => Some(Self::EnqueueAck),
            2 => Some(Self::Peek),
            3 => Some(Self::PeekAck),
            4 => Some(Self::Accept),
            5 => Some(Self::AcceptAck),
            6 => Some(Self::Release),
            7 => Some(Self::ReleaseAck),
            8 => Some(Self::Size),
            9 => Some(Self::SizeAck),
            _ => None,
        }
    }

    /// Wire byte for this command.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Whether this command acknowledges a request rather than making one.
    #[must_use]
    pub fn is_ack(self) -> bool {
        matches!(
            self,
            Self::EnqueueAck | Self::PeekAck | Self::AcceptAck | Self::ReleaseAck | Self::SizeAck
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Command; 10] = [
        Command::Enqueue,
        Command::EnqueueAck,
        Command::Peek,
        Command::PeekAck,
        Command::Accept,
        Command::AcceptAck,
        Command::Release,
        Command::ReleaseAck,
        Command::Size,
        Command::SizeAck,
    ];

    #[test]
    fn wire_values_are_stable() {
        for (expected, command) in ALL.iter().enumerate() {
            assert_eq!(command.to_u8() as usize, expected);
        }
    }

    #[test]
    fn byte_round_trip() {
        for command in ALL {
            assert_eq!(Command::from_u8(command.to_u8()), Some(command));
        }
    }

    #[test]
    fn unknown_codes_rejected() {
        for code in 10..=u8::MAX {
            assert_eq!(Command::from_u8(code), None);
        }
    }

    #[test]
    fn requests_and_acks_alternate() {
        for command in ALL {
            assert_eq!(command.is_ack(), command.to_u8() % 2 == 1);
        }
    }
}
