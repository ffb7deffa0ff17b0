//! Wire format for the Queuic datagram protocol.
//!
//! Every request and reply is one [`Frame`]: a fixed 17-byte header (command
//! byte plus 16-byte queue name) optionally followed by a 16-byte item
//! identifier and an opaque payload. The fixed header keeps per-packet
//! parsing branch-free and bounds allocation; everything beyond offset 17 is
//! item data.
//!
//! Frames travel inside an authenticated envelope (see `queuic-crypto`);
//! this crate only deals with the plaintext layout.

mod command;
mod errors;
mod frame;
mod name;

pub use command::Command;
pub use errors::{FrameError, Result};
pub use frame::{Frame, Item};
pub use name::QueueName;
