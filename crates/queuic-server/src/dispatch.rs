//! Request dispatch: one decoded frame in, one reply frame out.
//!
//! The dispatcher owns no state. It resolves the queue through the
//! registry, performs exactly one queue operation, and builds the matching
//! acknowledgement. Every error means "send no reply" - the caller logs it
//! and the client interprets the silence.

use queuic_core::{QueueError, QueueRegistry};
use queuic_proto::{Command, Frame, Item, QueueName};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Outcomes that suppress the reply.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Request addressed a queue that is not registered.
    #[error("no such queue: {0}")]
    NoSuchQueue(QueueName),

    /// The command requires an item or identifier the frame did not carry.
    #[error("{command:?} request without an item")]
    MissingItem {
        /// Offending command.
        command: Command,
    },

    /// An acknowledgement command arrived as a request.
    #[error("{0:?} is not a request command")]
    NotARequest(Command),

    /// The queue operation itself failed.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl DispatchError {
    /// Whether this outcome is part of the protocol's silence contract
    /// (peek on an empty queue, accept of an unknown reservation) rather
    /// than a fault worth a warning.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Queue(QueueError::Empty | QueueError::UnknownReservation(_)))
    }
}

/// Map a request to its queue operation and build the reply frame.
///
/// The registry read lock is released before the queue operation runs; only
/// the target queue's own lock serialises the mutation (and its snapshot
/// write), so requests against different queues proceed in parallel.
///
/// # Errors
///
/// All errors mean no reply is sent; see [`DispatchError::is_silent`] for
/// the log level the caller should pick.
pub fn handle_request(registry: &QueueRegistry, request: Frame) -> Result<Frame, DispatchError> {
    let queue =
        registry.lookup(request.queue).ok_or(DispatchError::NoSuchQueue(request.queue))?;

    match request.command {
        Command::Enqueue => {
            let item =
                request.item.ok_or(DispatchError::MissingItem { command: Command::Enqueue })?;
            debug!(queue = %request.queue, id = %item.id, "enqueue");
            queue.enqueue(item)?;
            Ok(Frame::bare(Command::EnqueueAck, request.queue))
        }

        Command::Peek => {
            let item = queue.peek()?;
            debug!(queue = %request.queue, id = %item.id, "peek");
            Ok(Frame::with_item(Command::PeekAck, request.queue, item))
        }

        Command::Accept => {
            let id = required_id(&request, Command::Accept)?;
            debug!(queue = %request.queue, %id, "accept");
            queue.accept(id)?;
            Ok(Frame::bare(Command::AcceptAck, request.queue))
        }

        Command::Release => {
            let id = required_id(&request, Command::Release)?;
            debug!(queue = %request.queue, %id, "release");
            queue.release(id)?;
            Ok(Frame::bare(Command::ReleaseAck, request.queue))
        }

        Command::Size => {
            let size = queue.size() as u64;
            // The wire layout carries an id whenever a payload is present.
            let item = Item { id: Uuid::new_v4(), payload: size.to_le_bytes().to_vec() };
            Ok(Frame::with_item(Command::SizeAck, request.queue, item))
        }

        Command::EnqueueAck
        | Command::PeekAck
        | Command::AcceptAck
        | Command::ReleaseAck
        | Command::SizeAck => Err(DispatchError::NotARequest(request.command)),
    }
}

fn required_id(request: &Frame, command: Command) -> Result<Uuid, DispatchError> {
    request.item.as_ref().map(|item| item.id).ok_or(DispatchError::MissingItem { command })
}
