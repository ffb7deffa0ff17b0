//! Error types for the queue engine and registry.

use queuic_proto::QueueName;
use thiserror::Error;
use uuid::Uuid;

/// Errors from single-queue operations.
#[derive(Error, Debug)]
pub enum QueueError {
    /// Peek on a queue whose backlog is empty.
    #[error("queue is empty")]
    Empty,

    /// Accept for an identifier with no outstanding reservation.
    #[error("no reservation for item {0}")]
    UnknownReservation(Uuid),

    /// The durable snapshot could not be written or read.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from the durable backing file.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("snapshot i/o failed: {0}")]
    Io(String),

    /// Snapshot bytes could not be encoded or decoded.
    #[error("snapshot serialization failed: {0}")]
    Serialization(String),
}

/// Errors from registry-level operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Create for a name that is already mapped.
    #[error("queue {0} already exists")]
    AlreadyExists(QueueName),

    /// Delete for a name that is not mapped.
    #[error("queue {0} not found")]
    NotFound(QueueName),

    /// An underlying queue failed to construct or delete.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// The data directory could not be created or scanned.
    #[error(transparent)]
    Store(#[from] StoreError),
}
