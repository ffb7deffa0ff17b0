//! Server error types.

use thiserror::Error;

/// Errors that can stop the broker.
///
/// Per-datagram failures never surface here; they are logged and the
/// datagram is dropped. This enum covers startup and transport-level
/// problems that make the server itself unusable.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Socket could not be bound, queried, or served.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// Registry failure during startup recovery.
    #[error(transparent)]
    Registry(#[from] queuic_core::RegistryError),
}
