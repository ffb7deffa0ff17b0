//! Queue engine and registry for the Queuic broker.
//!
//! The engine is deliberately small: a [`Queue`] owns an ordered backlog, a
//! reservation table, two counters and one snapshot file, all behind a
//! single mutex, so every mutation (including its durability step) is
//! serialisable per queue while independent queues run in parallel. The
//! [`QueueRegistry`] maps 16-byte queue names to their owning queues and
//! recovers the whole set from the data directory on startup.
//!
//! Visibility model: an item is *visible* while it sits in the backlog,
//! *invisible* from peek until accept/release, and gone once accepted.
//! Reservations do not survive a restart - they rehydrate at the head of
//! the backlog, which is what gives the broker at-least-once delivery.

mod error;
mod queue;
mod registry;
mod store;

pub use error::{QueueError, RegistryError, StoreError};
pub use queue::{Queue, QueueSnapshot};
pub use registry::{QueueRegistry, QueueStats};
pub use store::{BacklogFile, SNAPSHOT_EXT, snapshot_path};
