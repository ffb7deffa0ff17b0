//! Process-wide queue registry.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use parking_lot::RwLock;
use queuic_proto::QueueName;
use tracing::{info, warn};

use crate::{
    error::{RegistryError, StoreError},
    queue::Queue,
    store::SNAPSHOT_EXT,
};

/// Mapping from queue name to its owning [`Queue`] handle.
///
/// Lookups and stats share a read lock; create, delete and the startup scan
/// take it exclusively. Lookups hand out `Arc` clones, so no caller ever
/// holds the registry lock while taking a queue's own lock.
#[derive(Debug)]
pub struct QueueRegistry {
    data_dir: PathBuf,
    queues: RwLock<HashMap<QueueName, Arc<Queue>>>,
}

/// One row of [`QueueRegistry::stats`].
#[derive(Debug, Clone)]
pub struct QueueStats {
    /// Queue name.
    pub name: QueueName,
    /// Items held (backlog plus reservations).
    pub size: u64,
    /// Enqueues since the queue was opened.
    pub enqueued: u64,
    /// Accepts since the queue was opened.
    pub dequeued: u64,
}

impl QueueRegistry {
    /// Create an empty registry storing snapshots under `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), queues: RwLock::new(HashMap::new()) }
    }

    /// Directory holding the per-queue snapshot files.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Create a queue, together with its snapshot file.
    ///
    /// # Errors
    ///
    /// [`RegistryError::AlreadyExists`] when the name is mapped, or the
    /// queue's own construction error.
    pub fn create(&self, name: QueueName) -> Result<Arc<Queue>, RegistryError> {
        let mut queues = self.queues.write();
        if queues.contains_key(&name) {
            return Err(RegistryError::AlreadyExists(name));
        }

        let queue = Arc::new(Queue::open(&self.data_dir, name)?);
        queues.insert(name, Arc::clone(&queue));
        info!(queue = %name, "queue created");
        Ok(queue)
    }

    /// Delete a queue and remove its snapshot file.
    ///
    /// Recreating the same name afterwards is allowed; the file is gone.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] when the name is not mapped, or the
    /// queue's own deletion error (in which case the mapping stays).
    pub fn delete(&self, name: QueueName) -> Result<(), RegistryError> {
        let mut queues = self.queues.write();
        let queue = queues.get(&name).ok_or(RegistryError::NotFound(name))?;

        queue.delete()?;
        queues.remove(&name);
        info!(queue = %name, "queue deleted");
        Ok(())
    }

    /// Handle for `name`, when mapped.
    #[must_use]
    pub fn lookup(&self, name: QueueName) -> Option<Arc<Queue>> {
        self.queues.read().get(&name).cloned()
    }

    /// Recover every queue with a surviving snapshot file in the data
    /// directory, creating the directory when missing.
    ///
    /// Returns the number of queues loaded. Entries that are not regular
    /// `.queuic` files, or whose stem does not fit a queue name, are
    /// skipped with a warning; an undecodable snapshot aborts the load.
    pub fn load_from_disk(&self) -> Result<usize, RegistryError> {
        fs::create_dir_all(&self.data_dir).map_err(|e| StoreError::Io(e.to_string()))?;

        let mut queues = self.queues.write();
        let mut loaded = 0;

        for entry in fs::read_dir(&self.data_dir).map_err(|e| StoreError::Io(e.to_string()))? {
            let entry = entry.map_err(|e| StoreError::Io(e.to_string()))?;
            let path = entry.path();

            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file || path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXT) {
                warn!(path = %path.display(), "skipping foreign entry in data directory");
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!(path = %path.display(), "skipping snapshot with an unreadable name");
                continue;
            };
            let name = match QueueName::from_str(stem) {
                Ok(name) => name,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping snapshot with an invalid queue name");
                    continue;
                }
            };

            if queues.contains_key(&name) {
                continue;
            }

            let queue = Queue::open(&self.data_dir, name)?;
            queues.insert(name, Arc::new(queue));
            loaded += 1;
        }

        info!(loaded, dir = %self.data_dir.display(), "queues recovered from disk");
        Ok(loaded)
    }

    /// Snapshot of per-queue statistics.
    ///
    /// The registry lock is released before the individual queue locks are
    /// taken, so a slow queue cannot stall creates and deletes.
    #[must_use]
    pub fn stats(&self) -> Vec<QueueStats> {
        let queues: Vec<Arc<Queue>> = self.queues.read().values().cloned().collect();

        queues
            .iter()
            .map(|queue| QueueStats {
                name: queue.name(),
                size: queue.size() as u64,
                enqueued: queue.enqueued(),
                dequeued: queue.dequeued(),
            })
            .collect()
    }
}
