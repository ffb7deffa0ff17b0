//! Durable backlog snapshots, one file per queue.
//!
//! The snapshot protocol runs after every mutation, under the owning
//! queue's lock: a fully drained queue truncates its file by
//! close-remove-recreate, otherwise the complete delivery order is
//! re-encoded as CBOR and rewritten in place. The engine targets small,
//! bursty queues where rewriting the whole sequence per mutation is
//! acceptable.

use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Seek, Write},
    path::{Path, PathBuf},
};

use queuic_proto::{Item, QueueName};

use crate::error::StoreError;

/// File extension for queue snapshot files.
pub const SNAPSHOT_EXT: &str = "queuic";

/// Snapshot path for a queue name under a data directory.
#[must_use]
pub fn snapshot_path(data_dir: &Path, name: QueueName) -> PathBuf {
    data_dir.join(format!("{name}.{SNAPSHOT_EXT}"))
}

/// Open file handle plus path for one queue's snapshot.
///
/// Callers serialise access externally; the queue holds its `BacklogFile`
/// inside the same mutex as the in-memory state.
#[derive(Debug)]
pub struct BacklogFile {
    path: PathBuf,
    file: File,
}

impl BacklogFile {
    /// Open the snapshot for `name` under `data_dir`, creating the
    /// directory and an empty file when none exists yet.
    ///
    /// Returns the handle and the recovered delivery order. A missing or
    /// empty file recovers to an empty sequence.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] on filesystem failure, [`StoreError::Serialization`]
    /// when an existing snapshot does not decode.
    pub fn open(data_dir: &Path, name: QueueName) -> Result<(Self, Vec<Item>), StoreError> {
        fs::create_dir_all(data_dir).map_err(io_err)?;

        let path = snapshot_path(data_dir, name);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(io_err)?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(io_err)?;

        let items = if bytes.is_empty() {
            Vec::new()
        } else {
            ciborium::from_reader(bytes.as_slice())
                .map_err(|e| StoreError::Serialization(e.to_string()))?
        };

        Ok((Self { path, file }, items))
    }

    /// Rewrite the snapshot with the given delivery order.
    ///
    /// An empty sequence truncates instead, so an idle queue leaves an
    /// empty file behind rather than an empty CBOR array.
    pub fn save(&mut self, items: &[&Item]) -> Result<(), StoreError> {
        if items.is_empty() {
            return self.clear();
        }

        let mut buf = Vec::new();
        ciborium::into_writer(items, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.file.rewind().map_err(io_err)?;
        self.file.write_all(&buf).map_err(io_err)?;
        self.file.set_len(buf.len() as u64).map_err(io_err)?;
        Ok(())
    }

    /// Truncate by close-remove-recreate.
    fn clear(&mut self) -> Result<(), StoreError> {
        fs::remove_file(&self.path).map_err(io_err)?;
        self.file = File::create(&self.path).map_err(io_err)?;
        Ok(())
    }

    /// Remove the snapshot from disk. The handle is unusable afterwards;
    /// callers drop the queue once this returns.
    pub fn remove(&mut self) -> Result<(), StoreError> {
        fs::remove_file(&self.path).map_err(io_err)
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn io_err(err: std::io::Error) -> StoreError {
    StoreError::Io(err.to_string())
}
