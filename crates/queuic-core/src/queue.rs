//! Single-queue engine: visibility state machine plus durability.

use std::{
    collections::{HashMap, VecDeque},
    path::Path,
};

use parking_lot::Mutex;
use queuic_proto::{Item, QueueName};
use tracing::{debug, error};
use uuid::Uuid;

use crate::{error::QueueError, store::BacklogFile};

/// A reserved item: invisible until accepted or released.
#[derive(Debug)]
struct Reservation {
    /// Monotonic per-queue sequence; orders reservations in the snapshot.
    seq: u64,
    item: Item,
}

#[derive(Debug)]
struct QueueState {
    backlog: VecDeque<Item>,
    reserved: HashMap<Uuid, Reservation>,
    next_seq: u64,
    added: u64,
    removed: u64,
    store: BacklogFile,
    inconsistent: bool,
}

/// A named queue: FIFO backlog, reservation table, counters and the durable
/// snapshot file, all guarded by one mutex.
///
/// Every public operation holds the lock for its entire duration, snapshot
/// write included, so operations on one queue are linearisable in
/// lock-acquisition order. An item identifier lives in at most one of the
/// backlog and the reservation table at any instant, and
/// `size() == backlog.len() + reserved.len()` always holds.
#[derive(Debug)]
pub struct Queue {
    name: QueueName,
    state: Mutex<QueueState>,
}

impl Queue {
    /// Open the queue named `name` under `data_dir`.
    ///
    /// An existing snapshot is recovered as the initial backlog, so
    /// reservations that were in flight when the previous process died
    /// rehydrate at the head in their original order. Counters always start
    /// at zero.
    pub fn open(data_dir: &Path, name: QueueName) -> Result<Self, QueueError> {
        let (store, recovered) = BacklogFile::open(data_dir, name)?;
        debug!(queue = %name, recovered = recovered.len(), "queue opened");

        Ok(Self {
            name,
            state: Mutex::new(QueueState {
                backlog: recovered.into(),
                reserved: HashMap::new(),
                next_seq: 0,
                added: 0,
                removed: 0,
                store,
                inconsistent: false,
            }),
        })
    }

    /// Name this queue was created with.
    #[must_use]
    pub fn name(&self) -> QueueName {
        self.name
    }

    /// Append an item to the tail of the backlog.
    pub fn enqueue(&self, item: Item) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        state.backlog.push_back(item);
        state.added += 1;
        self.persist(&mut state)
    }

    /// Reserve the item at the head of the backlog.
    ///
    /// The item moves from the backlog into the reservation table and is
    /// invisible to other consumers until accepted or released.
    ///
    /// # Errors
    ///
    /// [`QueueError::Empty`] when the backlog holds nothing; the
    /// reservation table and counters are untouched in that case.
    pub fn peek(&self) -> Result<Item, QueueError> {
        let mut state = self.state.lock();
        let item = state.backlog.pop_front().ok_or(QueueError::Empty)?;

        let seq = state.next_seq;
        state.next_seq += 1;
        state.reserved.insert(item.id, Reservation { seq, item: item.clone() });

        self.persist(&mut state)?;
        Ok(item)
    }

    /// Commit the removal of a reserved item.
    ///
    /// # Errors
    ///
    /// [`QueueError::UnknownReservation`] when `id` has no outstanding
    /// reservation; nothing is mutated or persisted then.
    pub fn accept(&self, id: Uuid) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        if state.reserved.remove(&id).is_none() {
            return Err(QueueError::UnknownReservation(id));
        }
        state.removed += 1;
        self.persist(&mut state)
    }

    /// Return a reserved item to the head of the backlog, where the next
    /// peek retries it immediately.
    ///
    /// Releasing an identifier with no outstanding reservation is a no-op;
    /// the backlog is not modified.
    pub fn release(&self, id: Uuid) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        let Some(reservation) = state.reserved.remove(&id) else {
            return Ok(());
        };
        state.backlog.push_front(reservation.item);
        self.persist(&mut state)
    }

    /// Items currently held: backlog plus outstanding reservations.
    #[must_use]
    pub fn size(&self) -> usize {
        let state = self.state.lock();
        state.backlog.len() + state.reserved.len()
    }

    /// Successful enqueues since this queue was opened.
    #[must_use]
    pub fn enqueued(&self) -> u64 {
        self.state.lock().added
    }

    /// Successful accepts since this queue was opened.
    #[must_use]
    pub fn dequeued(&self) -> u64 {
        self.state.lock().removed
    }

    /// Whether a snapshot write has failed more recently than it has
    /// succeeded. An inconsistent queue keeps serving from memory; its file
    /// lags reality until a later snapshot goes through.
    #[must_use]
    pub fn is_inconsistent(&self) -> bool {
        self.state.lock().inconsistent
    }

    /// Remove the snapshot file from disk. Callers unmap and drop the queue
    /// once this returns.
    pub fn delete(&self) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        state.store.remove()?;
        Ok(())
    }

    /// Diagnostic view of identifiers on both sides of the visibility
    /// boundary, plus the counters.
    #[must_use]
    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.state.lock();

        let mut reserved: Vec<(u64, Uuid)> =
            state.reserved.values().map(|r| (r.seq, r.item.id)).collect();
        reserved.sort_unstable();

        QueueSnapshot {
            backlog: state.backlog.iter().map(|i| i.id).collect(),
            reserved: reserved.into_iter().map(|(_, id)| id).collect(),
            enqueued: state.added,
            dequeued: state.removed,
        }
    }

    /// Write the durable snapshot: outstanding reservations in peek order,
    /// then the backlog. This is the order a restart recovers, and it equals
    /// the backlog that releasing every reservation would produce.
    fn persist(&self, state: &mut QueueState) -> Result<(), QueueError> {
        let mut reservations: Vec<&Reservation> = state.reserved.values().collect();
        reservations.sort_unstable_by_key(|r| r.seq);

        let items: Vec<&Item> =
            reservations.into_iter().map(|r| &r.item).chain(state.backlog.iter()).collect();

        if let Err(err) = state.store.save(&items) {
            if !state.inconsistent {
                state.inconsistent = true;
                error!(
                    queue = %self.name,
                    error = %err,
                    "snapshot write failed; serving from memory until a write succeeds"
                );
            }
            return Err(QueueError::Store(err));
        }

        state.inconsistent = false;
        Ok(())
    }
}

/// Point-in-time view of a queue's identifiers and counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// Identifiers awaiting delivery, head first.
    pub backlog: Vec<Uuid>,
    /// Identifiers reserved by a peek, oldest reservation first.
    pub reserved: Vec<Uuid>,
    /// Enqueue counter.
    pub enqueued: u64,
    /// Accept counter.
    pub dequeued: u64,
}
