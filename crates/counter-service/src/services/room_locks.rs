//! Per-room mutual exclusion.
//!
//! [`RoomLocks`] hands out one async lock per room name so that at most one
//! read-modify-write sequence runs against a room's metadata at a time
//! within this process. Different rooms never share a lock.
//!
//! Entries are created on first use and removed when the last holder or
//! waiter lets go, so the registry only holds rooms with work in flight.
//!
//! # Invariant
//!
//! Every holder or waiter takes its clone of an entry's `Arc` from the map,
//! and gives it back in [`RoomLocks::release`], both with the map locked.
//! The last owner to release therefore observes a strong count of exactly
//! two (the map's and its own) and removes the entry.
//!
//! The clone is owned by a `RoomEntry` before any wait starts, so a
//! waiter that is cancelled mid-wait still gives its clone back.

use crate::observability::metrics::set_room_locks_active;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

type RoomLock = Arc<AsyncMutex<()>>;

/// Registry of per-room locks.
#[derive(Clone, Default)]
pub struct RoomLocks {
    entries: Arc<Mutex<HashMap<String, RoomLock>>>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `room`.
    pub async fn acquire(&self, room: &str) -> RoomLockGuard {
        let entry = self.entry(room);
        let guard = entry.lock().lock_owned().await;
        RoomLockGuard::new(entry, guard)
    }

    /// Wait up to `timeout` for exclusive access to `room`.
    ///
    /// Returns `None` if the lock was not obtained in time.
    pub async fn acquire_timeout(&self, room: &str, timeout: Duration) -> Option<RoomLockGuard> {
        let entry = self.entry(room);

        match tokio::time::timeout(timeout, entry.lock().lock_owned()).await {
            Ok(guard) => Some(RoomLockGuard::new(entry, guard)),
            Err(_) => {
                trace!(target: "cs.services.room_locks", room = %room, "Timed out waiting for room lock");
                None
            }
        }
    }

    /// Number of rooms with a live entry.
    pub fn active_rooms(&self) -> usize {
        self.entries().len()
    }

    fn entry(&self, room: &str) -> RoomEntry {
        let mut entries = self.entries();
        let lock = Arc::clone(entries.entry(room.to_string()).or_default());
        set_room_locks_active(entries.len());

        RoomEntry {
            locks: self.clone(),
            room: room.to_string(),
            lock: Some(lock),
        }
    }

    fn release(&self, room: &str, lock: RoomLock) {
        let mut entries = self.entries();

        let last = Arc::strong_count(&lock) == 2
            && entries
                .get(room)
                .is_some_and(|existing| Arc::ptr_eq(existing, &lock));
        drop(lock);

        if last {
            entries.remove(room);
            set_room_locks_active(entries.len());
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, RoomLock>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One holder's or waiter's reference to a room's entry. Released on drop.
struct RoomEntry {
    locks: RoomLocks,
    room: String,
    lock: Option<RoomLock>,
}

impl RoomEntry {
    /// A clone of the room's lock for `lock_owned`.
    ///
    /// The clone lives only inside the pending wait, and is dropped with it
    /// before this entry is released.
    fn lock(&self) -> RoomLock {
        self.lock.as_ref().map(Arc::clone).unwrap_or_default()
    }
}

impl Drop for RoomEntry {
    fn drop(&mut self) {
        if let Some(lock) = self.lock.take() {
            self.locks.release(&self.room, lock);
        }
    }
}

/// Exclusive access to one room. Released on drop.
pub struct RoomLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    entry: RoomEntry,
}

impl RoomLockGuard {
    fn new(entry: RoomEntry, guard: OwnedMutexGuard<()>) -> Self {
        Self {
            guard: Some(guard),
            entry,
        }
    }

    pub fn room(&self) -> &str {
        &self.entry.room
    }
}

impl Drop for RoomLockGuard {
    fn drop(&mut self) {
        // Unlock before the entry checks whether anyone else still needs it.
        drop(self.guard.take());
    }
}
