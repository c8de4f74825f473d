//! Room counter protocol.
//!
//! Incrementing a room's counter is a read-modify-write against the room's
//! metadata:
//!
//! 1. Take the room's lock (bounded wait).
//! 2. Resolve the name to exactly one room.
//! 3. Decode the metadata. Failure aborts without writing.
//! 4. Add one. Overflow aborts without writing.
//! 5. Write the encoded metadata back to the resolved room.
//!
//! The lock is held from step 2 through step 5, so two increments of the
//! same room never interleave and no update is lost. Increments of
//! different rooms proceed in parallel.

use crate::errors::CounterError;
use crate::metadata::RoomMetadata;
use crate::observability::metrics::record_counter_increment;
use crate::services::room_directory::RoomDirectory;
use crate::services::room_locks::RoomLocks;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

pub struct CounterService {
    directory: Arc<dyn RoomDirectory>,
    locks: RoomLocks,
    lock_wait: Duration,
}

impl CounterService {
    pub fn new(directory: Arc<dyn RoomDirectory>, lock_wait: Duration) -> Self {
        Self {
            directory,
            locks: RoomLocks::new(),
            lock_wait,
        }
    }

    /// The lock registry guarding this service's rooms.
    pub fn locks(&self) -> &RoomLocks {
        &self.locks
    }

    /// Increment the counter of `room_name` by one and return the new value.
    ///
    /// # Errors
    ///
    /// - `CounterError::Conflict` - The room lock was not obtained in time
    /// - `CounterError::RoomNotFound` / `AmbiguousRoom` - Name did not resolve to one room
    /// - `CounterError::MetadataCorrupt` - Stored metadata could not be decoded
    /// - `CounterError::CounterOverflow` - Counter is already at its maximum
    /// - `CounterError::Upstream` / `UpstreamTimeout` - The room service call failed
    #[instrument(skip(self), name = "cs.counter.increment", fields(room = %room_name))]
    pub async fn increment(&self, room_name: &str) -> Result<u64, CounterError> {
        let start = Instant::now();
        let result = self.increment_locked(room_name).await;

        match &result {
            Ok(_) => record_counter_increment("success", None, start.elapsed()),
            Err(e) => record_counter_increment("error", Some(e.error_type()), start.elapsed()),
        }

        result
    }

    async fn increment_locked(&self, room_name: &str) -> Result<u64, CounterError> {
        let _guard = self
            .locks
            .acquire_timeout(room_name, self.lock_wait)
            .await
            .ok_or_else(|| {
                warn!(
                    target: "cs.services.counter",
                    room = %room_name,
                    wait_ms = self.lock_wait.as_millis() as u64,
                    "Gave up waiting for room lock"
                );
                CounterError::Conflict(format!(
                    "Room '{room_name}' is busy, try again"
                ))
            })?;

        let room = self.directory.find_room_by_name(room_name).await?;

        let current = RoomMetadata::decode(&room.metadata).map_err(|e| {
            warn!(target: "cs.services.counter", room = %room.name, error = %e, "Room metadata could not be decoded");
            CounterError::MetadataCorrupt(format!("room '{}': {}", room.name, e))
        })?;

        let next = current.incremented().ok_or_else(|| {
            warn!(target: "cs.services.counter", room = %room.name, "Counter is at its maximum");
            CounterError::CounterOverflow(room.name.clone())
        })?;

        info!(
            target: "cs.services.counter",
            room = %room.name,
            from = current.counter,
            to = next.counter,
            "Incrementing counter"
        );

        self.directory
            .update_room_metadata(&room.name, &next.encode())
            .await?;

        Ok(next.counter)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::services::room_directory::mock::InMemoryRoomDirectory;
    use futures::future::join_all;

    fn service(directory: &Arc<InMemoryRoomDirectory>) -> CounterService {
        CounterService::new(
            Arc::clone(directory) as Arc<dyn RoomDirectory>,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_increment_advances_by_one() {
        let directory =
            Arc::new(InMemoryRoomDirectory::new().with_room("Room a", r#"{"counter":4}"#));
        let counter = service(&directory);

        assert_eq!(counter.increment("Room a").await.unwrap(), 5);
        assert_eq!(directory.metadata_of("Room a").unwrap(), r#"{"counter":5}"#);
        assert_eq!(directory.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_sequential_increments() {
        let directory =
            Arc::new(InMemoryRoomDirectory::new().with_room("Room a", r#"{"counter":0}"#));
        let counter = service(&directory);

        for expected in 1..=3 {
            assert_eq!(counter.increment("Room a").await.unwrap(), expected);
        }
        assert_eq!(directory.counter_of("Room a"), Some(3));
    }

    #[tokio::test]
    async fn test_concurrent_increments_lose_nothing_single_thread() {
        let directory =
            Arc::new(InMemoryRoomDirectory::new().with_room("Room a", r#"{"counter":0}"#));
        let counter = service(&directory);

        let results = join_all((0..50).map(|_| counter.increment("Room a"))).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(directory.counter_of("Room a"), Some(50));
        assert_eq!(counter.locks().active_rooms(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_lose_nothing_multi_thread() {
        let directory =
            Arc::new(InMemoryRoomDirectory::new().with_room("Room a", r#"{"counter":10}"#));
        let counter = Arc::new(service(&directory));

        let tasks: Vec<_> = (0..100)
            .map(|_| {
                let counter = Arc::clone(&counter);
                tokio::spawn(async move { counter.increment("Room a").await })
            })
            .collect();

        let mut values: Vec<u64> = Vec::new();
        for task in tasks {
            values.push(task.await.unwrap().unwrap());
        }
        values.sort_unstable();

        // Every increment observed a distinct value.
        assert_eq!(values, (11..=110).collect::<Vec<u64>>());
        assert_eq!(directory.counter_of("Room a"), Some(110));
    }

    #[tokio::test]
    async fn test_rooms_are_independent() {
        let directory = Arc::new(
            InMemoryRoomDirectory::new()
                .with_room("Room a", r#"{"counter":0}"#)
                .with_room("Room b", r#"{"counter":100}"#),
        );
        let counter = service(&directory);

        let a = (0..5).map(|_| counter.increment("Room a"));
        let b = (0..3).map(|_| counter.increment("Room b"));
        join_all(a.chain(b)).await;

        assert_eq!(directory.counter_of("Room a"), Some(5));
        assert_eq!(directory.counter_of("Room b"), Some(103));
    }

    #[tokio::test]
    async fn test_held_lock_does_not_block_other_rooms() {
        let directory = Arc::new(
            InMemoryRoomDirectory::new()
                .with_room("Room a", r#"{"counter":0}"#)
                .with_room("Room b", r#"{"counter":0}"#),
        );
        let counter = service(&directory);

        let _held = counter.locks().acquire("Room a").await;

        let result =
            tokio::time::timeout(Duration::from_secs(1), counter.increment("Room b")).await;
        assert_eq!(result.unwrap().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lock_wait_timeout_is_conflict() {
        let directory =
            Arc::new(InMemoryRoomDirectory::new().with_room("Room a", r#"{"counter":0}"#));
        let counter = CounterService::new(
            Arc::clone(&directory) as Arc<dyn RoomDirectory>,
            Duration::from_millis(20),
        );

        let held = counter.locks().acquire("Room a").await;
        let result = counter.increment("Room a").await;

        assert!(matches!(result, Err(CounterError::Conflict(_))));
        assert_eq!(directory.list_calls(), 0);

        drop(held);
        assert_eq!(counter.increment("Room a").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_room_writes_nothing() {
        let directory = Arc::new(InMemoryRoomDirectory::new());
        let counter = service(&directory);

        let result = counter.increment("Room nope").await;

        assert!(matches!(result, Err(CounterError::RoomNotFound(name)) if name == "Room nope"));
        assert_eq!(directory.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_ambiguous_room_writes_nothing() {
        let directory = Arc::new(
            InMemoryRoomDirectory::new()
                .with_room("Room a", r#"{"counter":1}"#)
                .with_room("Room a", r#"{"counter":2}"#),
        );
        let counter = service(&directory);

        let result = counter.increment("Room a").await;

        assert!(matches!(result, Err(CounterError::AmbiguousRoom { .. })));
        assert_eq!(directory.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_metadata_is_not_overwritten() {
        for raw in ["", "{}", "not json", r#"{"counter":"3"}"#, r#"{"v":2,"counter":3}"#] {
            let directory = Arc::new(InMemoryRoomDirectory::new().with_room("Room a", raw));
            let counter = service(&directory);

            let result = counter.increment("Room a").await;

            assert!(
                matches!(result, Err(CounterError::MetadataCorrupt(_))),
                "{raw:?} should be reported as corrupt"
            );
            assert_eq!(directory.update_calls(), 0);
            assert_eq!(directory.metadata_of("Room a").unwrap(), raw);
        }
    }

    #[tokio::test]
    async fn test_overflow_writes_nothing() {
        let raw = format!(r#"{{"counter":{}}}"#, u64::MAX);
        let directory = Arc::new(InMemoryRoomDirectory::new().with_room("Room a", &raw));
        let counter = service(&directory);

        let result = counter.increment("Room a").await;

        assert!(matches!(result, Err(CounterError::CounterOverflow(_))));
        assert_eq!(directory.update_calls(), 0);
        assert_eq!(directory.metadata_of("Room a").unwrap(), raw);
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let directory =
            Arc::new(InMemoryRoomDirectory::new().with_room("Room a", r#"{"counter":0}"#));
        directory.set_failing(true);
        let counter = service(&directory);

        let result = counter.increment("Room a").await;

        assert!(matches!(result, Err(CounterError::Upstream(_))));
        assert_eq!(counter.locks().active_rooms(), 0);
    }
}
