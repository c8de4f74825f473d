//! Room directory seam.
//!
//! [`RoomDirectory`] is the interface the counter protocol and handlers use
//! to reach the upstream room service. The production implementation is
//! [`RoomServiceClient`]; [`mock::InMemoryRoomDirectory`] backs tests.
//!
//! [`RoomServiceClient`]: crate::services::room_service_client::RoomServiceClient

use crate::errors::CounterError;
use crate::models::Room;

/// Operations on the upstream room directory.
#[async_trait::async_trait]
pub trait RoomDirectory: Send + Sync {
    /// List rooms whose name is exactly `name`.
    async fn list_rooms_by_name(&self, name: &str) -> Result<Vec<Room>, CounterError>;

    /// Create a room with initial metadata.
    async fn create_room(&self, name: &str, metadata: &str) -> Result<Room, CounterError>;

    /// Replace the whole metadata string of room `name`.
    async fn update_room_metadata(&self, name: &str, metadata: &str)
        -> Result<Room, CounterError>;

    /// Resolve `name` to exactly one room.
    ///
    /// # Errors
    ///
    /// - `CounterError::RoomNotFound` - No room has this name
    /// - `CounterError::AmbiguousRoom` - More than one room has this name
    async fn find_room_by_name(&self, name: &str) -> Result<Room, CounterError> {
        let mut rooms = self.list_rooms_by_name(name).await?;

        match rooms.len() {
            0 => Err(CounterError::RoomNotFound(name.to_string())),
            1 => rooms.pop().ok_or(CounterError::Internal),
            matches => {
                tracing::warn!(
                    target: "cs.services.room_directory",
                    room = %name,
                    matches,
                    "Room name resolved to more than one room"
                );
                Err(CounterError::AmbiguousRoom {
                    name: name.to_string(),
                    matches,
                })
            }
        }
    }
}

/// In-memory room directory for tests.
pub mod mock {
    use super::*;
    use crate::metadata::RoomMetadata;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// In-memory room directory.
    ///
    /// Yields to the scheduler inside every call, between reading and
    /// writing, so concurrent callers interleave the way they would against
    /// a remote service.
    #[derive(Default)]
    pub struct InMemoryRoomDirectory {
        rooms: Mutex<Vec<Room>>,
        list_calls: AtomicUsize,
        create_calls: AtomicUsize,
        update_calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl InMemoryRoomDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a room with raw metadata. Duplicate names are allowed.
        pub fn with_room(self, name: &str, metadata: &str) -> Self {
            self.insert_room(name, metadata);
            self
        }

        /// Insert a room with raw metadata. Duplicate names are allowed.
        pub fn insert_room(&self, name: &str, metadata: &str) {
            let mut rooms = self.rooms();
            let sid = format!("RM_{}", rooms.len());
            rooms.push(Room {
                sid,
                name: name.to_string(),
                metadata: metadata.to_string(),
            });
        }

        /// Raw metadata of the first room named `name`.
        pub fn metadata_of(&self, name: &str) -> Option<String> {
            self.rooms()
                .iter()
                .find(|room| room.name == name)
                .map(|room| room.metadata.clone())
        }

        /// Decoded counter of the first room named `name`.
        pub fn counter_of(&self, name: &str) -> Option<u64> {
            self.metadata_of(name)
                .and_then(|raw| RoomMetadata::decode(&raw).ok())
                .map(|metadata| metadata.counter)
        }

        /// Number of rooms held.
        pub fn room_count(&self) -> usize {
            self.rooms().len()
        }

        /// Make every subsequent call fail with `CounterError::Upstream`.
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }

        pub fn create_calls(&self) -> usize {
            self.create_calls.load(Ordering::SeqCst)
        }

        pub fn update_calls(&self) -> usize {
            self.update_calls.load(Ordering::SeqCst)
        }

        fn rooms(&self) -> MutexGuard<'_, Vec<Room>> {
            self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn check_failing(&self, operation: &str) -> Result<(), CounterError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(CounterError::Upstream(format!(
                    "{operation} failed: in-memory directory is failing"
                )));
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl RoomDirectory for InMemoryRoomDirectory {
        async fn list_rooms_by_name(&self, name: &str) -> Result<Vec<Room>, CounterError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.check_failing("ListRooms")?;

            let matches: Vec<Room> = self
                .rooms()
                .iter()
                .filter(|room| room.name == name)
                .cloned()
                .collect();

            tokio::task::yield_now().await;
            Ok(matches)
        }

        async fn create_room(&self, name: &str, metadata: &str) -> Result<Room, CounterError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.check_failing("CreateRoom")?;
            tokio::task::yield_now().await;

            // Creating an existing room returns it unchanged, like the upstream service.
            if let Some(existing) = self.rooms().iter().find(|room| room.name == name) {
                return Ok(existing.clone());
            }

            self.insert_room(name, metadata);
            self.rooms()
                .iter()
                .find(|room| room.name == name)
                .cloned()
                .ok_or(CounterError::Internal)
        }

        async fn update_room_metadata(
            &self,
            name: &str,
            metadata: &str,
        ) -> Result<Room, CounterError> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            self.check_failing("UpdateRoomMetadata")?;
            tokio::task::yield_now().await;

            let mut rooms = self.rooms();
            let room = rooms
                .iter_mut()
                .find(|room| room.name == name)
                .ok_or_else(|| CounterError::RoomNotFound(name.to_string()))?;
            room.metadata = metadata.to_string();
            Ok(room.clone())
        }
    }

}
