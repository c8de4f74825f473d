//! Service layer for the counter service.
//!
//! # Components
//!
//! - `counter` - Lock-protected read-modify-write of a room's counter
//! - `room_directory` - Interface to the upstream room service, plus an in-memory mock
//! - `room_factory` - Room and guest name generation, creation seeds
//! - `room_locks` - Per-room lock registry
//! - `room_service_client` - HTTP client for the upstream room service
//! - `token_issuer` - Join and service token signing

pub mod counter;
pub mod room_directory;
pub mod room_factory;
pub mod room_locks;
pub mod room_service_client;
pub mod token_issuer;

pub use counter::CounterService;
pub use room_directory::RoomDirectory;
pub use room_factory::{GuestIdentity, RoomFactory};
pub use room_locks::{RoomLockGuard, RoomLocks};
pub use room_service_client::RoomServiceClient;
pub use token_issuer::TokenIssuer;
