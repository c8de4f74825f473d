//! # Counter Test Utilities
//!
//! Shared test utilities for the counter service.
//!
//! This crate provides:
//! - Server test harness (`TestCounterServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use counter_service::services::room_directory::mock::InMemoryRoomDirectory;
//! use counter_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestCounterServer::spawn(Arc::new(InMemoryRoomDirectory::new())).await?;
//!
//!     let room_name = server.create_room().await?;
//!     server.increment(&room_name).await?;
//!
//!     assert_eq!(server.directory().counter_of(&room_name), Some(1));
//!     Ok(())
//! }
//! ```

pub mod server_harness;

pub use server_harness::*;
