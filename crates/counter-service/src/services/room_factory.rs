//! Room and guest name generation.
//!
//! Generated names carry a CSPRNG-backed UUID so they are unique without
//! coordination:
//!
//! - room names: `Room <id>`
//! - guest identities: `User <id>`
//! - guest display names: `Name <id>`
//!
//! The factory also hands out the creation seed written into each new
//! room's counter. Seeds start at zero and advance once per creation
//! attempt, whether or not the attempt succeeds.

use crate::errors::CounterError;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Identity generated for the guest that receives a new room's join token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestIdentity {
    pub identity: String,
    pub display_name: String,
}

pub struct RoomFactory {
    sequence: AtomicU64,
    rng: SystemRandom,
}

impl Default for RoomFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomFactory {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(seed: u64) -> Self {
        Self {
            sequence: AtomicU64::new(seed),
            rng: SystemRandom::new(),
        }
    }

    /// Take the next creation seed.
    pub fn next_seed(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Generate a new room name.
    ///
    /// # Errors
    ///
    /// Returns `CounterError::Internal` if the system RNG fails.
    pub fn room_name(&self) -> Result<String, CounterError> {
        Ok(format!("Room {}", self.generate_id()?.simple()))
    }

    /// Generate a guest identity and display name.
    ///
    /// # Errors
    ///
    /// Returns `CounterError::Internal` if the system RNG fails.
    pub fn guest(&self) -> Result<GuestIdentity, CounterError> {
        Ok(GuestIdentity {
            identity: format!("User {}", self.generate_id()?.simple()),
            display_name: format!("Name {}", self.generate_id()?.simple()),
        })
    }

    /// Generate a random version 4 UUID from the system CSPRNG.
    fn generate_id(&self) -> Result<Uuid, CounterError> {
        let mut bytes = [0u8; 16];

        self.rng.fill(&mut bytes).map_err(|_| {
            tracing::error!(target: "cs.services.room_factory", "Failed to generate random bytes");
            CounterError::Internal
        })?;

        Ok(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }
}
