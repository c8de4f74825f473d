//! Counter service models.
//!
//! Contains the upstream room record and the HTTP request/response bodies.

use serde::{Deserialize, Serialize};

/// Room as reported by the upstream room service.
///
/// Only the fields this service reads are kept; everything else in the
/// upstream payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Upstream room identifier.
    #[serde(default)]
    pub sid: String,

    /// Unique room name.
    pub name: String,

    /// Opaque metadata string (see `crate::metadata`).
    #[serde(default)]
    pub metadata: String,
}

/// Response body for `POST /create-room`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    /// Generated room name (`Room <id>`).
    pub room_name: String,

    /// Join token for the generated guest identity.
    pub token: String,
}

/// Request body for `POST /counter-increment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterIncrementRequest {
    /// Name of the room whose counter to increment.
    pub room_name: String,
}

impl CounterIncrementRequest {
    /// Validate the request.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.room_name.trim().is_empty() {
            return Err("roomName is required");
        }
        Ok(())
    }
}
