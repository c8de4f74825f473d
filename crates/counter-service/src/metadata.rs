//! Room metadata codec.
//!
//! A room's metadata string is the serialized form of [`RoomMetadata`]:
//!
//! ```json
//! {"counter": 3}
//! ```
//!
//! Decoding is strict. Empty input, non-object JSON, a missing or
//! non-integer `counter`, and schema versions newer than
//! [`METADATA_SCHEMA_VERSION`] are all errors; nothing is defaulted.
//! Unknown fields are ignored so later schema versions can add fields.
//!
//! The optional `"v"` field carries the schema version. Absent means 1.
//! The encoder writes the canonical version-1 form without it.

use serde::Deserialize;
use thiserror::Error;

/// Highest schema version this codec understands.
pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// Errors produced when decoding a metadata string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("metadata is empty")]
    Empty,

    #[error("metadata is malformed: {0}")]
    Malformed(String),

    #[error("metadata schema version {0} is not supported")]
    UnsupportedVersion(u32),
}

/// Structured room metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomMetadata {
    pub counter: u64,
}

#[derive(Deserialize)]
struct WireMetadata {
    #[serde(default)]
    v: Option<u32>,
    counter: u64,
}

impl RoomMetadata {
    pub fn new(counter: u64) -> Self {
        Self { counter }
    }

    /// Returns the metadata with the counter advanced by one, or `None` on overflow.
    pub fn incremented(&self) -> Option<Self> {
        self.counter.checked_add(1).map(Self::new)
    }

    /// Serialize to the canonical metadata string.
    pub fn encode(&self) -> String {
        serde_json::json!({ "counter": self.counter }).to_string()
    }

    /// Parse a metadata string.
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        if raw.trim().is_empty() {
            return Err(DecodeError::Empty);
        }

        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        if !value.is_object() {
            return Err(DecodeError::Malformed(
                "expected a JSON object".to_string(),
            ));
        }

        let wire: WireMetadata =
            serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        match wire.v {
            Some(version) if version == 0 || version > METADATA_SCHEMA_VERSION => {
                Err(DecodeError::UnsupportedVersion(version))
            }
            _ => Ok(Self::new(wire.counter)),
        }
    }
}

/// Shorthand for `RoomMetadata::new(counter).encode()`.
pub fn encode(counter: u64) -> String {
    RoomMetadata::new(counter).encode()
}

/// Shorthand for `RoomMetadata::decode(raw)`.
pub fn decode(raw: &str) -> Result<RoomMetadata, DecodeError> {
    RoomMetadata::decode(raw)
}
