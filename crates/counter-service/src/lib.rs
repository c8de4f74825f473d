//! Room Counter Service Library
//!
//! An HTTP façade over an upstream media-room service. It creates rooms,
//! issues join tokens, and keeps a per-room counter inside each room's
//! metadata string.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*.rs -> upstream room service
//! ```
//!
//! Counter increments are serialized per room by `services::room_locks`,
//! so concurrent increments of one room never lose an update.
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `metadata` - Room metadata codec
//! - `middleware` - HTTP metrics middleware
//! - `models` - Upstream room record and request/response bodies
//! - `observability` - Metric definitions
//! - `routes` - Axum router setup
//! - `services` - Room directory, counter protocol, token issuance

pub mod config;
pub mod errors;
pub mod handlers;
pub mod metadata;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
