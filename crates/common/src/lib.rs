//! Common utilities and types shared across the room counter crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for access tokens (video grants, claims, HS256 signing)
pub mod jwt;
