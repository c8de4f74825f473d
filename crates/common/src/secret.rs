//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. Use these types
//! for the upstream API secret and anything else that must never reach a log
//! line.
//!
//! `SecretString` implements `Debug` with redaction, so any struct that
//! derives `Debug` and holds one gets safe logging behavior for free. The
//! value is zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct UpstreamCredentials {
//!     api_key: String,
//!     api_secret: SecretString,
//! }
//!
//! let creds = UpstreamCredentials {
//!     api_key: "devkey".to_string(),
//!     api_secret: SecretString::from("secret"),
//! };
//!
//! // Safe: api_secret is redacted
//! println!("{:?}", creds);
//!
//! // Signing code opts in explicitly
//! let raw: &str = creds.api_secret.expose_secret();
//! assert_eq!(raw, "secret");
//! ```

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretString};
