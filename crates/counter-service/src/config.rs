//! Counter service configuration.
//!
//! Configuration is loaded from environment variables. The upstream API
//! secret is held as a `SecretString` and redacted in Debug output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default upstream room service endpoint.
pub const DEFAULT_LIVEKIT_HOST: &str = "http://localhost:7880";

/// Default API key (local development server).
pub const DEFAULT_API_KEY: &str = "devkey";

/// Default API secret (local development server).
pub const DEFAULT_API_SECRET: &str = "secret";

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8101";

/// Default join token lifetime in seconds.
pub const DEFAULT_JOIN_TOKEN_TTL_SECONDS: u64 = 60;

/// Upper bound for join token lifetime (24 hours).
pub const MAX_JOIN_TOKEN_TTL_SECONDS: u64 = 86_400;

/// Default deadline for a single upstream call in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 5;

/// Upper bound for the upstream call deadline.
pub const MAX_UPSTREAM_TIMEOUT_SECONDS: u64 = 60;

/// Default bound on waiting for a room's lock in milliseconds.
pub const DEFAULT_LOCK_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Counter service configuration.
#[derive(Clone)]
pub struct Config {
    /// Upstream room service endpoint (http, https, ws or wss).
    pub livekit_host: String,

    /// API key used as token issuer.
    pub api_key: String,

    /// API secret used to sign tokens.
    pub api_secret: SecretString,

    /// Server bind address (default: "0.0.0.0:8101").
    pub bind_address: String,

    /// Lifetime of issued join tokens.
    pub join_token_ttl_seconds: u64,

    /// Deadline applied to each upstream call.
    pub upstream_timeout_seconds: u64,

    /// How long an increment may wait for its room's lock before giving up.
    pub lock_wait_timeout_ms: u64,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("livekit_host", &self.livekit_host)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("join_token_ttl_seconds", &self.join_token_ttl_seconds)
            .field("upstream_timeout_seconds", &self.upstream_timeout_seconds)
            .field("lock_wait_timeout_ms", &self.lock_wait_timeout_ms)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid upstream host: {0}")]
    InvalidHost(String),

    #[error("Invalid credentials configuration: {0}")]
    InvalidCredentials(String),

    #[error("Invalid join token TTL configuration: {0}")]
    InvalidTokenTtl(String),

    #[error("Invalid upstream timeout configuration: {0}")]
    InvalidUpstreamTimeout(String),

    #[error("Invalid lock wait timeout configuration: {0}")]
    InvalidLockWaitTimeout(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let livekit_host = vars
            .get("LIVEKIT_HOST")
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_LIVEKIT_HOST.to_string());

        const SCHEMES: [&str; 4] = ["http://", "https://", "ws://", "wss://"];
        if !SCHEMES.iter().any(|scheme| livekit_host.starts_with(scheme)) {
            return Err(ConfigError::InvalidHost(format!(
                "LIVEKIT_HOST must start with http://, https://, ws:// or wss://, got '{}'",
                livekit_host
            )));
        }

        let api_key = vars
            .get("LIVEKIT_API_KEY")
            .cloned()
            .unwrap_or_else(|| DEFAULT_API_KEY.to_string());
        if api_key.is_empty() {
            return Err(ConfigError::InvalidCredentials(
                "LIVEKIT_API_KEY must not be empty".to_string(),
            ));
        }

        let api_secret = vars
            .get("LIVEKIT_API_SECRET")
            .cloned()
            .unwrap_or_else(|| DEFAULT_API_SECRET.to_string());
        if api_secret.is_empty() {
            return Err(ConfigError::InvalidCredentials(
                "LIVEKIT_API_SECRET must not be empty".to_string(),
            ));
        }

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let join_token_ttl_seconds = if let Some(value_str) = vars.get("JOIN_TOKEN_TTL_SECONDS")
        {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidTokenTtl(format!(
                    "JOIN_TOKEN_TTL_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 || value > MAX_JOIN_TOKEN_TTL_SECONDS {
                return Err(ConfigError::InvalidTokenTtl(format!(
                    "JOIN_TOKEN_TTL_SECONDS must be between 1 and {}, got {}",
                    MAX_JOIN_TOKEN_TTL_SECONDS, value
                )));
            }

            value
        } else {
            DEFAULT_JOIN_TOKEN_TTL_SECONDS
        };

        let upstream_timeout_seconds =
            if let Some(value_str) = vars.get("UPSTREAM_TIMEOUT_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidUpstreamTimeout(format!(
                        "UPSTREAM_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 || value > MAX_UPSTREAM_TIMEOUT_SECONDS {
                    return Err(ConfigError::InvalidUpstreamTimeout(format!(
                        "UPSTREAM_TIMEOUT_SECONDS must be between 1 and {}, got {}",
                        MAX_UPSTREAM_TIMEOUT_SECONDS, value
                    )));
                }

                value
            } else {
                DEFAULT_UPSTREAM_TIMEOUT_SECONDS
            };

        let lock_wait_timeout_ms = if let Some(value_str) = vars.get("LOCK_WAIT_TIMEOUT_MS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidLockWaitTimeout(format!(
                    "LOCK_WAIT_TIMEOUT_MS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidLockWaitTimeout(
                    "LOCK_WAIT_TIMEOUT_MS must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_LOCK_WAIT_TIMEOUT_MS
        };

        Ok(Config {
            livekit_host,
            api_key,
            api_secret: SecretString::from(api_secret),
            bind_address,
            join_token_ttl_seconds,
            upstream_timeout_seconds,
            lock_wait_timeout_ms,
        })
    }
}
