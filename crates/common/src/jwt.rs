//! Access tokens for the upstream media-room service.
//!
//! The room service accepts HS256 JWTs signed with the shared API secret and
//! issued by the API key. Capabilities are carried in a `video` grant object.
//! This module provides:
//!
//! - [`VideoGrant`] with constructors for the minimal grant of each use
//! - [`AccessClaims`], the claims body (`iss`, `sub`, `name`, `nbf`, `exp`, `jti`, `video`)
//! - [`sign_access_token`] / [`verify_access_token`]
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing on verification
//! - Only HS256 is accepted
//! - The `sub` field is redacted in Debug output
//! - Join grants never carry room-admin capability; participant metadata
//!   updates (`canUpdateOwnMetadata`) and room metadata updates (`roomAdmin`)
//!   are distinct scopes

use crate::secret::{ExposeSecret, SecretString};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Tokens larger than this are rejected before any base64 decoding or
/// signature work.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Lifetime of the service tokens presented to the room service API.
pub const ADMIN_TOKEN_TTL: Duration = Duration::from_secs(600);

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while signing or verifying access tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtError {
    /// The signing operation failed.
    #[error("Access token signing failed")]
    Signing,

    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Signature, issuer, or timing checks failed.
    #[error("The access token is invalid or expired")]
    Invalid,
}

// =============================================================================
// Claims Types
// =============================================================================

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if passes by reference
fn is_false(value: &bool) -> bool {
    !*value
}

/// Capabilities carried in the `video` claim.
///
/// Serialized in camelCase; unset flags are omitted from the token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    /// May create rooms.
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_create: bool,

    /// May list rooms.
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_list: bool,

    /// May join the room named in `room`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_join: bool,

    /// May administer the room named in `room` (including its metadata).
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_admin: bool,

    /// Room the grant is scoped to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub room: String,

    /// Participant may update its own metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_update_own_metadata: Option<bool>,
}

impl VideoGrant {
    /// Grant for a participant joining `room`.
    #[must_use]
    pub fn join(room: &str) -> Self {
        Self {
            room_join: true,
            room: room.to_string(),
            can_update_own_metadata: Some(true),
            ..Self::default()
        }
    }

    /// Grant for listing rooms.
    #[must_use]
    pub fn list() -> Self {
        Self {
            room_list: true,
            ..Self::default()
        }
    }

    /// Grant for creating rooms.
    #[must_use]
    pub fn create() -> Self {
        Self {
            room_create: true,
            ..Self::default()
        }
    }

    /// Grant for administering a single room.
    #[must_use]
    pub fn admin(room: &str) -> Self {
        Self {
            room_admin: true,
            room: room.to_string(),
            ..Self::default()
        }
    }
}

/// Access token claims.
///
/// The `sub` field carries a participant identity and is redacted in Debug
/// output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Issuer: the API key.
    pub iss: String,

    /// Participant identity (absent on service tokens).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Participant display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Not-before timestamp (Unix epoch seconds).
    pub nbf: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Token identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Capabilities.
    pub video: VideoGrant,
}

impl fmt::Debug for AccessClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessClaims")
            .field("iss", &self.iss)
            .field("sub", &self.sub.as_ref().map(|_| "[REDACTED]"))
            .field("name", &self.name)
            .field("nbf", &self.nbf)
            .field("exp", &self.exp)
            .field("video", &self.video)
            .finish_non_exhaustive()
    }
}

impl AccessClaims {
    /// Creates claims valid from `now` for `ttl`.
    #[must_use]
    pub fn new(api_key: &str, video: VideoGrant, ttl: Duration, now: i64) -> Self {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            iss: api_key.to_string(),
            sub: None,
            name: None,
            nbf: now,
            exp: now.saturating_add(ttl_secs),
            jti: None,
            video,
        }
    }

    /// Binds the token to a participant identity (also used as `jti`).
    #[must_use]
    pub fn with_identity(mut self, identity: &str) -> Self {
        self.sub = Some(identity.to_string());
        self.jti = Some(identity.to_string());
        self
    }

    /// Sets the participant display name.
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Sign claims with the API secret (HS256).
///
/// # Errors
///
/// Returns `JwtError::Signing` if the encoder fails.
pub fn sign_access_token(claims: &AccessClaims, secret: &SecretString) -> Result<String, JwtError> {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());

    let encoding_key = EncodingKey::from_secret(secret.expose_secret().as_bytes());

    encode(&header, claims, &encoding_key).map_err(|e| {
        tracing::error!(target: "common.jwt", error = %e, "Access token signing failed");
        JwtError::Signing
    })
}

/// Verify a token against the API key and secret and return its claims.
///
/// Checks size, HS256 signature, issuer, `exp` and `nbf` (60 s leeway).
///
/// # Errors
///
/// - `JwtError::TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `JwtError::Invalid` - Any other verification failure
pub fn verify_access_token(
    token: &str,
    api_key: &str,
    secret: &SecretString,
) -> Result<AccessClaims, JwtError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtError::TokenTooLarge);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[api_key]);
    validation.set_required_spec_claims(&["exp", "iss"]);
    validation.validate_nbf = true;

    let decoding_key = DecodingKey::from_secret(secret.expose_secret().as_bytes());

    decode::<AccessClaims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(target: "common.jwt", error = %e, "Token verification failed");
            JwtError::Invalid
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("test-secret")
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[test]
    fn test_join_grant_serializes_camel_case_and_omits_unset_flags() {
        let json = serde_json::to_value(VideoGrant::join("Room abc")).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "roomJoin": true,
                "room": "Room abc",
                "canUpdateOwnMetadata": true
            })
        );
    }

    #[test]
    fn test_join_grant_never_carries_admin() {
        let grant = VideoGrant::join("Room abc");
        assert!(!grant.room_admin);
        assert!(!grant.room_create);
        assert!(!grant.room_list);
    }

    #[test]
    fn test_admin_grant_is_scoped_to_room() {
        let grant = VideoGrant::admin("Room abc");
        assert!(grant.room_admin);
        assert_eq!(grant.room, "Room abc");
        assert!(!grant.room_join);
        assert_eq!(grant.can_update_own_metadata, None);
    }

    #[test]
    fn test_sign_and_verify_join_token() {
        let claims = AccessClaims::new(
            "devkey",
            VideoGrant::join("Room abc"),
            Duration::from_secs(60),
            now(),
        )
        .with_identity("User 1")
        .with_name("Name 1");

        let token = sign_access_token(&claims, &secret()).unwrap();
        let verified = verify_access_token(&token, "devkey", &secret()).unwrap();

        assert_eq!(verified, claims);
        assert_eq!(verified.sub.as_deref(), Some("User 1"));
        assert_eq!(verified.jti.as_deref(), Some("User 1"));
        assert_eq!(verified.exp - verified.nbf, 60);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let claims = AccessClaims::new("devkey", VideoGrant::list(), ADMIN_TOKEN_TTL, now());
        let token = sign_access_token(&claims, &secret()).unwrap();

        let result = verify_access_token(&token, "devkey", &SecretString::from("other"));
        assert_eq!(result, Err(JwtError::Invalid));
    }

    #[test]
    fn test_verify_rejects_wrong_issuer() {
        let claims = AccessClaims::new("devkey", VideoGrant::list(), ADMIN_TOKEN_TTL, now());
        let token = sign_access_token(&claims, &secret()).unwrap();

        let result = verify_access_token(&token, "otherkey", &secret());
        assert_eq!(result, Err(JwtError::Invalid));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let issued = now() - 3600;
        let claims = AccessClaims::new("devkey", VideoGrant::list(), Duration::from_secs(60), issued);
        let token = sign_access_token(&claims, &secret()).unwrap();

        let result = verify_access_token(&token, "devkey", &secret());
        assert_eq!(result, Err(JwtError::Invalid));
    }

    #[test]
    fn test_verify_rejects_oversized_token() {
        let token = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        let result = verify_access_token(&token, "devkey", &secret());
        assert_eq!(result, Err(JwtError::TokenTooLarge));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let result = verify_access_token("not.a.jwt", "devkey", &secret());
        assert_eq!(result, Err(JwtError::Invalid));
    }

    #[test]
    fn test_claims_debug_redacts_subject() {
        let claims = AccessClaims::new("devkey", VideoGrant::join("r"), ADMIN_TOKEN_TTL, 0)
            .with_identity("User secret-identity");

        let debug = format!("{claims:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret-identity"));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let claims = AccessClaims::new("devkey", VideoGrant::list(), Duration::MAX, 10);
        assert_eq!(claims.exp, i64::MAX);
    }
}
