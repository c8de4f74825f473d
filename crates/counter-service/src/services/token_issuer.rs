//! Token issuer.
//!
//! Signs two kinds of HS256 access tokens with the upstream API secret:
//!
//! - **Join tokens** handed to clients: `roomJoin` scoped to one room plus
//!   `canUpdateOwnMetadata` for the joining identity. Never room-admin.
//! - **Service tokens** presented by [`RoomServiceClient`] on each upstream
//!   call, carrying only the grant that call needs.
//!
//! Tokens are stateless and not tracked after issuance.
//!
//! [`RoomServiceClient`]: crate::services::room_service_client::RoomServiceClient

use crate::config::Config;
use crate::errors::CounterError;
use common::jwt::{sign_access_token, AccessClaims, VideoGrant, ADMIN_TOKEN_TTL};
use common::secret::SecretString;
use std::time::Duration;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct TokenIssuer {
    api_key: String,
    api_secret: SecretString,
    join_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(api_key: String, api_secret: SecretString, join_ttl: Duration) -> Self {
        Self {
            api_key,
            api_secret,
            join_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_key.clone(),
            config.api_secret.clone(),
            Duration::from_secs(config.join_token_ttl_seconds),
        )
    }

    /// Issue a join token for `identity` in `room_name`.
    ///
    /// # Errors
    ///
    /// Returns `CounterError::Signing` if the token cannot be signed.
    #[instrument(skip_all, name = "cs.token.issue_join", fields(room = %room_name))]
    pub fn issue_join_token(
        &self,
        room_name: &str,
        identity: &str,
        display_name: &str,
    ) -> Result<String, CounterError> {
        let claims = AccessClaims::new(
            &self.api_key,
            VideoGrant::join(room_name),
            self.join_ttl,
            chrono::Utc::now().timestamp(),
        )
        .with_identity(identity)
        .with_name(display_name);

        Ok(sign_access_token(&claims, &self.api_secret)?)
    }

    /// Issue a short-lived service token carrying `grant`.
    ///
    /// # Errors
    ///
    /// Returns `CounterError::Signing` if the token cannot be signed.
    pub fn issue_service_token(&self, grant: VideoGrant) -> Result<String, CounterError> {
        let claims = AccessClaims::new(
            &self.api_key,
            grant,
            ADMIN_TOKEN_TTL,
            chrono::Utc::now().timestamp(),
        );

        Ok(sign_access_token(&claims, &self.api_secret)?)
    }
}
