//! Counter service error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl. Error
//! bodies are plain text carrying a human-readable detail string; server-side
//! failures are also logged where they are mapped.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::jwt::JwtError;
use thiserror::Error;

/// Counter service error type.
///
/// Maps to HTTP status codes:
/// - BadRequest, RoomNotFound, AmbiguousRoom: 400 Bad Request
/// - Conflict: 409 Conflict
/// - MetadataCorrupt, CounterOverflow, Upstream, Signing, Internal: 500
/// - UpstreamTimeout: 504 Gateway Timeout
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Room name is ambiguous: '{name}' matched {matches} rooms")]
    AmbiguousRoom { name: String, matches: usize },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Room metadata is corrupt: {0}")]
    MetadataCorrupt(String),

    #[error("Counter overflow in room '{0}'")]
    CounterOverflow(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Internal server error")]
    Internal,
}

impl CounterError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CounterError::BadRequest(_)
            | CounterError::RoomNotFound(_)
            | CounterError::AmbiguousRoom { .. } => StatusCode::BAD_REQUEST,
            CounterError::Conflict(_) => StatusCode::CONFLICT,
            CounterError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CounterError::MetadataCorrupt(_)
            | CounterError::CounterOverflow(_)
            | CounterError::Upstream(_)
            | CounterError::Signing(_)
            | CounterError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Bounded label for metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            CounterError::BadRequest(_) => "bad_request",
            CounterError::RoomNotFound(_) => "room_not_found",
            CounterError::AmbiguousRoom { .. } => "ambiguous_room",
            CounterError::Conflict(_) => "conflict",
            CounterError::MetadataCorrupt(_) => "metadata_corrupt",
            CounterError::CounterOverflow(_) => "counter_overflow",
            CounterError::Upstream(_) => "upstream",
            CounterError::UpstreamTimeout(_) => "upstream_timeout",
            CounterError::Signing(_) => "signing",
            CounterError::Internal => "internal",
        }
    }
}

impl IntoResponse for CounterError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(target: "cs.errors", error = %self, status = %status, "Request failed");
        } else {
            tracing::debug!(target: "cs.errors", error = %self, status = %status, "Request rejected");
        }

        (status, self.to_string()).into_response()
    }
}

impl From<JwtError> for CounterError {
    fn from(err: JwtError) -> Self {
        CounterError::Signing(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn read_body_text(body: Body) -> String {
        let bytes = body.collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_display_room_not_found() {
        let error = CounterError::RoomNotFound("Room abc".to_string());
        assert_eq!(format!("{}", error), "Room not found: Room abc");
    }

    #[test]
    fn test_display_ambiguous_room() {
        let error = CounterError::AmbiguousRoom {
            name: "Room abc".to_string(),
            matches: 2,
        };
        assert_eq!(
            format!("{}", error),
            "Room name is ambiguous: 'Room abc' matched 2 rooms"
        );
    }

    #[test]
    fn test_display_metadata_corrupt() {
        let error = CounterError::MetadataCorrupt("metadata is empty".to_string());
        assert_eq!(
            format!("{}", error),
            "Room metadata is corrupt: metadata is empty"
        );
    }

    #[test]
    fn test_display_internal() {
        assert_eq!(format!("{}", CounterError::Internal), "Internal server error");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CounterError::BadRequest("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CounterError::RoomNotFound("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CounterError::AmbiguousRoom {
                name: "x".to_string(),
                matches: 3
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CounterError::Conflict("x".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            CounterError::MetadataCorrupt("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            CounterError::CounterOverflow("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            CounterError::Upstream("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            CounterError::UpstreamTimeout("x".to_string()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            CounterError::Signing("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            CounterError::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_jwt_error() {
        let error = CounterError::from(JwtError::Signing);
        assert!(matches!(error, CounterError::Signing(msg) if msg.contains("signing failed")));
    }

    #[tokio::test]
    async fn test_into_response_room_not_found_is_plain_text_400() {
        let response = CounterError::RoomNotFound("Room abc".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(content_type.starts_with("text/plain"));

        let body = read_body_text(response.into_body()).await;
        assert_eq!(body, "Room not found: Room abc");
    }

    #[tokio::test]
    async fn test_into_response_upstream_carries_detail() {
        let response =
            CounterError::Upstream("listing rooms failed: status 503".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_body_text(response.into_body()).await;
        assert_eq!(body, "Upstream error: listing rooms failed: status 503");
    }

    #[tokio::test]
    async fn test_into_response_conflict() {
        let response = CounterError::Conflict("room is busy".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = read_body_text(response.into_body()).await;
        assert_eq!(body, "Conflict: room is busy");
    }

    #[tokio::test]
    async fn test_into_response_upstream_timeout() {
        let response = CounterError::UpstreamTimeout("ListRooms".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
