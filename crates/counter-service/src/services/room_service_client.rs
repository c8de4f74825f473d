//! Upstream room service HTTP client.
//!
//! Speaks the room service's Twirp JSON API:
//!
//! ```text
//! POST {host}/twirp/livekit.RoomService/ListRooms           {"names": [name]}
//! POST {host}/twirp/livekit.RoomService/CreateRoom          {"name", "metadata"}
//! POST {host}/twirp/livekit.RoomService/UpdateRoomMetadata  {"room", "metadata"}
//! ```
//!
//! Every call carries a fresh service token in `Authorization: Bearer`,
//! scoped to the grant that call needs. Every call is bounded by the
//! configured upstream timeout.
//!
//! # Error mapping
//!
//! | Upstream result            | Error                          |
//! |----------------------------|--------------------------------|
//! | request timed out          | `CounterError::UpstreamTimeout` |
//! | connection failure         | `CounterError::Upstream`        |
//! | 401 / 403                  | `CounterError::Upstream`        |
//! | 404 on UpdateRoomMetadata  | `CounterError::RoomNotFound`    |
//! | any other non-2xx (including 404 on ListRooms / CreateRoom) | `CounterError::Upstream` |
//! | unparseable 2xx body       | `CounterError::Upstream`        |

use crate::config::Config;
use crate::errors::CounterError;
use crate::models::Room;
use crate::observability::metrics::record_upstream_request;
use crate::services::room_directory::RoomDirectory;
use crate::services::token_issuer::TokenIssuer;
use common::jwt::VideoGrant;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, instrument, warn};

const TWIRP_PREFIX: &str = "/twirp/livekit.RoomService";

/// Connect timeout, capped by the overall request timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct ListRoomsRequest<'a> {
    names: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct ListRoomsResponse {
    // Twirp omits empty repeated fields.
    #[serde(default)]
    rooms: Vec<Room>,
}

#[derive(Debug, Serialize)]
struct CreateRoomRequest<'a> {
    name: &'a str,
    metadata: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateRoomMetadataRequest<'a> {
    room: &'a str,
    metadata: &'a str,
}

/// Twirp error body.
#[derive(Debug, Default, Deserialize)]
struct TwirpError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    msg: String,
}

/// HTTP client for the upstream room service.
#[derive(Clone)]
pub struct RoomServiceClient {
    client: Client,
    base_url: String,
    tokens: TokenIssuer,
    timeout: Duration,
}

impl RoomServiceClient {
    /// Create a new client.
    ///
    /// `host` may use `http`, `https`, `ws` or `wss`; WebSocket schemes are
    /// rewritten to their HTTP equivalents.
    ///
    /// # Errors
    ///
    /// Returns `CounterError::Internal` if the HTTP client cannot be built.
    pub fn new(host: &str, tokens: TokenIssuer, timeout: Duration) -> Result<Self, CounterError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| {
                error!(target: "cs.services.room_service_client", error = %e, "Failed to build HTTP client");
                CounterError::Internal
            })?;

        Ok(Self {
            client,
            base_url: http_base_url(host),
            tokens,
            timeout,
        })
    }

    /// Create a client from service configuration.
    ///
    /// # Errors
    ///
    /// Returns `CounterError::Internal` if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, CounterError> {
        Self::new(
            &config.livekit_host,
            TokenIssuer::from_config(config),
            Duration::from_secs(config.upstream_timeout_seconds),
        )
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one Twirp call and record its outcome.
    ///
    /// A 404 maps to `RoomNotFound` only when `room` names the room the call
    /// targets; otherwise it is an upstream failure like any other status.
    async fn call<Req, Resp>(
        &self,
        method: &'static str,
        operation: &'static str,
        grant: VideoGrant,
        body: &Req,
        room: Option<&str>,
    ) -> Result<Resp, CounterError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let start = Instant::now();
        let result = self.send(method, grant, body, room).await;

        let status = match &result {
            Ok(_) => "success",
            Err(CounterError::UpstreamTimeout(_)) => "timeout",
            Err(_) => "error",
        };
        record_upstream_request(operation, status, start.elapsed());

        result
    }

    async fn send<Req, Resp>(
        &self,
        method: &'static str,
        grant: VideoGrant,
        body: &Req,
        room: Option<&str>,
    ) -> Result<Resp, CounterError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}/{}", self.base_url, TWIRP_PREFIX, method);
        let token = self.tokens.issue_service_token(grant)?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(method, &e))?;

        self.handle_response(method, response, room).await
    }

    /// Map upstream status codes to errors.
    async fn handle_response<Resp: DeserializeOwned>(
        &self,
        method: &'static str,
        response: reqwest::Response,
        room: Option<&str>,
    ) -> Result<Resp, CounterError> {
        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(|e| {
                if e.is_timeout() {
                    return self.transport_error(method, &e);
                }
                warn!(target: "cs.services.room_service_client", method, error = %e, "Failed to parse upstream response");
                CounterError::Upstream(format!("{method} returned an invalid response"))
            });
        }

        let body = response.text().await.unwrap_or_default();
        let twirp: TwirpError = serde_json::from_str(&body).unwrap_or_default();

        match (status, room) {
            (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
                error!(target: "cs.services.room_service_client", method, status = %status, "Upstream rejected service credentials");
                Err(CounterError::Upstream(format!(
                    "{method} rejected the service credentials"
                )))
            }
            (StatusCode::NOT_FOUND, Some(room)) => {
                debug!(target: "cs.services.room_service_client", method, room = %room, msg = %twirp.msg, "Upstream reported room not found");
                Err(CounterError::RoomNotFound(room.to_string()))
            }
            _ => {
                warn!(
                    target: "cs.services.room_service_client",
                    method,
                    status = %status,
                    code = %twirp.code,
                    msg = %twirp.msg,
                    "Upstream returned an error"
                );
                let detail = if twirp.msg.is_empty() {
                    status.to_string()
                } else {
                    twirp.msg
                };
                Err(CounterError::Upstream(format!("{method} failed: {detail}")))
            }
        }
    }

    fn transport_error(&self, method: &'static str, e: &reqwest::Error) -> CounterError {
        if e.is_timeout() {
            warn!(target: "cs.services.room_service_client", method, timeout_ms = self.timeout.as_millis() as u64, "Upstream request timed out");
            CounterError::UpstreamTimeout(format!(
                "{method} did not respond within {}ms",
                self.timeout.as_millis()
            ))
        } else {
            warn!(target: "cs.services.room_service_client", method, error = %e, "Upstream request failed");
            CounterError::Upstream(format!("{method} request failed"))
        }
    }
}

#[async_trait::async_trait]
impl RoomDirectory for RoomServiceClient {
    #[instrument(skip(self), name = "cs.upstream.list_rooms")]
    async fn list_rooms_by_name(&self, name: &str) -> Result<Vec<Room>, CounterError> {
        let response: ListRoomsResponse = self
            .call(
                "ListRooms",
                "list_rooms",
                VideoGrant::list(),
                &ListRoomsRequest { names: [name] },
                None,
            )
            .await?;

        // Filtering is done upstream; only exact matches are kept regardless.
        Ok(response
            .rooms
            .into_iter()
            .filter(|room| room.name == name)
            .collect())
    }

    #[instrument(skip(self, metadata), name = "cs.upstream.create_room")]
    async fn create_room(&self, name: &str, metadata: &str) -> Result<Room, CounterError> {
        self.call(
            "CreateRoom",
            "create_room",
            VideoGrant::create(),
            &CreateRoomRequest { name, metadata },
            None,
        )
        .await
    }

    #[instrument(skip(self, metadata), name = "cs.upstream.update_room_metadata")]
    async fn update_room_metadata(
        &self,
        name: &str,
        metadata: &str,
    ) -> Result<Room, CounterError> {
        self.call(
            "UpdateRoomMetadata",
            "update_room_metadata",
            VideoGrant::admin(name),
            &UpdateRoomMetadataRequest {
                room: name,
                metadata,
            },
            Some(name),
        )
        .await
    }
}

/// Rewrite a configured host into the HTTP base URL for Twirp calls.
fn http_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');

    if let Some(rest) = host.strip_prefix("wss://") {
        format!("https://{rest}")
    } else if let Some(rest) = host.strip_prefix("ws://") {
        format!("http://{rest}")
    } else {
        host.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::secret::SecretString;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            "devkey".to_string(),
            SecretString::from("secret"),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_http_base_url_rewrites_websocket_schemes() {
        assert_eq!(http_base_url("ws://localhost:7880"), "http://localhost:7880");
        assert_eq!(http_base_url("wss://rtc.example.com"), "https://rtc.example.com");
        assert_eq!(http_base_url("http://localhost:7880/"), "http://localhost:7880");
        assert_eq!(http_base_url("https://rtc.example.com"), "https://rtc.example.com");
    }

    #[test]
    fn test_list_rooms_request_serialization() {
        let json = serde_json::to_value(ListRoomsRequest { names: ["Room abc"] }).unwrap();
        assert_eq!(json, serde_json::json!({ "names": ["Room abc"] }));
    }

    #[test]
    fn test_update_request_serialization() {
        let json = serde_json::to_value(UpdateRoomMetadataRequest {
            room: "Room abc",
            metadata: r#"{"counter":1}"#,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "room": "Room abc", "metadata": "{\"counter\":1}" })
        );
    }

    #[test]
    fn test_list_rooms_response_without_rooms_is_empty() {
        let response: ListRoomsResponse = serde_json::from_str("{}").unwrap();
        assert!(response.rooms.is_empty());
    }

    #[test]
    fn test_client_uses_configured_host() {
        let client =
            RoomServiceClient::new("ws://localhost:7880", issuer(), Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:7880");
    }
}
