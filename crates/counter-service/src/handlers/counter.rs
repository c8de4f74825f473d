//! Counter increment handler.

use crate::errors::CounterError;
use crate::models::CounterIncrementRequest;
use crate::routes::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Handler for POST /counter-increment
///
/// Increments the counter stored in the named room's metadata by one.
///
/// ## Request Body
///
/// ```json
/// { "roomName": "Room 3f2a..." }
/// ```
///
/// ## Response
///
/// 200 with an empty body on success.
///
/// ## Errors
///
/// - 400 if the body is malformed, or the name matches no room or several rooms
/// - 409 if another increment of the same room held the lock too long
/// - 500 if the metadata is corrupt, the counter overflowed, or the room service failed
/// - 504 if the room service does not answer in time
#[instrument(skip_all, name = "cs.counter.increment_request")]
pub async fn counter_increment(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CounterIncrementRequest>, JsonRejection>,
) -> Result<StatusCode, CounterError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(target: "cs.handlers.counter", error = %rejection, "Rejected increment body");
        CounterError::BadRequest(rejection.body_text())
    })?;

    request
        .validate()
        .map_err(|msg| CounterError::BadRequest(msg.to_string()))?;

    state.counter.increment(&request.room_name).await?;

    Ok(StatusCode::OK)
}
