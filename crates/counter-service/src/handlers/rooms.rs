//! Room creation handler.

use crate::errors::CounterError;
use crate::metadata::RoomMetadata;
use crate::models::CreateRoomResponse;
use crate::observability::metrics::record_room_created;
use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tracing::{info, instrument};

/// Handler for POST /create-room
///
/// Creates a room with a generated name whose counter starts at the next
/// creation seed, then issues a join token for a generated guest.
///
/// ## Response
///
/// ```json
/// { "roomName": "Room 3f2a...", "token": "eyJ..." }
/// ```
///
/// ## Errors
///
/// - 500 if the room service call fails or the token cannot be signed
/// - 504 if the room service does not answer in time
#[instrument(skip_all, name = "cs.rooms.create")]
pub async fn create_room(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CreateRoomResponse>, CounterError> {
    let result = create_room_inner(&state).await;

    record_room_created(if result.is_ok() { "success" } else { "error" });

    result.map(Json)
}

async fn create_room_inner(state: &AppState) -> Result<CreateRoomResponse, CounterError> {
    // Taken before the upstream call so failed attempts still consume a seed.
    let seed = state.rooms.next_seed();
    let room_name = state.rooms.room_name()?;

    let room = state
        .directory
        .create_room(&room_name, &RoomMetadata::new(seed).encode())
        .await?;

    let guest = state.rooms.guest()?;
    let token = state
        .tokens
        .issue_join_token(&room.name, &guest.identity, &guest.display_name)?;

    info!(
        target: "cs.handlers.rooms",
        room = %room.name,
        seed,
        "Room created"
    );

    Ok(CreateRoomResponse {
        room_name: room.name,
        token,
    })
}
