use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{
    services::sse_service,
    state::{
        SharedState,
        bus::{display_channel, player_channel, room_channel},
    },
};

/// Configure the SSE endpoints, one per channel kind.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/rooms/{id}", get(room_stream))
        .route("/sse/rooms/{id}/display", get(display_stream))
        .route("/sse/rooms/{id}/players/{player_id}", get(player_stream))
}

#[utoipa::path(
    get,
    path = "/sse/rooms/{id}",
    tag = "sse",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Shared room event stream", content_type = "text/event-stream", body = String))
)]
/// Stream the room-wide events every connected client should see.
pub async fn room_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let channel = room_channel(id);
    let receiver = sse_service::subscribe_room(&state, id);
    info!(%id, "new room SSE connection");
    let handshake = sse_service::handshake_event(&state, &channel).await;
    sse_service::to_sse_stream(receiver, handshake, channel)
}

#[utoipa::path(
    get,
    path = "/sse/rooms/{id}/display",
    tag = "sse",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Display event stream", content_type = "text/event-stream", body = String))
)]
/// Stream events for the shared big screen, elimination mirrors included.
pub async fn display_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let channel = display_channel(id);
    let receiver = sse_service::subscribe_display(&state, id);
    info!(%id, "new display SSE connection");
    let handshake = sse_service::handshake_event(&state, &channel).await;
    sse_service::to_sse_stream(receiver, handshake, channel)
}

#[utoipa::path(
    get,
    path = "/sse/rooms/{id}/players/{player_id}",
    tag = "sse",
    params(
        ("id" = String, Path, description = "Identifier of the room"),
        ("player_id" = String, Path, description = "Identifier of the player")
    ),
    responses((status = 200, description = "Private player event stream", content_type = "text/event-stream", body = String))
)]
/// Stream events addressed to a single player, such as wildcard results.
pub async fn player_stream(
    State(state): State<SharedState>,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let channel = player_channel(id, player_id);
    let receiver = sse_service::subscribe_player(&state, id, player_id);
    info!(%id, %player_id, "new player SSE connection");
    let handshake = sse_service::handshake_event(&state, &channel).await;
    sse_service::to_sse_stream(receiver, handshake, channel)
}
