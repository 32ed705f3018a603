use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        game::{PlayerSummary, WildcardSlateSummary},
        play::{JoinRoomRequest, JoinRoomResponse, PlayerStateResponse, SubmitAnswerRequest},
    },
    error::AppError,
    services::{answer_service, room_service, wildcard_service},
    state::SharedState,
};

const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Player-facing endpoints: joining, playing, and leaving a room.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/join", post(join_room))
        .route("/players/{id}", get(get_player_state).delete(leave_room))
        .route("/players/{id}/answer", post(submit_answer))
        .route("/players/{id}/wildcards", get(get_player_wildcards))
}

fn session_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(SESSION_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing session token header `x-session-token`".into())
        })
}

/// Join a room by its six-character code.
#[utoipa::path(
    post,
    path = "/rooms/join",
    tag = "play",
    request_body = JoinRoomRequest,
    responses(
        (status = 201, description = "Joined the room", body = JoinRoomResponse),
        (status = 404, description = "No room with that code"),
        (status = 409, description = "Name already taken or game already started")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Json(payload): Json<JoinRoomRequest>,
) -> Result<(StatusCode, Json<JoinRoomResponse>), AppError> {
    payload.validate()?;
    let joined = room_service::join_room(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(joined)))
}

/// Phase-filtered view of the game for one player: only what the current
/// phase allows is present.
#[utoipa::path(
    get,
    path = "/players/{id}",
    tag = "play",
    params(
        ("id" = String, Path, description = "Identifier of the player"),
        ("x-session-token" = String, Header, description = "Session token issued on join")
    ),
    responses(
        (status = 200, description = "Player state", body = PlayerStateResponse),
        (status = 401, description = "Missing or invalid session token")
    )
)]
pub async fn get_player_state(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<PlayerStateResponse>, AppError> {
    let token = session_token(&headers)?;
    Ok(Json(room_service::player_state(&state, id, token).await?))
}

/// Leave the room, releasing the player's name.
#[utoipa::path(
    delete,
    path = "/players/{id}",
    tag = "play",
    params(
        ("id" = String, Path, description = "Identifier of the player"),
        ("x-session-token" = String, Header, description = "Session token issued on join")
    ),
    responses(
        (status = 204, description = "Left the room"),
        (status = 401, description = "Missing or invalid session token")
    )
)]
pub async fn leave_room(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = session_token(&headers)?;
    room_service::leave_room(&state, id, token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's own wildcard slate: availability and stored eliminations.
#[utoipa::path(
    get,
    path = "/players/{id}/wildcards",
    tag = "play",
    params(
        ("id" = String, Path, description = "Identifier of the player"),
        ("x-session-token" = String, Header, description = "Session token issued on join")
    ),
    responses(
        (status = 200, description = "Wildcard slate", body = WildcardSlateSummary),
        (status = 401, description = "Missing or invalid session token")
    )
)]
pub async fn get_player_wildcards(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<WildcardSlateSummary>, AppError> {
    let token = session_token(&headers)?;
    Ok(Json(
        wildcard_service::player_wildcards(&state, id, token).await?,
    ))
}

/// Record an answer for the current question. Resubmitting overwrites the
/// previous answer while the phase still accepts answers.
#[utoipa::path(
    post,
    path = "/players/{id}/answer",
    tag = "play",
    params(
        ("id" = String, Path, description = "Identifier of the player"),
        ("x-session-token" = String, Header, description = "Session token issued on join")
    ),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = PlayerSummary),
        (status = 401, description = "Missing or invalid session token"),
        (status = 409, description = "Answers are locked")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<PlayerSummary>, AppError> {
    let token = session_token(&headers)?;
    Ok(Json(
        answer_service::submit_answer(&state, id, token, payload).await?,
    ))
}
