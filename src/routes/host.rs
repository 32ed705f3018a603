use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        admin::ActionResponse,
        game::{
            CreateRoomRequest, FinishGameResponse, GrantWildcardRequest, NextQuestionResponse,
            RoomStateResponse, SetPhaseRequest, WildcardActionRequest, WildcardResultResponse,
        },
    },
    error::AppError,
    services::{phase_service, room_service, wildcard_service},
    state::SharedState,
};

/// Host console endpoints driving a game room.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{id}", get(get_room_state))
        .route("/rooms/{id}/start", post(start_game))
        .route("/rooms/{id}/phase", post(set_phase))
        .route("/rooms/{id}/next-question", post(next_question))
        .route("/rooms/{id}/finish", post(finish_game))
        .route("/rooms/{id}/reset", post(reset_game))
        .route("/rooms/{id}/randomize-answers", post(randomize_answers))
        .route("/rooms/{id}/wildcards/grant", post(grant_wildcard))
        .route("/rooms/{id}/wildcards/complete", post(complete_wildcard))
        .route("/rooms/{id}/wildcards/revive", post(revive_wildcard))
}

/// Open a game room for a questionnaire, or return the waiting room that
/// already exists for it.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "host",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room ready", body = RoomStateResponse),
        (status = 404, description = "Questionnaire not found")
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomStateResponse>), AppError> {
    let room = room_service::create_room(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// Full host view of a room: status, players, and the current question with
/// its answer key.
#[utoipa::path(
    get,
    path = "/rooms/{id}",
    tag = "host",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Room state", body = RoomStateResponse),
        (status = 404, description = "Room not found")
    )
)]
pub async fn get_room_state(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomStateResponse>, AppError> {
    Ok(Json(room_service::room_state(&state, id).await?))
}

/// Start the game and stage the first question.
#[utoipa::path(
    post,
    path = "/rooms/{id}/start",
    tag = "host",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Game started", body = RoomStateResponse),
        (status = 409, description = "Game already started")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomStateResponse>, AppError> {
    Ok(Json(phase_service::start_game(&state, id).await?))
}

/// Move the current question to another phase. Entering reveal triggers the
/// scoring pass for the question, once.
#[utoipa::path(
    post,
    path = "/rooms/{id}/phase",
    tag = "host",
    params(("id" = String, Path, description = "Identifier of the room")),
    request_body = SetPhaseRequest,
    responses(
        (status = 200, description = "Phase changed", body = RoomStateResponse),
        (status = 409, description = "Game not in progress or concurrent update")
    )
)]
pub async fn set_phase(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetPhaseRequest>,
) -> Result<Json<RoomStateResponse>, AppError> {
    Ok(Json(phase_service::set_phase(&state, id, payload).await?))
}

/// Advance to the next question, finishing the game when none remains.
#[utoipa::path(
    post,
    path = "/rooms/{id}/next-question",
    tag = "host",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Advanced or finished", body = NextQuestionResponse),
        (status = 409, description = "Game not in progress")
    )
)]
pub async fn next_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NextQuestionResponse>, AppError> {
    Ok(Json(phase_service::next_question(&state, id).await?))
}

/// End the game early and return the final standings.
#[utoipa::path(
    post,
    path = "/rooms/{id}/finish",
    tag = "host",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Final standings", body = FinishGameResponse))
)]
pub async fn finish_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FinishGameResponse>, AppError> {
    Ok(Json(phase_service::finish_game(&state, id).await?))
}

/// Reset the room to a fresh lobby so the same players can replay.
#[utoipa::path(
    post,
    path = "/rooms/{id}/reset",
    tag = "host",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Room reset", body = RoomStateResponse))
)]
pub async fn reset_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomStateResponse>, AppError> {
    Ok(Json(phase_service::reset_game(&state, id).await?))
}

/// Reshuffle the current question's answer slots before any is shown.
#[utoipa::path(
    post,
    path = "/rooms/{id}/randomize-answers",
    tag = "host",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Answers reshuffled", body = RoomStateResponse),
        (status = 409, description = "Answers already visible")
    )
)]
pub async fn randomize_answers(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomStateResponse>, AppError> {
    Ok(Json(phase_service::randomize_answers(&state, id).await?))
}

/// Spend a wildcard on behalf of a player.
#[utoipa::path(
    post,
    path = "/rooms/{id}/wildcards/grant",
    tag = "host",
    params(("id" = String, Path, description = "Identifier of the room")),
    request_body = GrantWildcardRequest,
    responses(
        (status = 200, description = "Wildcard spent", body = WildcardResultResponse),
        (status = 409, description = "Wildcard already used")
    )
)]
pub async fn grant_wildcard(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GrantWildcardRequest>,
) -> Result<Json<WildcardResultResponse>, AppError> {
    payload.validate()?;
    Ok(Json(wildcard_service::grant(&state, id, payload).await?))
}

/// Signal that an assistance wildcard's countdown has run out.
#[utoipa::path(
    post,
    path = "/rooms/{id}/wildcards/complete",
    tag = "host",
    params(("id" = String, Path, description = "Identifier of the room")),
    request_body = WildcardActionRequest,
    responses((status = 200, description = "Countdown completion signalled", body = ActionResponse))
)]
pub async fn complete_wildcard(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WildcardActionRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    wildcard_service::complete_timer(&state, id, payload).await?;
    Ok(Json(ActionResponse {
        message: "wildcard countdown completed".to_owned(),
    }))
}

/// Hand a spent wildcard back to a player.
#[utoipa::path(
    post,
    path = "/rooms/{id}/wildcards/revive",
    tag = "host",
    params(("id" = String, Path, description = "Identifier of the room")),
    request_body = WildcardActionRequest,
    responses(
        (status = 200, description = "Wildcard revived", body = ActionResponse),
        (status = 409, description = "Wildcard is not used")
    )
)]
pub async fn revive_wildcard(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WildcardActionRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    wildcard_service::revive(&state, id, payload).await?;
    Ok(Json(ActionResponse {
        message: "wildcard revived".to_owned(),
    }))
}
