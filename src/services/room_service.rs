//! Room lifecycle: creation with materialized answer arrangements, joining,
//! leaving, and the host/player state projections.

use std::{sync::Arc, time::SystemTime};

use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::{ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH},
    dao::{
        models::{
            GameQuestionEntity, GameRoomEntity, PlayerEntity, QuestionEntity, RoomStatus,
        },
        room_store::RoomStore,
    },
    dto::{
        game::{CreateRoomRequest, PlayerSummary, RoomStateResponse},
        play::{JoinRoomRequest, JoinRoomResponse, PlayerQuestionView, PlayerStateResponse},
    },
    error::ServiceError,
    services::game_events,
    state::{SharedState, arrangement::Arrangement, wildcard::WildcardSlate},
};

const MAX_CODE_ATTEMPTS: u32 = 8;

/// Open a room for a questionnaire, or return the questionnaire's existing
/// waiting room so a double-click on "host" never spawns twins.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<RoomStateResponse, ServiceError> {
    let store = state.require_room_store().await?;

    reap_stale_rooms(state, &store).await;

    let Some(questionnaire) = store.find_questionnaire(request.questionnaire_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "questionnaire `{}` not found",
            request.questionnaire_id
        )));
    };
    let questions = store.list_questions(questionnaire.id).await?;
    if questions.is_empty() {
        return Err(ServiceError::InvalidInput(
            "questionnaire has no questions".into(),
        ));
    }

    if let Some(existing) = store.find_waiting_room_for(questionnaire.id).await? {
        let players = store.list_players(existing.id).await?;
        return Ok(RoomStateResponse {
            room: existing.into(),
            players: players.into_iter().map(Into::into).collect(),
            current_question: None,
        });
    }

    let code = allocate_code(&store).await?;
    let now = SystemTime::now();
    let room = GameRoomEntity {
        id: Uuid::new_v4(),
        questionnaire_id: questionnaire.id,
        code,
        status: RoomStatus::Waiting,
        current_phase: crate::state::phase::GamePhase::Hidden,
        current_question_id: None,
        scored_question_ids: Vec::new(),
        version: 0,
        created_at: now,
        updated_at: now,
    };

    let arrangements = materialize_questions(room.id, &questions);

    store.insert_room(room.clone()).await?;
    if let Err(err) = store.insert_game_questions(arrangements).await {
        // Roll the half-created room back so the code is not burned.
        if let Err(cleanup_err) = store.delete_room(room.id).await {
            warn!(room_id = %room.id, error = %cleanup_err, "failed to clean up half-created room");
        }
        return Err(err.into());
    }

    Ok(RoomStateResponse {
        room: room.into(),
        players: Vec::new(),
        current_question: None,
    })
}

/// Full host view of a room: entity, players in join order, and the current
/// question with its answer key.
pub async fn room_state(
    state: &SharedState,
    room_id: Uuid,
) -> Result<RoomStateResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let room = require_room(&store, room_id).await?;
    let players = store.list_players(room.id).await?;
    let current_question = current_arrangement(&store, &room)
        .await?
        .map(|(question, arrangement)| (&question, &arrangement).into());

    Ok(RoomStateResponse {
        room: room.into(),
        players: players.into_iter().map(Into::into).collect(),
        current_question,
    })
}

/// Enter a waiting room by join code.
pub async fn join_room(
    state: &SharedState,
    request: JoinRoomRequest,
) -> Result<JoinRoomResponse, ServiceError> {
    let store = state.require_room_store().await?;

    let Some(room) = store.find_room_by_code(request.code.clone()).await? else {
        return Err(ServiceError::NotFound(format!(
            "no room found for code `{}`",
            request.code
        )));
    };

    if room.status != RoomStatus::Waiting {
        return Err(ServiceError::InvalidState(
            "the game has already started".into(),
        ));
    }

    let name = request.name.trim().to_owned();
    if store
        .find_player_by_name(room.id, name.clone())
        .await?
        .is_some()
    {
        return Err(ServiceError::Conflict(format!(
            "name `{name}` is already taken in this room"
        )));
    }

    let player = PlayerEntity {
        id: Uuid::new_v4(),
        game_room_id: room.id,
        name,
        score: 0,
        current_answer: None,
        session_token: Uuid::new_v4().simple().to_string(),
        wildcards: WildcardSlate::default(),
        created_at: SystemTime::now(),
    };
    store.insert_player(player.clone()).await?;

    let session_token = player.session_token.clone();
    let summary: PlayerSummary = player.into();
    game_events::broadcast_player_joined(state, room.id, summary.clone());

    Ok(JoinRoomResponse {
        room: room.into(),
        player: summary,
        session_token,
    })
}

/// Remove a player from their room.
pub async fn leave_room(
    state: &SharedState,
    player_id: Uuid,
    session_token: &str,
) -> Result<(), ServiceError> {
    let store = state.require_room_store().await?;
    let player = require_player(&store, player_id).await?;
    authorize_player(&player, session_token)?;

    store.delete_player(player.id).await?;
    game_events::broadcast_player_left(state, player.game_room_id, player.id);

    Ok(())
}

/// State a player polls after every event signal: own record plus the
/// phase-filtered question projection.
pub async fn player_state(
    state: &SharedState,
    player_id: Uuid,
    session_token: &str,
) -> Result<PlayerStateResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let player = require_player(&store, player_id).await?;
    authorize_player(&player, session_token)?;
    let room = require_room(&store, player.game_room_id).await?;

    let question = current_arrangement(&store, &room)
        .await?
        .map(|(question, arrangement)| {
            PlayerQuestionView::project(&question, &arrangement, room.current_phase)
        });

    Ok(PlayerStateResponse {
        room: room.into(),
        player: player.into(),
        question,
    })
}

/// Verify that the supplied session token owns the player record.
pub fn authorize_player(player: &PlayerEntity, session_token: &str) -> Result<(), ServiceError> {
    if player.session_token != session_token {
        return Err(ServiceError::Unauthorized("invalid session token".into()));
    }
    Ok(())
}

/// Fetch a room or produce a not-found error.
pub async fn require_room(
    store: &Arc<dyn RoomStore>,
    room_id: Uuid,
) -> Result<GameRoomEntity, ServiceError> {
    store
        .find_room(room_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))
}

/// Fetch a player or produce a not-found error.
pub async fn require_player(
    store: &Arc<dyn RoomStore>,
    player_id: Uuid,
) -> Result<PlayerEntity, ServiceError> {
    store
        .find_player(player_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("player `{player_id}` not found")))
}

/// Load the canonical question and arrangement currently on stage.
///
/// A missing arrangement (partial bulk insert, manual data surgery) is
/// rebuilt from the canonical question with a fresh shuffle rather than
/// failing the whole room.
pub async fn current_arrangement(
    store: &Arc<dyn RoomStore>,
    room: &GameRoomEntity,
) -> Result<Option<(QuestionEntity, GameQuestionEntity)>, ServiceError> {
    let Some(question_id) = room.current_question_id else {
        return Ok(None);
    };

    let Some(question) = store.find_question(question_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "question `{question_id}` not found"
        )));
    };

    let arrangement = match store.find_game_question(room.id, question_id).await? {
        Some(existing) => existing,
        None => {
            warn!(room_id = %room.id, question_id = %question_id, "rebuilding missing answer arrangement");
            let rebuilt = materialize_question(room.id, &question);
            store.update_game_question(rebuilt.clone()).await?;
            rebuilt
        }
    };

    Ok(Some((question, arrangement)))
}

/// Shuffle every question of a questionnaire into room-local arrangements.
pub fn materialize_questions(
    room_id: Uuid,
    questions: &[QuestionEntity],
) -> Vec<GameQuestionEntity> {
    questions
        .iter()
        .map(|question| materialize_question(room_id, question))
        .collect()
}

fn materialize_question(room_id: Uuid, question: &QuestionEntity) -> GameQuestionEntity {
    let mut rng = rand::rng();
    let arrangement = Arrangement::materialize(
        &question.correct_answer,
        question.wrong_answers(),
        &mut rng,
    );
    GameQuestionEntity {
        id: Uuid::new_v4(),
        game_room_id: room_id,
        question_id: question.id,
        order_number: question.order_number,
        answers: arrangement.answers,
        correct_letter: arrangement.correct_letter,
    }
}

async fn reap_stale_rooms(state: &SharedState, store: &Arc<dyn RoomStore>) {
    let Some(cutoff) = SystemTime::now().checked_sub(state.config().stale_room_max_age) else {
        return;
    };

    match store.delete_stale_waiting_rooms(cutoff).await {
        Ok(0) => {}
        Ok(removed) => info!(removed, "reaped abandoned waiting rooms"),
        Err(err) => warn!(error = %err, "failed to reap stale rooms"),
    }
}

async fn allocate_code(store: &Arc<dyn RoomStore>) -> Result<String, ServiceError> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_code();
        if store.find_room_by_code(code.clone()).await?.is_none() {
            return Ok(code);
        }
    }

    Err(ServiceError::InvalidState(
        "could not allocate a unique room code".into(),
    ))
}

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}
