//! Answer recording and the once-per-question scoring pass.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::{
        models::{GameRoomEntity, RoomStatus},
        room_store::RoomStore,
    },
    dto::{game::PlayerSummary, play::SubmitAnswerRequest},
    error::ServiceError,
    services::{game_events, room_service},
    state::SharedState,
};

/// Record a player's answer for the current question.
///
/// Rejected once the phase stops accepting answers, so a submission racing a
/// lock always resolves on the server's side of the fence.
pub async fn submit_answer(
    state: &SharedState,
    player_id: Uuid,
    session_token: &str,
    request: SubmitAnswerRequest,
) -> Result<PlayerSummary, ServiceError> {
    let store = state.require_room_store().await?;
    let mut player = room_service::require_player(&store, player_id).await?;
    room_service::authorize_player(&player, session_token)?;

    let room = room_service::require_room(&store, player.game_room_id).await?;
    if room.status != RoomStatus::InProgress {
        return Err(ServiceError::InvalidState(
            "the game is not in progress".into(),
        ));
    }
    if !room.current_phase.accepts_answers() {
        return Err(ServiceError::InvalidState(
            "answers are locked for the current question".into(),
        ));
    }

    let answer = request.answer.trim().to_owned();
    if answer.is_empty() {
        return Err(ServiceError::InvalidInput("answer must not be empty".into()));
    }

    player.current_answer = Some(answer.clone());
    store.update_player(player.clone()).await?;

    game_events::broadcast_answer_submitted(state, room.id, player.id, &answer);

    Ok(player.into())
}

/// Award one point to every player whose recorded answer matches the correct
/// text of the given question. Returns the number of players scored.
///
/// Callers must have claimed the question on the room's scored list first;
/// this function only applies the point deltas.
pub async fn score_question(
    store: &Arc<dyn RoomStore>,
    room: &GameRoomEntity,
    question_id: Uuid,
) -> Result<u32, ServiceError> {
    let Some(arrangement) = store.find_game_question(room.id, question_id).await? else {
        warn!(room_id = %room.id, question_id = %question_id, "no arrangement found; skipping scoring");
        return Ok(0);
    };
    let correct_text = &arrangement.answers[arrangement.correct_letter.index()];

    let mut players = store.list_players(room.id).await?;
    let mut scored = 0;
    for player in &mut players {
        if player.current_answer.as_deref() == Some(correct_text.as_str()) {
            player.score += 1;
            scored += 1;
        }
    }
    store.update_players(players).await?;

    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{
            phase_service,
            test_support::{join, seed_room, test_state},
        },
        state::phase::GamePhase,
    };

    #[tokio::test]
    async fn submit_requires_a_running_game() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let joined = join(&state, &created.room.code, "Ana").await;

        let early = submit_answer(
            &state,
            joined.player.id,
            &joined.session_token,
            SubmitAnswerRequest {
                answer: "anything".to_owned(),
            },
        )
        .await;
        assert!(matches!(early, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn submit_is_rejected_from_locked_onward() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let joined = join(&state, &created.room.code, "Ana").await;
        phase_service::start_game(&state, created.room.id)
            .await
            .unwrap();

        for phase in [GamePhase::Locked, GamePhase::Reveal] {
            phase_service::set_phase(
                &state,
                created.room.id,
                crate::dto::game::SetPhaseRequest { phase },
            )
            .await
            .unwrap();

            let rejected = submit_answer(
                &state,
                joined.player.id,
                &joined.session_token,
                SubmitAnswerRequest {
                    answer: "anything".to_owned(),
                },
            )
            .await;
            assert!(matches!(rejected, Err(ServiceError::InvalidState(_))));
        }
    }

    #[tokio::test]
    async fn submit_overwrites_the_previous_answer() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let joined = join(&state, &created.room.code, "Ana").await;
        phase_service::start_game(&state, created.room.id)
            .await
            .unwrap();

        submit_answer(
            &state,
            joined.player.id,
            &joined.session_token,
            SubmitAnswerRequest {
                answer: "first guess".to_owned(),
            },
        )
        .await
        .unwrap();
        let updated = submit_answer(
            &state,
            joined.player.id,
            &joined.session_token,
            SubmitAnswerRequest {
                answer: "second guess".to_owned(),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.current_answer.as_deref(), Some("second guess"));
    }

    #[tokio::test]
    async fn submit_requires_the_session_token() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let joined = join(&state, &created.room.code, "Ana").await;
        phase_service::start_game(&state, created.room.id)
            .await
            .unwrap();

        let rejected = submit_answer(
            &state,
            joined.player.id,
            "bogus-token",
            SubmitAnswerRequest {
                answer: "anything".to_owned(),
            },
        )
        .await;
        assert!(matches!(rejected, Err(ServiceError::Unauthorized(_))));
    }
}
