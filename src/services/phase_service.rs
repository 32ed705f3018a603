//! Host-side game control: starting, phase changes with their scoring side
//! effect, question advancement, reset, and finishing.
//!
//! Every room mutation goes through the store's compare-and-swap update, so
//! two host tabs racing each other resolve into one winner and one 409.

use std::{sync::Arc, time::SystemTime};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{GameRoomEntity, PlayerEntity, RoomStatus},
        room_store::RoomStore,
    },
    dto::game::{
        FinishGameResponse, GameQuestionView, LeaderboardEntry, NextQuestionResponse,
        RoomStateResponse, SetPhaseRequest,
    },
    error::ServiceError,
    services::{answer_service, game_events, room_service},
    state::{SharedState, arrangement::Arrangement, phase::GamePhase, wildcard::WildcardSlate},
};

/// Start the game: lock the lobby and put the first question on stage.
pub async fn start_game(
    state: &SharedState,
    room_id: Uuid,
) -> Result<RoomStateResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let mut room = room_service::require_room(&store, room_id).await?;

    if room.status != RoomStatus::Waiting {
        return Err(ServiceError::InvalidState(
            "the game has already started".into(),
        ));
    }

    let arrangements = store.list_game_questions(room.id).await?;
    let Some(first) = arrangements.first() else {
        return Err(ServiceError::InvalidState("room has no questions".into()));
    };

    room.status = RoomStatus::InProgress;
    room.current_question_id = Some(first.question_id);
    room.current_phase = GamePhase::Hidden;
    touch(&mut room);
    store.update_room(room.clone()).await?;

    game_events::broadcast_game_started(state, room.id);

    room_service::room_state(state, room_id).await
}

/// Move the current question to the requested phase.
///
/// Entering reveal claims the question on the room's scored list through the
/// same compare-and-swap as the phase write, then awards points. A replayed
/// reveal (or a hidden-to-reveal jump) can therefore never score twice.
pub async fn set_phase(
    state: &SharedState,
    room_id: Uuid,
    request: SetPhaseRequest,
) -> Result<RoomStateResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let mut room = room_service::require_room(&store, room_id).await?;

    if room.status != RoomStatus::InProgress {
        return Err(ServiceError::InvalidState(
            "the game is not in progress".into(),
        ));
    }
    if request.phase == GamePhase::Finished {
        return Err(ServiceError::InvalidInput(
            "finishing the game has its own endpoint".into(),
        ));
    }

    let mut to_score = None;
    if request.phase == GamePhase::Reveal {
        if let Some(question_id) = room.current_question_id {
            if !room.is_scored(question_id) {
                room.scored_question_ids.push(question_id);
                to_score = Some(question_id);
            }
        }
    }

    room.current_phase = request.phase;
    touch(&mut room);
    store.update_room(room.clone()).await?;

    if let Some(question_id) = to_score {
        match answer_service::score_question(&store, &room, question_id).await {
            Ok(scored) => {
                debug!(room_id = %room.id, %question_id, scored, "scored question on reveal");
            }
            Err(err) => {
                // Hand the claim back so a later reveal can still score the
                // question instead of leaving it marked with no points given.
                room.scored_question_ids.retain(|id| *id != question_id);
                touch(&mut room);
                if let Err(release_err) = store.update_room(room.clone()).await {
                    warn!(
                        room_id = %room.id, %question_id, error = %release_err,
                        "failed to release the scoring claim after a scoring error"
                    );
                }
                return Err(err);
            }
        }
    }

    game_events::broadcast_phase_changed(
        state,
        room.id,
        request.phase,
        &player_ids(&store, room.id).await?,
    );

    room_service::room_state(state, room_id).await
}

/// Advance to the next question, or finish the game when none remains.
pub async fn next_question(
    state: &SharedState,
    room_id: Uuid,
) -> Result<NextQuestionResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let mut room = room_service::require_room(&store, room_id).await?;

    if room.status != RoomStatus::InProgress {
        return Err(ServiceError::InvalidState(
            "the game is not in progress".into(),
        ));
    }
    let Some(current_id) = room.current_question_id else {
        return Err(ServiceError::InvalidState(
            "no question is currently on stage".into(),
        ));
    };

    let arrangements = store.list_game_questions(room.id).await?;
    let current_index = arrangements
        .iter()
        .position(|arrangement| arrangement.question_id == current_id);
    let next = current_index.and_then(|index| arrangements.get(index + 1)).cloned();

    let Some(next) = next else {
        finish_room(state, &store, room).await?;
        return Ok(NextQuestionResponse {
            finished: true,
            question: None,
        });
    };

    clear_answers(&store, room.id).await?;

    room.current_question_id = Some(next.question_id);
    room.current_phase = GamePhase::Hidden;
    touch(&mut room);
    store.update_room(room.clone()).await?;

    game_events::broadcast_phase_changed(
        state,
        room.id,
        GamePhase::Hidden,
        &player_ids(&store, room.id).await?,
    );

    let Some(question) = store.find_question(next.question_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "question `{}` not found",
            next.question_id
        )));
    };

    Ok(NextQuestionResponse {
        finished: false,
        question: Some(GameQuestionView::from((&question, &next))),
    })
}

/// End the game and return the final standings. Finishing an already
/// finished room just recomputes the standings.
pub async fn finish_game(
    state: &SharedState,
    room_id: Uuid,
) -> Result<FinishGameResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::require_room(&store, room_id).await?;

    if room.status == RoomStatus::Finished {
        let players = store.list_players(room.id).await?;
        return Ok(FinishGameResponse {
            leaderboard: build_leaderboard(players),
        });
    }

    let leaderboard = finish_room(state, &store, room).await?;
    Ok(FinishGameResponse { leaderboard })
}

/// Return the room to a fresh lobby: scores, answers, wildcards, and the
/// scored-question markers all reset, so the same group can replay.
pub async fn reset_game(
    state: &SharedState,
    room_id: Uuid,
) -> Result<RoomStateResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let mut room = room_service::require_room(&store, room_id).await?;

    let mut players = store.list_players(room.id).await?;
    for player in &mut players {
        player.score = 0;
        player.current_answer = None;
        player.wildcards = WildcardSlate::default();
    }
    let ids: Vec<Uuid> = players.iter().map(|player| player.id).collect();
    store.update_players(players).await?;

    room.status = RoomStatus::Waiting;
    room.current_phase = GamePhase::Hidden;
    room.current_question_id = None;
    room.scored_question_ids.clear();
    touch(&mut room);
    store.update_room(room.clone()).await?;

    game_events::broadcast_phase_changed(state, room.id, GamePhase::Hidden, &ids);

    room_service::room_state(state, room_id).await
}

/// Reshuffle the current question's answer slots. Only allowed while no
/// answer slot is visible yet.
pub async fn randomize_answers(
    state: &SharedState,
    room_id: Uuid,
) -> Result<RoomStateResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::require_room(&store, room_id).await?;

    if room.status != RoomStatus::InProgress {
        return Err(ServiceError::InvalidState(
            "the game is not in progress".into(),
        ));
    }
    if room.current_phase.shows_answer(crate::state::phase::AnswerLetter::A) {
        return Err(ServiceError::InvalidState(
            "answers are already visible".into(),
        ));
    }

    let Some((_, mut game_question)) = room_service::current_arrangement(&store, &room).await?
    else {
        return Err(ServiceError::InvalidState(
            "no question is currently on stage".into(),
        ));
    };

    let reshuffled = {
        // ThreadRng must not live across an await.
        let mut rng = rand::rng();
        Arrangement {
            answers: game_question.answers.clone(),
            correct_letter: game_question.correct_letter,
        }
        .rerandomize(&mut rng)
    };
    game_question.answers = reshuffled.answers;
    game_question.correct_letter = reshuffled.correct_letter;
    store.update_game_question(game_question).await?;

    game_events::broadcast_phase_changed(
        state,
        room.id,
        room.current_phase,
        &player_ids(&store, room.id).await?,
    );

    room_service::room_state(state, room_id).await
}

/// Competition-style standings: stable sort by score, ties share a rank and
/// keep their join order.
pub(crate) fn build_leaderboard(players: Vec<PlayerEntity>) -> Vec<LeaderboardEntry> {
    let mut players = players;
    players.sort_by(|a, b| b.score.cmp(&a.score));

    let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(players.len());
    for (index, player) in players.into_iter().enumerate() {
        let rank = match entries.last() {
            Some(previous) if previous.score == player.score => previous.rank,
            _ => index as u32 + 1,
        };
        entries.push(LeaderboardEntry {
            rank,
            player_id: player.id,
            name: player.name,
            score: player.score,
        });
    }
    entries
}

async fn finish_room(
    state: &SharedState,
    store: &Arc<dyn RoomStore>,
    mut room: GameRoomEntity,
) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    room.status = RoomStatus::Finished;
    room.current_phase = GamePhase::Finished;
    touch(&mut room);
    store.update_room(room.clone()).await?;

    let players = store.list_players(room.id).await?;
    let ids: Vec<Uuid> = players.iter().map(|player| player.id).collect();
    let leaderboard = build_leaderboard(players);
    game_events::broadcast_game_ended(state, room.id, leaderboard.clone(), &ids);

    Ok(leaderboard)
}

async fn player_ids(store: &Arc<dyn RoomStore>, room_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
    let players = store.list_players(room_id).await?;
    Ok(players.into_iter().map(|player| player.id).collect())
}

async fn clear_answers(store: &Arc<dyn RoomStore>, room_id: Uuid) -> Result<(), ServiceError> {
    let mut players = store.list_players(room_id).await?;
    for player in &mut players {
        player.current_answer = None;
    }
    store.update_players(players).await?;
    Ok(())
}

fn touch(room: &mut GameRoomEntity) {
    room.version += 1;
    room.updated_at = SystemTime::now();
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::{
        dto::play::SubmitAnswerRequest,
        services::{
            sse_service,
            test_support::{flaky_test_state, join, seed_room, test_state},
        },
    };

    async fn correct_text(state: &SharedState, room_id: Uuid) -> String {
        let snapshot = room_service::room_state(state, room_id).await.unwrap();
        let question = snapshot.current_question.unwrap();
        question.answers[question.correct_letter.index()].clone()
    }

    async fn submit(state: &SharedState, player_id: Uuid, token: &str, answer: &str) {
        answer_service::submit_answer(
            state,
            player_id,
            token,
            SubmitAnswerRequest {
                answer: answer.to_owned(),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn start_game_stages_the_first_question() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let mut events = sse_service::subscribe_room(&state, created.room.id);

        let started = start_game(&state, created.room.id).await.unwrap();
        assert_eq!(started.room.status, RoomStatus::InProgress);
        assert_eq!(started.room.current_phase, GamePhase::Hidden);
        let question = started.current_question.unwrap();
        assert_eq!(question.order_number, 1);

        let event = events.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some("game-started"));
    }

    #[tokio::test]
    async fn start_game_rejects_a_running_room() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        start_game(&state, created.room.id).await.unwrap();

        let again = start_game(&state, created.room.id).await;
        assert!(matches!(again, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn reveal_scores_each_question_exactly_once() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let ana = join(&state, &created.room.code, "Ana").await;
        let bob = join(&state, &created.room.code, "Bob").await;
        start_game(&state, created.room.id).await.unwrap();

        let correct = correct_text(&state, created.room.id).await;
        submit(&state, ana.player.id, &ana.session_token, &correct).await;
        submit(&state, bob.player.id, &bob.session_token, "wrong guess").await;

        set_phase(
            &state,
            created.room.id,
            SetPhaseRequest {
                phase: GamePhase::Reveal,
            },
        )
        .await
        .unwrap();

        // Bounce back and reveal again: the scored marker must hold.
        set_phase(
            &state,
            created.room.id,
            SetPhaseRequest {
                phase: GamePhase::Question,
            },
        )
        .await
        .unwrap();
        let snapshot = set_phase(
            &state,
            created.room.id,
            SetPhaseRequest {
                phase: GamePhase::Reveal,
            },
        )
        .await
        .unwrap();

        let scores: Vec<(String, u32)> = snapshot
            .players
            .iter()
            .map(|player| (player.name.clone(), player.score))
            .collect();
        assert_eq!(scores, [("Ana".to_owned(), 1), ("Bob".to_owned(), 0)]);
    }

    #[tokio::test]
    async fn direct_jump_to_reveal_scores_with_missing_answers() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let ana = join(&state, &created.room.code, "Ana").await;
        let _bob = join(&state, &created.room.code, "Bob").await;
        start_game(&state, created.room.id).await.unwrap();

        let correct = correct_text(&state, created.room.id).await;
        submit(&state, ana.player.id, &ana.session_token, &correct).await;
        // Bob never answers.

        let snapshot = set_phase(
            &state,
            created.room.id,
            SetPhaseRequest {
                phase: GamePhase::Reveal,
            },
        )
        .await
        .unwrap();

        let bob = snapshot
            .players
            .iter()
            .find(|player| player.name == "Bob")
            .unwrap();
        assert_eq!(bob.score, 0);
    }

    #[tokio::test]
    async fn set_phase_rejects_waiting_rooms_and_finished_target() {
        let state = test_state().await;
        let created = seed_room(&state).await;

        let waiting = set_phase(
            &state,
            created.room.id,
            SetPhaseRequest {
                phase: GamePhase::Question,
            },
        )
        .await;
        assert!(matches!(waiting, Err(ServiceError::InvalidState(_))));

        start_game(&state, created.room.id).await.unwrap();
        let finished = set_phase(
            &state,
            created.room.id,
            SetPhaseRequest {
                phase: GamePhase::Finished,
            },
        )
        .await;
        assert!(matches!(finished, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn next_question_clears_answers_and_walks_the_order() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let ana = join(&state, &created.room.code, "Ana").await;
        start_game(&state, created.room.id).await.unwrap();
        submit(&state, ana.player.id, &ana.session_token, "whatever").await;

        let advanced = next_question(&state, created.room.id).await.unwrap();
        assert!(!advanced.finished);
        assert_eq!(advanced.question.unwrap().order_number, 2);

        let snapshot = room_service::room_state(&state, created.room.id)
            .await
            .unwrap();
        assert_eq!(snapshot.room.current_phase, GamePhase::Hidden);
        assert!(!snapshot.players[0].has_answered);
    }

    #[tokio::test]
    async fn next_question_past_the_end_finishes_the_game() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        join(&state, &created.room.code, "Ana").await;
        start_game(&state, created.room.id).await.unwrap();
        let mut events = sse_service::subscribe_room(&state, created.room.id);

        // Fixture rooms hold three questions.
        next_question(&state, created.room.id).await.unwrap();
        next_question(&state, created.room.id).await.unwrap();
        let last = next_question(&state, created.room.id).await.unwrap();
        assert!(last.finished);
        assert!(last.question.is_none());

        let snapshot = room_service::room_state(&state, created.room.id)
            .await
            .unwrap();
        assert_eq!(snapshot.room.status, RoomStatus::Finished);
        assert_eq!(snapshot.room.current_phase, GamePhase::Finished);

        let names: Vec<Option<String>> = (0..3)
            .map(|_| events.try_recv().ok().and_then(|event| event.event))
            .collect();
        assert!(names.iter().flatten().any(|name| name == "game-ended"));
    }

    #[tokio::test]
    async fn finish_is_idempotent_on_standings() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        join(&state, &created.room.code, "Ana").await;
        start_game(&state, created.room.id).await.unwrap();

        let first = finish_game(&state, created.room.id).await.unwrap();
        let second = finish_game(&state, created.room.id).await.unwrap();
        assert_eq!(first.leaderboard.len(), second.leaderboard.len());
        assert_eq!(first.leaderboard[0].rank, second.leaderboard[0].rank);
    }

    #[tokio::test]
    async fn reset_returns_the_room_to_a_fresh_lobby() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let ana = join(&state, &created.room.code, "Ana").await;
        start_game(&state, created.room.id).await.unwrap();

        let correct = correct_text(&state, created.room.id).await;
        submit(&state, ana.player.id, &ana.session_token, &correct).await;
        set_phase(
            &state,
            created.room.id,
            SetPhaseRequest {
                phase: GamePhase::Reveal,
            },
        )
        .await
        .unwrap();

        let reset = reset_game(&state, created.room.id).await.unwrap();
        assert_eq!(reset.room.status, RoomStatus::Waiting);
        assert_eq!(reset.room.current_phase, GamePhase::Hidden);
        assert!(reset.room.current_question_id.is_none());
        assert_eq!(reset.players[0].score, 0);
        assert!(!reset.players[0].has_answered);
        assert!(!reset.players[0].wildcards.fifty_fifty.used);

        // A fresh run scores again from scratch.
        start_game(&state, created.room.id).await.unwrap();
        let correct = correct_text(&state, created.room.id).await;
        submit(&state, ana.player.id, &ana.session_token, &correct).await;
        let snapshot = set_phase(
            &state,
            created.room.id,
            SetPhaseRequest {
                phase: GamePhase::Reveal,
            },
        )
        .await
        .unwrap();
        assert_eq!(snapshot.players[0].score, 1);
    }

    #[tokio::test]
    async fn randomize_preserves_texts_and_respects_visibility() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        start_game(&state, created.room.id).await.unwrap();

        let before = room_service::room_state(&state, created.room.id)
            .await
            .unwrap()
            .current_question
            .unwrap();
        let mut before_texts = before.answers.to_vec();
        before_texts.sort();

        let after = randomize_answers(&state, created.room.id)
            .await
            .unwrap()
            .current_question
            .unwrap();
        let mut after_texts = after.answers.to_vec();
        after_texts.sort();
        assert_eq!(before_texts, after_texts);
        assert_eq!(
            after.answers[after.correct_letter.index()],
            before.answers[before.correct_letter.index()]
        );

        set_phase(
            &state,
            created.room.id,
            SetPhaseRequest {
                phase: GamePhase::AnswerA,
            },
        )
        .await
        .unwrap();
        let rejected = randomize_answers(&state, created.room.id).await;
        assert!(matches!(rejected, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn phase_and_end_events_reach_the_player_channel() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let ana = join(&state, &created.room.code, "Ana").await;
        start_game(&state, created.room.id).await.unwrap();

        let mut events = sse_service::subscribe_player(&state, created.room.id, ana.player.id);

        set_phase(
            &state,
            created.room.id,
            SetPhaseRequest {
                phase: GamePhase::Question,
            },
        )
        .await
        .unwrap();
        let event = events.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some("game-phase-changed"));

        finish_game(&state, created.room.id).await.unwrap();
        let event = events.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some("game-ended"));
        assert!(event.data.contains("leaderboard"));
    }

    #[tokio::test]
    async fn failed_scoring_releases_the_claim_for_a_retry() {
        let (state, store) = flaky_test_state().await;
        let created = seed_room(&state).await;
        let ana = join(&state, &created.room.code, "Ana").await;
        start_game(&state, created.room.id).await.unwrap();

        let correct = correct_text(&state, created.room.id).await;
        submit(&state, ana.player.id, &ana.session_token, &correct).await;

        store.fail_player_updates(true);
        let failed = set_phase(
            &state,
            created.room.id,
            SetPhaseRequest {
                phase: GamePhase::Reveal,
            },
        )
        .await;
        assert!(failed.is_err());

        // The claim was handed back, so re-entering reveal still awards the
        // point instead of leaving the question marked scored with nothing
        // given out.
        store.fail_player_updates(false);
        let snapshot = set_phase(
            &state,
            created.room.id,
            SetPhaseRequest {
                phase: GamePhase::Reveal,
            },
        )
        .await
        .unwrap();
        assert_eq!(snapshot.players[0].score, 1);
    }

    #[tokio::test]
    async fn randomize_runs_on_a_spawned_task() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        start_game(&state, created.room.id).await.unwrap();

        // tokio::spawn requires the service future to be Send.
        let handle = tokio::spawn({
            let state = state.clone();
            let room_id = created.room.id;
            async move { randomize_answers(&state, room_id).await }
        });
        assert!(handle.await.unwrap().is_ok());
    }

    #[test]
    fn leaderboard_shares_ranks_on_ties() {
        let room_id = Uuid::new_v4();
        let player = |name: &str, score: u32| PlayerEntity {
            id: Uuid::new_v4(),
            game_room_id: room_id,
            name: name.to_owned(),
            score,
            current_answer: None,
            session_token: "token".to_owned(),
            wildcards: WildcardSlate::default(),
            created_at: SystemTime::now(),
        };

        let entries = build_leaderboard(vec![
            player("Ana", 2),
            player("Bob", 3),
            player("Cleo", 2),
            player("Dan", 1),
        ]);

        let ranked: Vec<(u32, &str)> = entries
            .iter()
            .map(|entry| (entry.rank, entry.name.as_str()))
            .collect();
        assert_eq!(
            ranked,
            [(1, "Bob"), (2, "Ana"), (2, "Cleo"), (4, "Dan")]
        );
    }
}
