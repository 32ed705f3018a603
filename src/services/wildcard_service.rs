//! Host-driven wildcard lifecycle: granting, completing timers, and reviving.
//!
//! Wildcards are host-mediated: players raise a hand in the physical room and
//! the host spends the card on their behalf. The elimination kinds are spent
//! at grant time; the timer kinds stay available while the host runs the
//! countdown and are spent when its expiry is signalled.

use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::RoomStatus,
    dto::game::{
        GrantWildcardRequest, WildcardActionRequest, WildcardResultResponse, WildcardSlateSummary,
    },
    error::ServiceError,
    services::{game_events, room_service},
    state::{
        SharedState,
        arrangement::Arrangement,
        wildcard::{WildcardKind, WildcardState, draw_eliminations},
    },
};

/// Grant a wildcard to a player.
///
/// For the elimination kinds the struck letters are drawn here, stored on the
/// card, and the card is spent. The assistance kinds only hand the host a
/// countdown to run; the card stays available until [`complete_timer`]
/// records its expiry.
pub async fn grant(
    state: &SharedState,
    room_id: Uuid,
    request: GrantWildcardRequest,
) -> Result<WildcardResultResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::require_room(&store, room_id).await?;
    if room.status != RoomStatus::InProgress {
        return Err(ServiceError::InvalidState(
            "the game is not in progress".into(),
        ));
    }

    let mut player = room_service::require_player(&store, request.player_id).await?;
    if player.game_room_id != room.id {
        return Err(ServiceError::InvalidInput(
            "player does not belong to this room".into(),
        ));
    }

    let kind = request.wild_card_type;
    if !player.wildcards.get(kind).is_available() {
        return Err(ServiceError::Conflict(format!(
            "wildcard `{kind}` has already been used"
        )));
    }

    let eliminated = if kind.is_elimination() {
        let count = match kind {
            WildcardKind::FiftyFifty => 2,
            WildcardKind::Roulette => {
                let Some(count) = request.eliminate_count else {
                    return Err(ServiceError::InvalidInput(
                        "roulette requires an eliminate_count".into(),
                    ));
                };
                usize::from(count)
            }
            _ => 0,
        };

        let Some((_, game_question)) = room_service::current_arrangement(&store, &room).await?
        else {
            return Err(ServiceError::InvalidState(
                "no question is currently on stage".into(),
            ));
        };
        let arrangement = Arrangement {
            answers: game_question.answers.clone(),
            correct_letter: game_question.correct_letter,
        };

        let mut rng = rand::rng();
        Some(draw_eliminations(arrangement.wrong_letters(), count, &mut rng))
    } else {
        None
    };

    if kind.is_elimination() {
        *player.wildcards.get_mut(kind) = WildcardState::Used {
            at: SystemTime::now(),
            eliminated: eliminated.clone(),
        };
        store.update_player(player.clone()).await?;
    }

    info!(room_id = %room.id, player_id = %player.id, wildcard = %kind, "wildcard granted");
    game_events::broadcast_wildcard_result(state, room.id, player.id, kind, eliminated.clone(), None);

    Ok(WildcardResultResponse {
        wild_card_type: kind,
        wrong_answers: eliminated,
        countdown_seconds: kind.countdown().map(|duration| duration.as_secs()),
    })
}

/// Record the expiry of an assistance wildcard's countdown: the card is
/// spent here, and the player is told their time is up.
pub async fn complete_timer(
    state: &SharedState,
    room_id: Uuid,
    request: WildcardActionRequest,
) -> Result<(), ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::require_room(&store, room_id).await?;
    let mut player = room_service::require_player(&store, request.player_id).await?;
    if player.game_room_id != room.id {
        return Err(ServiceError::InvalidInput(
            "player does not belong to this room".into(),
        ));
    }

    let kind = request.wild_card_type;
    if kind.countdown().is_none() {
        return Err(ServiceError::InvalidInput(format!(
            "wildcard `{kind}` has no countdown to complete"
        )));
    }
    if !player.wildcards.get(kind).is_available() {
        return Err(ServiceError::Conflict(format!(
            "wildcard `{kind}` has already been used"
        )));
    }

    *player.wildcards.get_mut(kind) = WildcardState::Used {
        at: SystemTime::now(),
        eliminated: None,
    };
    store.update_player(player.clone()).await?;

    info!(room_id = %room.id, player_id = %player.id, wildcard = %kind, "wildcard countdown expired");
    game_events::broadcast_wildcard_result(state, room.id, player.id, kind, None, Some(true));
    Ok(())
}

/// A player's own wildcard slate: availability plus any stored eliminations.
pub async fn player_wildcards(
    state: &SharedState,
    player_id: Uuid,
    session_token: &str,
) -> Result<WildcardSlateSummary, ServiceError> {
    let store = state.require_room_store().await?;
    let player = room_service::require_player(&store, player_id).await?;
    room_service::authorize_player(&player, session_token)?;
    Ok((&player.wildcards).into())
}

/// Hand a spent wildcard back to a player. Host-only correction for
/// misclicks and acts of generosity.
pub async fn revive(
    state: &SharedState,
    room_id: Uuid,
    request: WildcardActionRequest,
) -> Result<(), ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::require_room(&store, room_id).await?;
    let mut player = room_service::require_player(&store, request.player_id).await?;
    if player.game_room_id != room.id {
        return Err(ServiceError::InvalidInput(
            "player does not belong to this room".into(),
        ));
    }

    let kind = request.wild_card_type;
    if player.wildcards.get(kind).is_available() {
        return Err(ServiceError::Conflict(format!(
            "wildcard `{kind}` is not used"
        )));
    }

    *player.wildcards.get_mut(kind) = WildcardState::Available;
    store.update_player(player.clone()).await?;

    info!(room_id = %room.id, player_id = %player.id, wildcard = %kind, "wildcard revived");
    game_events::broadcast_wildcard_revived(state, room.id, player.id, kind);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        phase_service, sse_service,
        test_support::{join, seed_room, test_state},
    };

    fn grant_request(
        player_id: Uuid,
        kind: WildcardKind,
        eliminate_count: Option<u8>,
    ) -> GrantWildcardRequest {
        GrantWildcardRequest {
            player_id,
            wild_card_type: kind,
            eliminate_count,
        }
    }

    #[tokio::test]
    async fn grant_requires_a_running_game() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let joined = join(&state, &created.room.code, "Ana").await;

        let early = grant(
            &state,
            created.room.id,
            grant_request(joined.player.id, WildcardKind::PhoneCall, None),
        )
        .await;
        assert!(matches!(early, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn fifty_fifty_strikes_two_wrong_answers() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let joined = join(&state, &created.room.code, "Ana").await;
        phase_service::start_game(&state, created.room.id)
            .await
            .unwrap();

        let result = grant(
            &state,
            created.room.id,
            grant_request(joined.player.id, WildcardKind::FiftyFifty, None),
        )
        .await
        .unwrap();

        let struck = result.wrong_answers.unwrap();
        assert_eq!(struck.len(), 2);

        let snapshot = crate::services::room_service::room_state(&state, created.room.id)
            .await
            .unwrap();
        let correct = snapshot.current_question.unwrap().correct_letter;
        assert!(!struck.contains(&correct));
        assert!(result.countdown_seconds.is_none());
    }

    #[tokio::test]
    async fn roulette_needs_and_honors_the_count() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let joined = join(&state, &created.room.code, "Ana").await;
        phase_service::start_game(&state, created.room.id)
            .await
            .unwrap();

        let missing = grant(
            &state,
            created.room.id,
            grant_request(joined.player.id, WildcardKind::Roulette, None),
        )
        .await;
        assert!(matches!(missing, Err(ServiceError::InvalidInput(_))));

        let result = grant(
            &state,
            created.room.id,
            grant_request(joined.player.id, WildcardKind::Roulette, Some(3)),
        )
        .await
        .unwrap();
        assert_eq!(result.wrong_answers.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn roulette_with_zero_count_strikes_nothing_but_spends_the_card() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let joined = join(&state, &created.room.code, "Ana").await;
        phase_service::start_game(&state, created.room.id)
            .await
            .unwrap();

        let result = grant(
            &state,
            created.room.id,
            grant_request(joined.player.id, WildcardKind::Roulette, Some(0)),
        )
        .await
        .unwrap();
        assert_eq!(result.wrong_answers.unwrap().len(), 0);

        let again = grant(
            &state,
            created.room.id,
            grant_request(joined.player.id, WildcardKind::Roulette, Some(1)),
        )
        .await;
        assert!(matches!(again, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn timer_kinds_stay_available_until_the_countdown_expires() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let joined = join(&state, &created.room.code, "Ana").await;
        phase_service::start_game(&state, created.room.id)
            .await
            .unwrap();

        let granted = grant(
            &state,
            created.room.id,
            grant_request(joined.player.id, WildcardKind::PhoneCall, None),
        )
        .await
        .unwrap();
        assert_eq!(granted.countdown_seconds, Some(45));
        assert!(granted.wrong_answers.is_none());

        // The card is only spent once the countdown runs out.
        let slate = player_wildcards(&state, joined.player.id, &joined.session_token)
            .await
            .unwrap();
        assert!(!slate.phone_call.used);

        complete_timer(
            &state,
            created.room.id,
            WildcardActionRequest {
                player_id: joined.player.id,
                wild_card_type: WildcardKind::PhoneCall,
            },
        )
        .await
        .unwrap();

        let slate = player_wildcards(&state, joined.player.id, &joined.session_token)
            .await
            .unwrap();
        assert!(slate.phone_call.used);

        let regrant = grant(
            &state,
            created.room.id,
            grant_request(joined.player.id, WildcardKind::PhoneCall, None),
        )
        .await;
        assert!(matches!(regrant, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn complete_timer_signals_the_player_channel_once() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let joined = join(&state, &created.room.code, "Ana").await;
        phase_service::start_game(&state, created.room.id)
            .await
            .unwrap();

        let action = || WildcardActionRequest {
            player_id: joined.player.id,
            wild_card_type: WildcardKind::PhoneSearch,
        };

        grant(
            &state,
            created.room.id,
            grant_request(joined.player.id, WildcardKind::PhoneSearch, None),
        )
        .await
        .unwrap();

        let mut events = sse_service::subscribe_player(&state, created.room.id, joined.player.id);
        complete_timer(&state, created.room.id, action()).await.unwrap();

        let event = events.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some("wildcard-result"));
        assert!(event.data.contains("\"completed\":true"));

        let spent = complete_timer(&state, created.room.id, action()).await;
        assert!(matches!(spent, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn complete_timer_rejects_elimination_kinds() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let joined = join(&state, &created.room.code, "Ana").await;
        phase_service::start_game(&state, created.room.id)
            .await
            .unwrap();

        let rejected = complete_timer(
            &state,
            created.room.id,
            WildcardActionRequest {
                player_id: joined.player.id,
                wild_card_type: WildcardKind::FiftyFifty,
            },
        )
        .await;
        assert!(matches!(rejected, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn revive_enables_a_second_grant() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let joined = join(&state, &created.room.code, "Ana").await;
        phase_service::start_game(&state, created.room.id)
            .await
            .unwrap();

        grant(
            &state,
            created.room.id,
            grant_request(joined.player.id, WildcardKind::FiftyFifty, None),
        )
        .await
        .unwrap();

        let action = || WildcardActionRequest {
            player_id: joined.player.id,
            wild_card_type: WildcardKind::FiftyFifty,
        };

        revive(&state, created.room.id, action()).await.unwrap();
        let twice = revive(&state, created.room.id, action()).await;
        assert!(matches!(twice, Err(ServiceError::Conflict(_))));

        let regrant = grant(
            &state,
            created.room.id,
            grant_request(joined.player.id, WildcardKind::FiftyFifty, None),
        )
        .await;
        assert!(regrant.is_ok());
    }

    #[tokio::test]
    async fn revive_notification_differs_from_a_spend() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let joined = join(&state, &created.room.code, "Ana").await;
        phase_service::start_game(&state, created.room.id)
            .await
            .unwrap();

        let mut events = sse_service::subscribe_player(&state, created.room.id, joined.player.id);

        grant(
            &state,
            created.room.id,
            grant_request(joined.player.id, WildcardKind::FiftyFifty, None),
        )
        .await
        .unwrap();
        let spent = events.try_recv().unwrap();

        revive(
            &state,
            created.room.id,
            WildcardActionRequest {
                player_id: joined.player.id,
                wild_card_type: WildcardKind::FiftyFifty,
            },
        )
        .await
        .unwrap();
        let revived = events.try_recv().unwrap();

        assert_ne!(spent.data, revived.data);
        assert!(spent.data.contains("\"type\":\"fifty_fifty\""));
        assert!(revived.data.contains("\"type\":\"wild_card_revived\""));
        assert!(revived.data.contains("\"wild_card_type\":\"fifty_fifty\""));
    }

    #[tokio::test]
    async fn player_wildcards_requires_the_token_and_shows_eliminations() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let joined = join(&state, &created.room.code, "Ana").await;
        phase_service::start_game(&state, created.room.id)
            .await
            .unwrap();

        grant(
            &state,
            created.room.id,
            grant_request(joined.player.id, WildcardKind::FiftyFifty, None),
        )
        .await
        .unwrap();

        let wrong = player_wildcards(&state, joined.player.id, "bogus-token").await;
        assert!(matches!(wrong, Err(ServiceError::Unauthorized(_))));

        let slate = player_wildcards(&state, joined.player.id, &joined.session_token)
            .await
            .unwrap();
        assert!(slate.fifty_fifty.used);
        assert_eq!(slate.fifty_fifty.eliminated.as_ref().unwrap().len(), 2);
        assert!(!slate.roulette.used);
        assert!(slate.roulette.eliminated.is_none());
    }

    #[tokio::test]
    async fn elimination_results_reach_the_display_channel() {
        let state = test_state().await;
        let created = seed_room(&state).await;
        let joined = join(&state, &created.room.code, "Ana").await;
        phase_service::start_game(&state, created.room.id)
            .await
            .unwrap();

        let mut display = sse_service::subscribe_display(&state, created.room.id);
        grant(
            &state,
            created.room.id,
            grant_request(joined.player.id, WildcardKind::FiftyFifty, None),
        )
        .await
        .unwrap();

        let event = display.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some("wildcard-result"));
        assert!(event.data.contains("fifty_fifty"));
    }
}
