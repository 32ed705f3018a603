//! Event names and broadcast helpers for the game channel bus.
//!
//! Events are signals, not state carriers: clients re-fetch authoritative
//! state over REST when one arrives. Payloads exist so simple consumers can
//! update without a round-trip, but they are always safe to ignore.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        game::{LeaderboardEntry, PlayerSummary},
        sse::{
            AnswerSubmittedEvent, GameEndedEvent, GamePhaseChangedEvent, GameStartedEvent,
            PlayerJoinedEvent, PlayerLeftEvent, ServerEvent, WildcardResultEvent,
        },
    },
    state::{
        SharedState,
        bus::{display_channel, player_channel, room_channel},
        phase::{AnswerLetter, GamePhase},
        wildcard::WildcardKind,
    },
};

const EVENT_PLAYER_JOINED: &str = "player-joined";
const EVENT_PLAYER_LEFT: &str = "player-left";
const EVENT_ANSWER_SUBMITTED: &str = "answer-submitted";
const EVENT_GAME_STARTED: &str = "game-started";
const EVENT_GAME_PHASE_CHANGED: &str = "game-phase-changed";
const EVENT_GAME_ENDED: &str = "game-ended";
const EVENT_WILDCARD_RESULT: &str = "wildcard-result";
/// `type` discriminator carried by revival notifications.
const WILDCARD_REVIVED_TYPE: &str = "wild_card_revived";

/// Notify the room and display that a player joined.
pub fn broadcast_player_joined(state: &SharedState, room_id: Uuid, player: PlayerSummary) {
    let payload = PlayerJoinedEvent { player };
    send_room_event(state, room_id, EVENT_PLAYER_JOINED, &payload);
}

/// Notify the room and display that a player left.
pub fn broadcast_player_left(state: &SharedState, room_id: Uuid, player_id: Uuid) {
    let payload = PlayerLeftEvent { player_id };
    send_room_event(state, room_id, EVENT_PLAYER_LEFT, &payload);
}

/// Notify the room and display that an answer was recorded.
pub fn broadcast_answer_submitted(
    state: &SharedState,
    room_id: Uuid,
    player_id: Uuid,
    answer: &str,
) {
    let payload = AnswerSubmittedEvent {
        player_id,
        answer: answer.to_owned(),
    };
    send_room_event(state, room_id, EVENT_ANSWER_SUBMITTED, &payload);
}

/// Notify the room and display that the game started.
pub fn broadcast_game_started(state: &SharedState, room_id: Uuid) {
    let payload = GameStartedEvent {
        game_room_id: room_id,
    };
    send_room_event(state, room_id, EVENT_GAME_STARTED, &payload);
}

/// Notify the room, the display, and every connected player of a phase
/// change. Players get their own copy because their channel is the only one
/// they subscribe to.
pub fn broadcast_phase_changed(
    state: &SharedState,
    room_id: Uuid,
    phase: GamePhase,
    player_ids: &[Uuid],
) {
    let payload = GamePhaseChangedEvent { phase };
    send_room_event(state, room_id, EVENT_GAME_PHASE_CHANGED, &payload);
    send_player_events(state, room_id, player_ids, EVENT_GAME_PHASE_CHANGED, &payload);
}

/// Notify the room, the display, and every connected player that the game
/// ended, with final standings.
pub fn broadcast_game_ended(
    state: &SharedState,
    room_id: Uuid,
    leaderboard: Vec<LeaderboardEntry>,
    player_ids: &[Uuid],
) {
    let payload = GameEndedEvent {
        game_ended: true,
        leaderboard,
    };
    send_room_event(state, room_id, EVENT_GAME_ENDED, &payload);
    send_player_events(state, room_id, player_ids, EVENT_GAME_ENDED, &payload);
}

/// Send a wildcard outcome to the concerned player's private channel. The
/// elimination kinds are mirrored to the display so the big screen can strike
/// the eliminated answers.
pub fn broadcast_wildcard_result(
    state: &SharedState,
    room_id: Uuid,
    player_id: Uuid,
    kind: WildcardKind,
    wrong_answers: Option<Vec<AnswerLetter>>,
    completed: Option<bool>,
) {
    let payload = WildcardResultEvent {
        kind: kind.as_str().to_owned(),
        wild_card_type: None,
        wrong_answers,
        completed,
    };
    send_event(
        state,
        &player_channel(room_id, player_id),
        EVENT_WILDCARD_RESULT,
        &payload,
    );
    if kind.is_elimination() {
        send_event(
            state,
            &display_channel(room_id),
            EVENT_WILDCARD_RESULT,
            &payload,
        );
    }
}

/// Tell a player their wildcard was handed back. Uses the revival
/// discriminator so a client can tell this apart from a spend.
pub fn broadcast_wildcard_revived(
    state: &SharedState,
    room_id: Uuid,
    player_id: Uuid,
    kind: WildcardKind,
) {
    let payload = WildcardResultEvent {
        kind: WILDCARD_REVIVED_TYPE.to_owned(),
        wild_card_type: Some(kind),
        wrong_answers: None,
        completed: None,
    };
    send_event(
        state,
        &player_channel(room_id, player_id),
        EVENT_WILDCARD_RESULT,
        &payload,
    );
}

fn send_room_event(state: &SharedState, room_id: Uuid, event: &str, payload: &impl Serialize) {
    send_event(state, &room_channel(room_id), event, payload);
    send_event(state, &display_channel(room_id), event, payload);
}

fn send_player_events(
    state: &SharedState,
    room_id: Uuid,
    player_ids: &[Uuid],
    event: &str,
    payload: &impl Serialize,
) {
    for &player_id in player_ids {
        send_event(state, &player_channel(room_id, player_id), event, payload);
    }
}

fn send_event(state: &SharedState, channel: &str, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.bus().publish(channel, event),
        Err(err) => warn!(event, channel, error = %err, "failed to serialize event payload"),
    }
}
