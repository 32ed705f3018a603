use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::game::{LeaderboardEntry, PlayerSummary},
    state::{
        phase::{AnswerLetter, GamePhase},
        wildcard::WildcardKind,
    },
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Build an event from a pre-serialized data payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Name of the channel this stream is subscribed to.
    pub channel: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast on the room and display channels when a player joins.
pub struct PlayerJoinedEvent {
    pub player: PlayerSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a player leaves or is removed from the room.
pub struct PlayerLeftEvent {
    pub player_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast on the room and display channels when an answer is recorded.
pub struct AnswerSubmittedEvent {
    pub player_id: Uuid,
    pub answer: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the host starts the game.
pub struct GameStartedEvent {
    pub game_room_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever the current question phase changes.
pub struct GamePhaseChangedEvent {
    pub phase: GamePhase,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the host ends the game.
pub struct GameEndedEvent {
    pub game_ended: bool,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Sent on a player's private channel when a wildcard resolves or is revived.
pub struct WildcardResultEvent {
    /// Discriminator: one of the wildcard kind names, or `wild_card_revived`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The kind handed back, present on revival notifications only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wild_card_type: Option<WildcardKind>,
    /// Struck-out letters for the elimination kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrong_answers: Option<Vec<AnswerLetter>>,
    /// Set when an assistance wildcard's countdown finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}
