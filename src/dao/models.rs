use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{
    phase::{AnswerLetter, GamePhase},
    wildcard::WildcardSlate,
};

/// Lifecycle status of a game room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Lobby is open; players may join.
    Waiting,
    /// Game started; the room is playing through its questions.
    InProgress,
    /// Host ended the game; the room is read-only history.
    Finished,
}

/// Questionnaire definition authored by an admin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionnaireEntity {
    /// Stable identifier for the questionnaire.
    pub id: Uuid,
    /// Human readable questionnaire title.
    pub title: String,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time this questionnaire was updated.
    pub updated_at: SystemTime,
}

/// Canonical question inside a questionnaire. The correct answer and the
/// three wrong answers are stored in fixed fields; per-room slot placement
/// lives in [`GameQuestionEntity`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Stable identifier for the question.
    pub id: Uuid,
    /// Questionnaire this question belongs to.
    pub questionnaire_id: Uuid,
    /// One-based position within the questionnaire.
    pub order_number: u32,
    /// The question prompt shown to everyone.
    pub question_text: String,
    /// The single correct answer text.
    pub correct_answer: String,
    /// First wrong answer text.
    pub wrong_answer_1: String,
    /// Second wrong answer text.
    pub wrong_answer_2: String,
    /// Third wrong answer text.
    pub wrong_answer_3: String,
}

impl QuestionEntity {
    /// The three wrong answer texts as an array.
    pub fn wrong_answers(&self) -> [&str; 3] {
        [
            &self.wrong_answer_1,
            &self.wrong_answer_2,
            &self.wrong_answer_3,
        ]
    }
}

/// Aggregate game room entity persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameRoomEntity {
    /// Primary key of the room.
    pub id: Uuid,
    /// Questionnaire played in this room.
    pub questionnaire_id: Uuid,
    /// Short join code handed out to players.
    pub code: String,
    /// Lobby / playing / finished status.
    pub status: RoomStatus,
    /// Reveal phase of the current question.
    pub current_phase: GamePhase,
    /// Question currently on stage, if the game has started.
    pub current_question_id: Option<Uuid>,
    /// Questions whose reveal already awarded points, so a phase replay can
    /// never score the same question twice.
    pub scored_question_ids: Vec<Uuid>,
    /// Monotonic revision used to detect concurrent host updates.
    pub version: u64,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the room entity was updated.
    pub updated_at: SystemTime,
}

impl GameRoomEntity {
    /// Whether the given question has already been scored in this room.
    pub fn is_scored(&self, question_id: Uuid) -> bool {
        self.scored_question_ids.contains(&question_id)
    }
}

/// Per-room materialization of a question: the four answer texts shuffled
/// into slots, remembering which slot holds the correct one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameQuestionEntity {
    /// Stable identifier for this materialization.
    pub id: Uuid,
    /// Room the arrangement belongs to.
    pub game_room_id: Uuid,
    /// Canonical question this arrangement was built from.
    pub question_id: Uuid,
    /// One-based position within the room's play order.
    pub order_number: u32,
    /// Answer texts by slot (A=0 .. D=3).
    pub answers: [String; 4],
    /// Slot holding the correct answer.
    pub correct_letter: AnswerLetter,
}

/// Representation of a player stored in persistence and shared across layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier for the player.
    pub id: Uuid,
    /// Room the player joined.
    pub game_room_id: Uuid,
    /// Display name, unique within the room.
    pub name: String,
    /// Accumulated score.
    pub score: u32,
    /// Answer text submitted for the current question, if any.
    pub current_answer: Option<String>,
    /// Secret proving ownership of this player on mutating requests.
    pub session_token: String,
    /// Wildcard slate for this player.
    pub wildcards: WildcardSlate,
    /// When the player joined, also the leaderboard tie-break order.
    pub created_at: SystemTime,
}
