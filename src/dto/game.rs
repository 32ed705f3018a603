use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{GameQuestionEntity, GameRoomEntity, PlayerEntity, QuestionEntity, RoomStatus},
    dto::format_system_time,
    state::{
        phase::{AnswerLetter, GamePhase},
        wildcard::{WildcardKind, WildcardSlate, WildcardState},
    },
};

/// Payload used to open a new game room for a questionnaire.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoomRequest {
    /// Questionnaire the room will play through.
    pub questionnaire_id: Uuid,
}

/// Request to move the current question to another phase.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPhaseRequest {
    /// Target phase; the host may pick any phase directly.
    pub phase: GamePhase,
}

/// Public projection of a game room exposed to REST/SSE clients.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct RoomSummary {
    pub id: Uuid,
    pub questionnaire_id: Uuid,
    pub code: String,
    pub status: RoomStatus,
    pub current_phase: GamePhase,
    pub current_question_id: Option<Uuid>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<GameRoomEntity> for RoomSummary {
    fn from(room: GameRoomEntity) -> Self {
        Self {
            id: room.id,
            questionnaire_id: room.questionnaire_id,
            code: room.code,
            status: room.status,
            current_phase: room.current_phase,
            current_question_id: room.current_question_id,
            created_at: format_system_time(room.created_at),
            updated_at: format_system_time(room.updated_at),
        }
    }
}

/// Projection of one wildcard for REST/SSE clients.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct WildcardSummary {
    /// Whether the wildcard has been spent.
    pub used: bool,
    /// Letters struck out when an elimination wildcard was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eliminated: Option<Vec<AnswerLetter>>,
}

impl From<&WildcardState> for WildcardSummary {
    fn from(state: &WildcardState) -> Self {
        Self {
            used: !state.is_available(),
            eliminated: state.eliminated().map(|letters| letters.to_vec()),
        }
    }
}

/// Projection of a player's full wildcard slate.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct WildcardSlateSummary {
    pub phone_call: WildcardSummary,
    pub phone_search: WildcardSummary,
    pub fifty_fifty: WildcardSummary,
    pub roulette: WildcardSummary,
}

impl From<&WildcardSlate> for WildcardSlateSummary {
    fn from(slate: &WildcardSlate) -> Self {
        Self {
            phone_call: slate.get(WildcardKind::PhoneCall).into(),
            phone_search: slate.get(WildcardKind::PhoneSearch).into(),
            fifty_fifty: slate.get(WildcardKind::FiftyFifty).into(),
            roulette: slate.get(WildcardKind::Roulette).into(),
        }
    }
}

/// Public projection of a player exposed to REST/SSE clients.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PlayerSummary {
    pub id: Uuid,
    pub name: String,
    pub score: u32,
    /// Whether an answer has been recorded for the current question.
    pub has_answered: bool,
    /// The submitted answer text, shown on host and display surfaces.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_answer: Option<String>,
    pub wildcards: WildcardSlateSummary,
}

impl From<PlayerEntity> for PlayerSummary {
    fn from(player: PlayerEntity) -> Self {
        Self {
            id: player.id,
            name: player.name,
            score: player.score,
            has_answered: player.current_answer.is_some(),
            current_answer: player.current_answer,
            wildcards: (&player.wildcards).into(),
        }
    }
}

/// Host view of the current question: every slot and the correct letter.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct GameQuestionView {
    pub question_id: Uuid,
    pub order_number: u32,
    pub question_text: String,
    pub answers: [String; 4],
    pub correct_letter: AnswerLetter,
}

impl From<(&QuestionEntity, &GameQuestionEntity)> for GameQuestionView {
    fn from((question, arrangement): (&QuestionEntity, &GameQuestionEntity)) -> Self {
        Self {
            question_id: question.id,
            order_number: arrangement.order_number,
            question_text: question.question_text.clone(),
            answers: arrangement.answers.clone(),
            correct_letter: arrangement.correct_letter,
        }
    }
}

/// Full room state returned to the host after any control action.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomStateResponse {
    pub room: RoomSummary,
    pub players: Vec<PlayerSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<GameQuestionView>,
}

/// Response describing the room after moving to the next question.
#[derive(Debug, Serialize, ToSchema)]
pub struct NextQuestionResponse {
    /// True when the play order was exhausted and the game was finished.
    pub finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<GameQuestionView>,
}

/// One row of the final standings.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    /// 1-based rank; players with equal scores share a rank.
    pub rank: u32,
    pub player_id: Uuid,
    pub name: String,
    pub score: u32,
}

/// Response returned when a game is finished, gathering final standings.
#[derive(Debug, Serialize, ToSchema)]
pub struct FinishGameResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Host request to spend a wildcard on behalf of a player.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GrantWildcardRequest {
    pub player_id: Uuid,
    pub wild_card_type: WildcardKind,
    /// For roulette only: how many wrong answers to strike (0-3), as decided
    /// by the physical minigame.
    #[serde(default)]
    pub eliminate_count: Option<u8>,
}

impl Validate for GrantWildcardRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(count) = self.eliminate_count {
            if count > 3 {
                let mut err = validator::ValidationError::new("eliminate_count_range");
                err.message = Some("eliminate_count must be between 0 and 3".into());
                errors.add("eliminate_count", err);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Host request targeting one wildcard of one player (complete or revive).
#[derive(Debug, Deserialize, ToSchema)]
pub struct WildcardActionRequest {
    pub player_id: Uuid,
    pub wild_card_type: WildcardKind,
}

/// Outcome of spending a wildcard.
#[derive(Debug, Serialize, ToSchema)]
pub struct WildcardResultResponse {
    pub wild_card_type: WildcardKind,
    /// Struck-out letters for the elimination kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrong_answers: Option<Vec<AnswerLetter>>,
    /// Countdown the host should run for the assistance kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown_seconds: Option<u64>,
}
