//! DTO definitions for the player-facing API, including the phase-filtered
//! question projection.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{GameQuestionEntity, QuestionEntity},
    dto::{
        game::{PlayerSummary, RoomSummary},
        validation::{validate_player_name, validate_room_code},
    },
    state::phase::{AnswerLetter, GamePhase},
};

/// Payload sent by a player to enter a waiting room.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinRoomRequest {
    /// Six-character join code shown on the host screen.
    pub code: String,
    /// Display name, unique within the room (case-sensitive).
    pub name: String,
}

impl Validate for JoinRoomRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_room_code(&self.code) {
            errors.add("code", e);
        }
        if let Err(e) = validate_player_name(&self.name) {
            errors.add("name", e);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Response returned once a player has joined a room.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinRoomResponse {
    pub room: RoomSummary,
    pub player: PlayerSummary,
    /// Secret the client must echo in `x-session-token` on later mutations.
    pub session_token: String,
}

/// Payload carrying a player's answer for the current question.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitAnswerRequest {
    /// The exact answer text as displayed; resolved against the room's
    /// arrangement on reveal.
    pub answer: String,
}

/// Question projection a player is allowed to see at the current phase.
///
/// Slots that the phase has not revealed yet are `null`, and the correct
/// letter only appears during reveal.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerQuestionView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    pub answers: [Option<String>; 4],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_letter: Option<AnswerLetter>,
}

impl PlayerQuestionView {
    /// Apply phase visibility to a question and its arrangement.
    pub fn project(
        question: &QuestionEntity,
        arrangement: &GameQuestionEntity,
        phase: GamePhase,
    ) -> Self {
        let answers = AnswerLetter::ALL.map(|letter| {
            phase
                .shows_answer(letter)
                .then(|| arrangement.answers[letter.index()].clone())
        });

        Self {
            question_text: phase
                .shows_question()
                .then(|| question.question_text.clone()),
            answers,
            correct_letter: phase.shows_correct().then_some(arrangement.correct_letter),
        }
    }
}

/// Full state a player polls after every event signal.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerStateResponse {
    pub room: RoomSummary,
    pub player: PlayerSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<PlayerQuestionView>,
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn fixtures() -> (QuestionEntity, GameQuestionEntity) {
        let question = QuestionEntity {
            id: Uuid::new_v4(),
            questionnaire_id: Uuid::new_v4(),
            order_number: 1,
            question_text: "Capital of France?".to_owned(),
            correct_answer: "Paris".to_owned(),
            wrong_answer_1: "Lyon".to_owned(),
            wrong_answer_2: "Marseille".to_owned(),
            wrong_answer_3: "Toulouse".to_owned(),
        };
        let arrangement = GameQuestionEntity {
            id: Uuid::new_v4(),
            game_room_id: Uuid::new_v4(),
            question_id: question.id,
            order_number: 1,
            answers: [
                "Lyon".to_owned(),
                "Paris".to_owned(),
                "Marseille".to_owned(),
                "Toulouse".to_owned(),
            ],
            correct_letter: AnswerLetter::B,
        };
        (question, arrangement)
    }

    #[test]
    fn hidden_phase_projects_nothing() {
        let (question, arrangement) = fixtures();
        let view = PlayerQuestionView::project(&question, &arrangement, GamePhase::Hidden);
        assert!(view.question_text.is_none());
        assert!(view.answers.iter().all(Option::is_none));
        assert!(view.correct_letter.is_none());
    }

    #[test]
    fn answer_phases_reveal_prefixes() {
        let (question, arrangement) = fixtures();
        let view = PlayerQuestionView::project(&question, &arrangement, GamePhase::AnswerB);
        assert_eq!(view.question_text.as_deref(), Some("Capital of France?"));
        assert_eq!(view.answers[0].as_deref(), Some("Lyon"));
        assert_eq!(view.answers[1].as_deref(), Some("Paris"));
        assert!(view.answers[2].is_none());
        assert!(view.answers[3].is_none());
        assert!(view.correct_letter.is_none());
    }

    #[test]
    fn locked_shows_everything_but_the_answer_key() {
        let (question, arrangement) = fixtures();
        let view = PlayerQuestionView::project(&question, &arrangement, GamePhase::Locked);
        assert!(view.answers.iter().all(Option::is_some));
        assert!(view.correct_letter.is_none());
    }

    #[test]
    fn reveal_discloses_the_correct_letter() {
        let (question, arrangement) = fixtures();
        let view = PlayerQuestionView::project(&question, &arrangement, GamePhase::Reveal);
        assert_eq!(view.correct_letter, Some(AnswerLetter::B));
    }

    #[test]
    fn join_request_validation() {
        let ok = JoinRoomRequest {
            code: "ABCDEF".to_owned(),
            name: "Ana".to_owned(),
        };
        assert!(ok.validate().is_ok());

        let bad_code = JoinRoomRequest {
            code: "abc".to_owned(),
            name: "Ana".to_owned(),
        };
        assert!(bad_code.validate().is_err());

        let blank_name = JoinRoomRequest {
            code: "ABCDEF".to_owned(),
            name: "   ".to_owned(),
        };
        assert!(blank_name.validate().is_err());
    }
}
