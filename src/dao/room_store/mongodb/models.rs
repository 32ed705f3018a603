use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    dao::models::{
        GameQuestionEntity, GameRoomEntity, PlayerEntity, QuestionEntity, QuestionnaireEntity,
        RoomStatus,
    },
    state::{
        phase::{AnswerLetter, GamePhase},
        wildcard::WildcardSlate,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionnaireDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    title: String,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<QuestionnaireEntity> for QuestionnaireDocument {
    fn from(value: QuestionnaireEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<QuestionnaireDocument> for QuestionnaireEntity {
    fn from(value: QuestionnaireDocument) -> Self {
        Self {
            id: value.id,
            title: value.title,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    questionnaire_id: Uuid,
    order_number: u32,
    question_text: String,
    correct_answer: String,
    wrong_answer_1: String,
    wrong_answer_2: String,
    wrong_answer_3: String,
}

impl From<QuestionEntity> for QuestionDocument {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            questionnaire_id: value.questionnaire_id,
            order_number: value.order_number,
            question_text: value.question_text,
            correct_answer: value.correct_answer,
            wrong_answer_1: value.wrong_answer_1,
            wrong_answer_2: value.wrong_answer_2,
            wrong_answer_3: value.wrong_answer_3,
        }
    }
}

impl From<QuestionDocument> for QuestionEntity {
    fn from(value: QuestionDocument) -> Self {
        Self {
            id: value.id,
            questionnaire_id: value.questionnaire_id,
            order_number: value.order_number,
            question_text: value.question_text,
            correct_answer: value.correct_answer,
            wrong_answer_1: value.wrong_answer_1,
            wrong_answer_2: value.wrong_answer_2,
            wrong_answer_3: value.wrong_answer_3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    questionnaire_id: Uuid,
    code: String,
    status: RoomStatus,
    current_phase: GamePhase,
    current_question_id: Option<Uuid>,
    scored_question_ids: Vec<Uuid>,
    // Signed in storage so the optimistic-lock filter can use plain bson
    // integers.
    version: i64,
    created_at: DateTime,
    updated_at: DateTime,
}

impl RoomDocument {
    /// Revision this document expects to find in storage when replacing.
    pub fn expected_version(&self) -> i64 {
        self.version - 1
    }
}

impl From<GameRoomEntity> for RoomDocument {
    fn from(value: GameRoomEntity) -> Self {
        Self {
            id: value.id,
            questionnaire_id: value.questionnaire_id,
            code: value.code,
            status: value.status,
            current_phase: value.current_phase,
            current_question_id: value.current_question_id,
            scored_question_ids: value.scored_question_ids,
            version: value.version as i64,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<RoomDocument> for GameRoomEntity {
    fn from(value: RoomDocument) -> Self {
        Self {
            id: value.id,
            questionnaire_id: value.questionnaire_id,
            code: value.code,
            status: value.status,
            current_phase: value.current_phase,
            current_question_id: value.current_question_id,
            scored_question_ids: value.scored_question_ids,
            version: value.version.max(0) as u64,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameQuestionDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    game_room_id: Uuid,
    question_id: Uuid,
    order_number: u32,
    answers: [String; 4],
    correct_letter: AnswerLetter,
}

impl From<GameQuestionEntity> for GameQuestionDocument {
    fn from(value: GameQuestionEntity) -> Self {
        Self {
            id: value.id,
            game_room_id: value.game_room_id,
            question_id: value.question_id,
            order_number: value.order_number,
            answers: value.answers,
            correct_letter: value.correct_letter,
        }
    }
}

impl From<GameQuestionDocument> for GameQuestionEntity {
    fn from(value: GameQuestionDocument) -> Self {
        Self {
            id: value.id,
            game_room_id: value.game_room_id,
            question_id: value.question_id,
            order_number: value.order_number,
            answers: value.answers,
            correct_letter: value.correct_letter,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    game_room_id: Uuid,
    name: String,
    score: u32,
    current_answer: Option<String>,
    session_token: String,
    wildcards: WildcardSlate,
    created_at: DateTime,
}

impl From<PlayerEntity> for PlayerDocument {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            game_room_id: value.game_room_id,
            name: value.name,
            score: value.score,
            current_answer: value.current_answer,
            session_token: value.session_token,
            wildcards: value.wildcards,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<PlayerDocument> for PlayerEntity {
    fn from(value: PlayerDocument) -> Self {
        Self {
            id: value.id,
            game_room_id: value.game_room_id,
            name: value.name,
            score: value.score,
            current_answer: value.current_answer,
            session_token: value.session_token,
            wildcards: value.wildcards,
            created_at: value.created_at.to_system_time(),
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
