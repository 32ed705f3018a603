//! DTO definitions used by the questionnaire admin REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{QuestionEntity, QuestionnaireEntity},
    dto::format_system_time,
};

/// Incoming question definition when creating or replacing a questionnaire.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct QuestionInput {
    #[validate(length(min = 1, max = 500))]
    pub question_text: String,
    #[validate(length(min = 1, max = 200))]
    pub correct_answer: String,
    #[validate(length(min = 1, max = 200))]
    pub wrong_answer_1: String,
    #[validate(length(min = 1, max = 200))]
    pub wrong_answer_2: String,
    #[validate(length(min = 1, max = 200))]
    pub wrong_answer_3: String,
}

/// Payload describing a questionnaire and its full question list. Saving
/// replaces any previous questions.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SaveQuestionnaireRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(nested)]
    pub questions: Vec<QuestionInput>,
}

/// Minimal projection of a questionnaire when listed for administrators.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionnaireListItem {
    pub id: Uuid,
    pub title: String,
    pub question_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

impl From<(QuestionnaireEntity, usize)> for QuestionnaireListItem {
    fn from((questionnaire, question_count): (QuestionnaireEntity, usize)) -> Self {
        Self {
            id: questionnaire.id,
            title: questionnaire.title,
            question_count,
            created_at: format_system_time(questionnaire.created_at),
            updated_at: format_system_time(questionnaire.updated_at),
        }
    }
}

/// Admin projection of a question, including the answer key.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionSummary {
    pub id: Uuid,
    pub order_number: u32,
    pub question_text: String,
    pub correct_answer: String,
    pub wrong_answers: [String; 3],
}

impl From<QuestionEntity> for QuestionSummary {
    fn from(question: QuestionEntity) -> Self {
        Self {
            id: question.id,
            order_number: question.order_number,
            question_text: question.question_text,
            correct_answer: question.correct_answer,
            wrong_answers: [
                question.wrong_answer_1,
                question.wrong_answer_2,
                question.wrong_answer_3,
            ],
        }
    }
}

/// Full questionnaire returned once created or fetched individually.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionnaireDetail {
    pub id: Uuid,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    pub questions: Vec<QuestionSummary>,
}

impl From<(QuestionnaireEntity, Vec<QuestionEntity>)> for QuestionnaireDetail {
    fn from((questionnaire, questions): (QuestionnaireEntity, Vec<QuestionEntity>)) -> Self {
        Self {
            id: questionnaire.id,
            title: questionnaire.title,
            created_at: format_system_time(questionnaire.created_at),
            updated_at: format_system_time(questionnaire.updated_at),
            questions: questions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Generic action acknowledgement used by admin and host endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}
