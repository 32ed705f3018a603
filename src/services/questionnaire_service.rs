//! Business logic powering the questionnaire admin routes.

use std::time::SystemTime;

use uuid::Uuid;

use crate::{
    dao::models::{QuestionEntity, QuestionnaireEntity},
    dto::admin::{
        QuestionInput, QuestionnaireDetail, QuestionnaireListItem, SaveQuestionnaireRequest,
    },
    error::ServiceError,
    state::SharedState,
};

/// Create a questionnaire together with its full question list.
pub async fn create_questionnaire(
    state: &SharedState,
    request: SaveQuestionnaireRequest,
) -> Result<QuestionnaireDetail, ServiceError> {
    let store = state.require_room_store().await?;

    validate_question_count(state, &request.questions)?;

    let now = SystemTime::now();
    let questionnaire = QuestionnaireEntity {
        id: Uuid::new_v4(),
        title: request.title.trim().to_owned(),
        created_at: now,
        updated_at: now,
    };
    let questions = build_questions(questionnaire.id, request.questions);

    store
        .save_questionnaire(questionnaire.clone(), questions.clone())
        .await?;

    Ok((questionnaire, questions).into())
}

/// Replace an existing questionnaire's title and questions.
pub async fn update_questionnaire(
    state: &SharedState,
    id: Uuid,
    request: SaveQuestionnaireRequest,
) -> Result<QuestionnaireDetail, ServiceError> {
    let store = state.require_room_store().await?;

    let Some(existing) = store.find_questionnaire(id).await? else {
        return Err(ServiceError::NotFound(format!(
            "questionnaire `{id}` not found"
        )));
    };

    validate_question_count(state, &request.questions)?;

    let questionnaire = QuestionnaireEntity {
        id,
        title: request.title.trim().to_owned(),
        created_at: existing.created_at,
        updated_at: SystemTime::now(),
    };
    let questions = build_questions(id, request.questions);

    store
        .save_questionnaire(questionnaire.clone(), questions.clone())
        .await?;

    Ok((questionnaire, questions).into())
}

/// List every questionnaire with its question count.
pub async fn list_questionnaires(
    state: &SharedState,
) -> Result<Vec<QuestionnaireListItem>, ServiceError> {
    let store = state.require_room_store().await?;
    let questionnaires = store.list_questionnaires().await?;

    let mut items = Vec::with_capacity(questionnaires.len());
    for questionnaire in questionnaires {
        let question_count = store.list_questions(questionnaire.id).await?.len();
        items.push((questionnaire, question_count).into());
    }

    Ok(items)
}

/// Fetch a questionnaire and its ordered questions.
pub async fn get_questionnaire(
    state: &SharedState,
    id: Uuid,
) -> Result<QuestionnaireDetail, ServiceError> {
    let store = state.require_room_store().await?;

    let Some(questionnaire) = store.find_questionnaire(id).await? else {
        return Err(ServiceError::NotFound(format!(
            "questionnaire `{id}` not found"
        )));
    };
    let questions = store.list_questions(id).await?;

    Ok((questionnaire, questions).into())
}

/// Delete a questionnaire and its questions.
pub async fn delete_questionnaire(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_room_store().await?;

    if !store.delete_questionnaire(id).await? {
        return Err(ServiceError::NotFound(format!(
            "questionnaire `{id}` not found"
        )));
    }

    Ok(())
}

fn validate_question_count(
    state: &SharedState,
    questions: &[QuestionInput],
) -> Result<(), ServiceError> {
    if questions.is_empty() {
        return Err(ServiceError::InvalidInput(
            "a questionnaire requires at least one question".into(),
        ));
    }

    let max = state.config().max_questions;
    if questions.len() > max {
        return Err(ServiceError::InvalidInput(format!(
            "a questionnaire may hold at most {max} questions (got {})",
            questions.len()
        )));
    }

    Ok(())
}

fn build_questions(questionnaire_id: Uuid, inputs: Vec<QuestionInput>) -> Vec<QuestionEntity> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| QuestionEntity {
            id: Uuid::new_v4(),
            questionnaire_id,
            order_number: index as u32 + 1,
            question_text: input.question_text.trim().to_owned(),
            correct_answer: input.correct_answer.trim().to_owned(),
            wrong_answer_1: input.wrong_answer_1.trim().to_owned(),
            wrong_answer_2: input.wrong_answer_2.trim().to_owned(),
            wrong_answer_3: input.wrong_answer_3.trim().to_owned(),
        })
        .collect()
}
