use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::admin::{QuestionnaireDetail, QuestionnaireListItem, SaveQuestionnaireRequest},
    error::AppError,
    services::questionnaire_service,
    state::SharedState,
};

/// Questionnaire management endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/questionnaires",
            get(list_questionnaires).post(create_questionnaire),
        )
        .route(
            "/questionnaires/{id}",
            get(get_questionnaire)
                .put(update_questionnaire)
                .delete(delete_questionnaire),
        )
}

/// Retrieve all questionnaires with their question counts.
#[utoipa::path(
    get,
    path = "/questionnaires",
    tag = "admin",
    responses((status = 200, description = "List available questionnaires", body = [QuestionnaireListItem]))
)]
pub async fn list_questionnaires(
    State(state): State<SharedState>,
) -> Result<Json<Vec<QuestionnaireListItem>>, AppError> {
    Ok(Json(
        questionnaire_service::list_questionnaires(&state).await?,
    ))
}

/// Create a questionnaire together with its full question list.
#[utoipa::path(
    post,
    path = "/questionnaires",
    tag = "admin",
    request_body = SaveQuestionnaireRequest,
    responses(
        (status = 201, description = "Questionnaire created", body = QuestionnaireDetail),
        (status = 400, description = "Invalid questionnaire payload")
    )
)]
pub async fn create_questionnaire(
    State(state): State<SharedState>,
    Json(payload): Json<SaveQuestionnaireRequest>,
) -> Result<(StatusCode, Json<QuestionnaireDetail>), AppError> {
    payload.validate()?;
    let detail = questionnaire_service::create_questionnaire(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Retrieve a questionnaire by its identifier, answer key included.
#[utoipa::path(
    get,
    path = "/questionnaires/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Identifier of the questionnaire")),
    responses(
        (status = 200, description = "Questionnaire", body = QuestionnaireDetail),
        (status = 404, description = "Questionnaire not found")
    )
)]
pub async fn get_questionnaire(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionnaireDetail>, AppError> {
    Ok(Json(
        questionnaire_service::get_questionnaire(&state, id).await?,
    ))
}

/// Replace a questionnaire's title and question list.
#[utoipa::path(
    put,
    path = "/questionnaires/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Identifier of the questionnaire")),
    request_body = SaveQuestionnaireRequest,
    responses(
        (status = 200, description = "Questionnaire replaced", body = QuestionnaireDetail),
        (status = 404, description = "Questionnaire not found")
    )
)]
pub async fn update_questionnaire(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SaveQuestionnaireRequest>,
) -> Result<Json<QuestionnaireDetail>, AppError> {
    payload.validate()?;
    Ok(Json(
        questionnaire_service::update_questionnaire(&state, id, payload).await?,
    ))
}

/// Delete a questionnaire and its questions.
#[utoipa::path(
    delete,
    path = "/questionnaires/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Identifier of the questionnaire")),
    responses(
        (status = 204, description = "Questionnaire deleted"),
        (status = 404, description = "Questionnaire not found")
    )
)]
pub async fn delete_questionnaire(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    questionnaire_service::delete_questionnaire(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
