use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentUser};
use crate::api::validation::{validate_correct_options, validate_payload};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::question::{QuestionCreate, QuestionListResponse, QuestionResponse};

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    skip: Option<i64>,
    #[serde(default)]
    limit: Option<i64>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_question).get(list_questions))
        .route("/:question_id", get(get_question).delete(delete_question))
}

async fn create_question(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    require_permission(&state, &user, "question:create").await?;
    validate_payload(&payload)?;
    validate_correct_options(&payload.options, &payload.correct_options)?;

    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            content: &payload.content,
            question_type: payload.question_type,
            options: serde_json::json!(payload.options),
            correct_options: serde_json::json!(payload.correct_options),
            category: payload.category.as_deref(),
            created_by: &user.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question))))
}

async fn list_questions(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<QuestionListResponse>, ApiError> {
    require_permission(&state, &user, "question:create").await?;

    let items = repositories::questions::list(
        state.db(),
        params.category.as_deref(),
        params.skip.unwrap_or(0),
        params.limit.unwrap_or(50),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;

    Ok(Json(QuestionListResponse {
        items: items.into_iter().map(QuestionResponse::from_db).collect(),
    }))
}

async fn get_question(
    Path(question_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuestionResponse>, ApiError> {
    require_permission(&state, &user, "question:create").await?;

    let question = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    Ok(Json(QuestionResponse::from_db(question)))
}

async fn delete_question(
    Path(question_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    require_permission(&state, &user, "question:delete").await?;

    let removed = repositories::questions::delete_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Question not found".to_string()))
    }
}
