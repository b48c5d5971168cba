use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentUser};
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::db::models::{Exam, User};
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::exam::{
    AssignmentCreate, AssignmentResponse, ExamCreate, ExamListResponse, ExamResponse, ExamUpdate,
    ResultListResponse, ResultResponse,
};

#[derive(Debug, Deserialize)]
pub(super) struct ListParams {
    #[serde(default)]
    pub(super) skip: Option<i64>,
    #[serde(default)]
    pub(super) limit: Option<i64>,
    #[serde(default)]
    pub(super) only_active: Option<bool>,
}

pub(super) async fn create_exam(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    require_permission(&state, &user, "exam:create").await?;
    validate_payload(&payload)?;

    let start_time = to_primitive_utc(payload.start_time);
    let end_time = to_primitive_utc(payload.end_time);
    if end_time <= start_time {
        return Err(ApiError::BadRequest("end_time must be after start_time".to_string()));
    }

    let now = primitive_now_utc();
    let exam = repositories::exams::create(
        state.db(),
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            title: &payload.title,
            description: payload.description.as_deref(),
            question_count: payload.question_count,
            time_limit_minutes: payload.time_limit_minutes,
            start_time,
            end_time,
            timezone: &payload.timezone,
            shuffle_questions: payload.shuffle_questions,
            shuffle_answers: payload.shuffle_answers,
            require_all_questions: payload.require_all_questions,
            max_attempts: payload.max_attempts,
            is_active: payload.is_active,
            is_public: payload.is_public,
            category: payload.category.as_deref(),
            created_by: &user.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    tracing::info!(exam_id = %exam.id, created_by = %user.id, "Exam created");

    Ok((StatusCode::CREATED, Json(ExamResponse::from_db(exam))))
}

pub(super) async fn update_exam(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ExamUpdate>,
) -> Result<Json<ExamResponse>, ApiError> {
    require_permission(&state, &user, "exam:edit").await?;
    validate_payload(&payload)?;

    let exam = fetch_exam(&state, &exam_id).await?;
    require_ownership(&user, &exam)?;

    let new_start = payload.start_time.map(to_primitive_utc).unwrap_or(exam.start_time);
    let new_end = payload.end_time.map(to_primitive_utc).unwrap_or(exam.end_time);
    if new_end <= new_start {
        return Err(ApiError::BadRequest("end_time must be after start_time".to_string()));
    }

    let updated = repositories::exams::update(
        state.db(),
        &exam_id,
        repositories::exams::UpdateExam {
            title: payload.title,
            description: payload.description,
            question_count: payload.question_count,
            time_limit_minutes: payload.time_limit_minutes,
            start_time: payload.start_time.map(to_primitive_utc),
            end_time: payload.end_time.map(to_primitive_utc),
            timezone: payload.timezone,
            shuffle_questions: payload.shuffle_questions,
            shuffle_answers: payload.shuffle_answers,
            require_all_questions: payload.require_all_questions,
            max_attempts: payload.max_attempts,
            is_active: payload.is_active,
            is_public: payload.is_public,
            category: payload.category,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update exam"))?;

    Ok(Json(ExamResponse::from_db(updated)))
}

pub(super) async fn delete_exam(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    require_permission(&state, &user, "exam:delete").await?;

    let exam = fetch_exam(&state, &exam_id).await?;
    require_ownership(&user, &exam)?;

    repositories::exams::delete_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;

    tracing::info!(exam_id = %exam_id, deleted_by = %user.id, "Exam deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn get_exam(
    Path(exam_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = fetch_exam(&state, &exam_id).await?;
    Ok(Json(ExamResponse::from_db(exam)))
}

pub(super) async fn list_exams(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ExamListResponse>, ApiError> {
    let only_active = params.only_active.unwrap_or(false);
    let skip = params.skip.unwrap_or(0);
    let limit = params.limit.unwrap_or(50);

    let items = repositories::exams::list(state.db(), only_active, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;
    let total = repositories::exams::count(state.db(), only_active)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count exams"))?;

    Ok(Json(ExamListResponse {
        items: items.into_iter().map(ExamResponse::from_db).collect(),
        total,
    }))
}

pub(super) async fn assign_exam(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AssignmentCreate>,
) -> Result<(StatusCode, Json<AssignmentResponse>), ApiError> {
    require_permission(&state, &user, "exam:assign").await?;
    validate_payload(&payload)?;

    fetch_exam(&state, &exam_id).await?;

    let assignee = repositories::users::find_by_id(state.db(), &payload.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?;
    if assignee.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let assignment = repositories::assignments::upsert(
        state.db(),
        repositories::assignments::CreateAssignment {
            id: &Uuid::new_v4().to_string(),
            exam_id: &exam_id,
            user_id: &payload.user_id,
            max_attempts: payload.max_attempts,
            assigned_by: &user.id,
            assigned_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to assign exam"))?;

    Ok((StatusCode::CREATED, Json(AssignmentResponse::from_db(assignment))))
}

pub(super) async fn unassign_exam(
    Path((exam_id, user_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    require_permission(&state, &user, "exam:assign").await?;

    let removed = repositories::assignments::delete_for_user_exam(state.db(), &exam_id, &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to remove assignment"))?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Assignment not found".to_string()))
    }
}

pub(super) async fn list_assignments(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AssignmentResponse>>, ApiError> {
    require_permission(&state, &user, "exam:assign").await?;

    fetch_exam(&state, &exam_id).await?;

    let assignments = repositories::assignments::list_by_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list assignments"))?;

    Ok(Json(assignments.into_iter().map(AssignmentResponse::from_db).collect()))
}

pub(super) async fn list_results(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ResultListResponse>, ApiError> {
    require_permission(&state, &user, "exam:results").await?;

    fetch_exam(&state, &exam_id).await?;

    let skip = params.skip.unwrap_or(0);
    let limit = params.limit.unwrap_or(50);

    let items = repositories::results::list_by_exam(state.db(), &exam_id, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list results"))?;
    let total = repositories::results::count_by_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count results"))?;

    Ok(Json(ResultListResponse {
        items: items.into_iter().map(ResultResponse::from_db).collect(),
        total,
    }))
}

async fn fetch_exam(state: &AppState, exam_id: &str) -> Result<Exam, ApiError> {
    repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))
}

/// Non-admin editors may only touch their own exams.
fn require_ownership(user: &User, exam: &Exam) -> Result<(), ApiError> {
    if user.role == UserRole::Admin || exam.created_by == user.id {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Not the exam owner"))
    }
}
