use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use time::Duration;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::OptionalUser;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::{ExamAttempt, Question};
use crate::db::types::AttemptStatus;
use crate::repositories;
use crate::schemas::attempt::{
    AttemptQuestionView, AttemptResponse, SubmitRequest, SubmitResponse,
};
use crate::services::errors::AttemptError;
use crate::services::question_sampler::SampledQuestion;
use crate::services::scoring::AnswerKey;
use crate::services::{attempt_ledger, attempt_window, exam_access, question_sampler, scoring};

/// The gate pipeline runs strictly in order: visibility/assignment, time
/// window, attempt ledger, sampler. The first failure is terminal and is
/// returned verbatim; nothing is written before the sampler succeeds.
pub(super) async fn start_attempt(
    Path(exam_id): Path<String>,
    OptionalUser(identity): OptionalUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<AttemptResponse>), ApiError> {
    let now = primitive_now_utc();

    let exam = repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or(AttemptError::ExamNotFound)?;

    let assignment = match &identity {
        Some(user) => {
            repositories::assignments::find_for_user_exam(state.db(), &exam.id, &user.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to load assignment"))?
        }
        None => None,
    };

    let access = exam_access::authorize_taker(&exam, identity.as_ref(), assignment.as_ref())?;
    attempt_window::check_window(&exam, now)?;

    let keys = identity
        .as_ref()
        .map(attempt_ledger::IdentityKeys::from_user)
        .unwrap_or_default();
    let prior = attempt_ledger::count_attempts(state.db(), &exam.id, &keys)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;
    attempt_ledger::enforce_limit(prior, access.effective_max_attempts)?;

    let pool = repositories::questions::list_pool(state.db(), exam.category.as_deref())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question pool"))?;

    let seed = rand::random::<u64>();
    let sample_seed = i64::from_ne_bytes(seed.to_ne_bytes());
    let mut rng = StdRng::seed_from_u64(seed);
    let sampled = question_sampler::draw(&pool, &exam, &mut rng)?;

    let deadline_candidate = now + Duration::minutes(exam.time_limit_minutes as i64);
    let deadline =
        if deadline_candidate > exam.end_time { exam.end_time } else { deadline_candidate };

    let attempt_id = Uuid::new_v4().to_string();
    let attempt_number = (prior + 1) as i32;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::attempts::create(
        &mut *tx,
        repositories::attempts::CreateAttempt {
            id: &attempt_id,
            exam_id: &exam.id,
            student_id: identity.as_ref().map(|user| user.id.as_str()),
            student_name: identity.as_ref().map(|user| user.full_name.as_str()),
            sample_seed,
            attempt_number,
            started_at: now,
            deadline,
            status: AttemptStatus::Active,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create attempt"))?;

    for item in &sampled {
        repositories::attempts::insert_question(
            &mut *tx,
            &attempt_id,
            &item.question.id,
            item.position,
            serde_json::json!(&item.option_order),
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to snapshot attempt questions"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::counter!("attempts_started_total").increment(1);
    tracing::info!(
        exam_id = %exam.id,
        attempt_id = %attempt_id,
        attempt_number,
        anonymous = identity.is_none(),
        "Attempt started"
    );

    let questions = sampled.into_iter().map(sampled_to_view).collect();

    Ok((
        StatusCode::CREATED,
        Json(AttemptResponse {
            attempt_id,
            exam_id: exam.id,
            attempt_number,
            started_at: format_primitive(now),
            deadline: format_primitive(deadline),
            time_limit_minutes: exam.time_limit_minutes,
            questions,
        }),
    ))
}

/// Re-serves the attempt's own snapshot, so a page refresh mid-attempt never
/// changes the taker's questions.
pub(super) async fn get_attempt(
    Path(attempt_id): Path<String>,
    OptionalUser(identity): OptionalUser,
    State(state): State<AppState>,
) -> Result<Json<AttemptResponse>, ApiError> {
    let attempt = fetch_attempt(&state, &attempt_id).await?;
    require_attempt_ownership(&attempt, identity.as_ref().map(|user| user.id.as_str()))?;

    if attempt.status != AttemptStatus::Active {
        return Err(ApiError::BadRequest("Attempt is not active".to_string()));
    }

    let exam = repositories::exams::find_by_id(state.db(), &attempt.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or(AttemptError::ExamNotFound)?;

    let snapshot = load_snapshot(&state, &attempt.id).await?;
    let questions = snapshot
        .into_iter()
        .map(|(question, position, option_order)| {
            sampled_to_view(SampledQuestion { question, position, option_order })
        })
        .collect();

    Ok(Json(AttemptResponse {
        attempt_id: attempt.id,
        exam_id: attempt.exam_id,
        attempt_number: attempt.attempt_number,
        started_at: format_primitive(attempt.started_at),
        deadline: format_primitive(attempt.deadline),
        time_limit_minutes: exam.time_limit_minutes,
        questions,
    }))
}

pub(super) async fn submit_attempt(
    Path(attempt_id): Path<String>,
    OptionalUser(identity): OptionalUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let now = primitive_now_utc();

    let attempt = fetch_attempt(&state, &attempt_id).await?;
    require_attempt_ownership(&attempt, identity.as_ref().map(|user| user.id.as_str()))?;

    if attempt.status != AttemptStatus::Active {
        return Err(ApiError::BadRequest("Attempt is not active".to_string()));
    }

    let exam = repositories::exams::find_by_id(state.db(), &attempt.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or(AttemptError::ExamNotFound)?;

    let snapshot = load_snapshot(&state, &attempt.id).await?;
    let keys_view: Vec<AnswerKey<'_>> = snapshot
        .iter()
        .map(|(question, _, option_order)| AnswerKey { question, option_order })
        .collect();

    if exam.require_all_questions && !scoring::all_answered(&keys_view, &payload.answers) {
        return Err(ApiError::BadRequest("All questions must be answered".to_string()));
    }

    let graded = scoring::grade(&keys_view, &payload.answers);

    // The ledger is reconciled at submission with the same OR-matching rule
    // used at start; for anonymous takers this is the first moment their
    // claimed identity is known.
    let ledger_keys = match &identity {
        Some(user) => attempt_ledger::IdentityKeys::from_user(user),
        None => attempt_ledger::IdentityKeys::from_claimed(
            payload.student_id.as_deref(),
            payload.student_name.as_deref(),
        ),
    };
    let prior = attempt_ledger::count_attempts(state.db(), &exam.id, &ledger_keys)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;
    let attempt_number = (prior + 1) as i32;

    let (student_id, student_name) = match &identity {
        Some(user) => (Some(user.id.as_str()), Some(user.full_name.as_str())),
        None => (payload.student_id.as_deref(), payload.student_name.as_deref()),
    };

    let elapsed = now - attempt.started_at;
    let time_spent_seconds = elapsed.whole_seconds().clamp(0, i32::MAX as i64) as i32;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::results::create(
        &mut *tx,
        repositories::results::CreateResult {
            id: &Uuid::new_v4().to_string(),
            exam_id: &exam.id,
            student_id,
            student_name,
            score: graded.score,
            total_questions: graded.total_questions,
            correct_answers: graded.correct_answers,
            time_spent_seconds,
            attempt_number,
            completed_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record result"))?;

    repositories::attempts::update_status(&mut *tx, &attempt.id, AttemptStatus::Submitted, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to close attempt"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::counter!("attempts_submitted_total").increment(1);
    tracing::info!(
        exam_id = %exam.id,
        attempt_id = %attempt.id,
        score = graded.score,
        attempt_number,
        "Attempt submitted"
    );

    Ok(Json(SubmitResponse {
        score: graded.score,
        correct_answers: graded.correct_answers,
        total_questions: graded.total_questions,
        attempt_number,
    }))
}

async fn fetch_attempt(state: &AppState, attempt_id: &str) -> Result<ExamAttempt, ApiError> {
    repositories::attempts::find_by_id(state.db(), attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load attempt"))?
        .ok_or_else(|| ApiError::NotFound("Attempt not found".to_string()))
}

/// Attempts started by an authenticated user belong to that user. Anonymous
/// attempts carry no identity, so possession of the attempt id is the only
/// credential.
fn require_attempt_ownership(
    attempt: &ExamAttempt,
    current_user_id: Option<&str>,
) -> Result<(), ApiError> {
    match &attempt.student_id {
        Some(owner) if current_user_id != Some(owner.as_str()) => {
            Err(ApiError::Forbidden("Access denied"))
        }
        _ => Ok(()),
    }
}

/// Loads the attempt's snapshot rows joined with their bank questions, in
/// display position order.
async fn load_snapshot(
    state: &AppState,
    attempt_id: &str,
) -> Result<Vec<(Question, i32, Vec<i32>)>, ApiError> {
    let rows = repositories::attempts::list_questions(state.db(), attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load attempt questions"))?;

    let ids: Vec<String> = rows.iter().map(|row| row.question_id.clone()).collect();
    let questions = repositories::questions::list_by_ids(state.db(), &ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;
    let by_id: HashMap<String, Question> =
        questions.into_iter().map(|question| (question.id.clone(), question)).collect();

    let mut snapshot = Vec::with_capacity(rows.len());
    for row in rows {
        let question = by_id.get(&row.question_id).cloned().ok_or_else(|| {
            ApiError::internal(
                format!("question {} missing for attempt {attempt_id}", row.question_id),
                "Attempt snapshot references a missing question",
            )
        })?;
        snapshot.push((question, row.position, row.option_order.0.clone()));
    }

    Ok(snapshot)
}

fn sampled_to_view(item: SampledQuestion) -> AttemptQuestionView {
    let options = item
        .option_order
        .iter()
        .filter_map(|&original| item.question.options.0.get(original as usize).cloned())
        .collect();

    AttemptQuestionView {
        id: item.question.id,
        position: item.position,
        content: item.question.content,
        question_type: item.question.question_type,
        options,
    }
}
