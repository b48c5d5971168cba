use sqlx::PgPool;

use crate::db::models::{AttemptQuestion, ExamAttempt};
use crate::db::types::AttemptStatus;

pub(crate) const COLUMNS: &str = "\
    id, exam_id, student_id, student_name, sample_seed, attempt_number, \
    started_at, deadline, status, created_at, updated_at";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ExamAttempt>, sqlx::Error> {
    sqlx::query_as::<_, ExamAttempt>(&format!("SELECT {COLUMNS} FROM exam_attempts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateAttempt<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) student_id: Option<&'a str>,
    pub(crate) student_name: Option<&'a str>,
    pub(crate) sample_seed: i64,
    pub(crate) attempt_number: i32,
    pub(crate) started_at: time::PrimitiveDateTime,
    pub(crate) deadline: time::PrimitiveDateTime,
    pub(crate) status: AttemptStatus,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    attempt: CreateAttempt<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO exam_attempts (
            id, exam_id, student_id, student_name, sample_seed, attempt_number,
            started_at, deadline, status, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)",
    )
    .bind(attempt.id)
    .bind(attempt.exam_id)
    .bind(attempt.student_id)
    .bind(attempt.student_name)
    .bind(attempt.sample_seed)
    .bind(attempt.attempt_number)
    .bind(attempt.started_at)
    .bind(attempt.deadline)
    .bind(attempt.status)
    .bind(attempt.created_at)
    .bind(attempt.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn insert_question(
    executor: impl sqlx::PgExecutor<'_>,
    attempt_id: &str,
    question_id: &str,
    position: i32,
    option_order: serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO attempt_questions (attempt_id, question_id, position, option_order)
         VALUES ($1,$2,$3,$4)",
    )
    .bind(attempt_id)
    .bind(question_id)
    .bind(position)
    .bind(option_order)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_questions(
    pool: &PgPool,
    attempt_id: &str,
) -> Result<Vec<AttemptQuestion>, sqlx::Error> {
    sqlx::query_as::<_, AttemptQuestion>(
        "SELECT attempt_id, question_id, position, option_order
         FROM attempt_questions WHERE attempt_id = $1 ORDER BY position",
    )
    .bind(attempt_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn update_status(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    status: AttemptStatus,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE exam_attempts SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Flips every overdue active attempt to abandoned; returns how many rows
/// changed.
pub(crate) async fn abandon_overdue(
    pool: &PgPool,
    now: time::PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE exam_attempts SET status = $1, updated_at = $2
         WHERE status = $3 AND deadline < $2",
    )
    .bind(AttemptStatus::Abandoned)
    .bind(now)
    .bind(AttemptStatus::Active)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
