use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::ExamResult;

pub(crate) const COLUMNS: &str = "\
    id, exam_id, student_id, student_name, score, total_questions, correct_answers, \
    time_spent_seconds, attempt_number, completed_at";

/// Counts ledger rows matching any of the caller's weak identity keys:
/// `student_id` against the user id, `student_id` against the username, or
/// `student_name` against the full name. Historic rows were written under
/// whichever key the taker presented at the time, so the match is an OR —
/// deliberately permissive to avoid undercounting returning takers. With no
/// keys at all there is nothing to match and the count is zero.
pub(crate) async fn count_matching_identity(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
    user_id: Option<&str>,
    username: Option<&str>,
    full_name: Option<&str>,
) -> Result<i64, sqlx::Error> {
    if user_id.is_none() && username.is_none() && full_name.is_none() {
        return Ok(0);
    }

    let mut builder =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM exam_results WHERE exam_id = ");
    builder.push_bind(exam_id);
    builder.push(" AND (");

    let mut first = true;
    if let Some(user_id) = user_id {
        builder.push("student_id = ");
        builder.push_bind(user_id);
        first = false;
    }
    if let Some(username) = username {
        if !first {
            builder.push(" OR ");
        }
        builder.push("student_id = ");
        builder.push_bind(username);
        first = false;
    }
    if let Some(full_name) = full_name {
        if !first {
            builder.push(" OR ");
        }
        builder.push("student_name = ");
        builder.push_bind(full_name);
    }
    builder.push(")");

    builder.build_query_scalar::<i64>().fetch_one(executor).await
}

pub(crate) struct CreateResult<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) student_id: Option<&'a str>,
    pub(crate) student_name: Option<&'a str>,
    pub(crate) score: f64,
    pub(crate) total_questions: i32,
    pub(crate) correct_answers: i32,
    pub(crate) time_spent_seconds: i32,
    pub(crate) attempt_number: i32,
    pub(crate) completed_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateResult<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO exam_results (
            id, exam_id, student_id, student_name, score, total_questions, correct_answers,
            time_spent_seconds, attempt_number, completed_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)",
    )
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.student_id)
    .bind(params.student_name)
    .bind(params.score)
    .bind(params.total_questions)
    .bind(params.correct_answers)
    .bind(params.time_spent_seconds)
    .bind(params.attempt_number)
    .bind(params.completed_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_by_exam(
    pool: &PgPool,
    exam_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<ExamResult>, sqlx::Error> {
    sqlx::query_as::<_, ExamResult>(&format!(
        "SELECT {COLUMNS} FROM exam_results WHERE exam_id = $1
         ORDER BY completed_at DESC OFFSET $2 LIMIT $3"
    ))
    .bind(exam_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_exam(pool: &PgPool, exam_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exam_results WHERE exam_id = $1")
        .bind(exam_id)
        .fetch_one(pool)
        .await
}
