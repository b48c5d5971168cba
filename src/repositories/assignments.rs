use sqlx::PgPool;

use crate::db::models::ExamAssignment;

pub(crate) const COLUMNS: &str = "\
    id, exam_id, user_id, max_attempts, assigned_by, assigned_at";

pub(crate) async fn find_for_user_exam(
    pool: &PgPool,
    exam_id: &str,
    user_id: &str,
) -> Result<Option<ExamAssignment>, sqlx::Error> {
    sqlx::query_as::<_, ExamAssignment>(&format!(
        "SELECT {COLUMNS} FROM exam_assignments WHERE exam_id = $1 AND user_id = $2"
    ))
    .bind(exam_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateAssignment<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) max_attempts: Option<i32>,
    pub(crate) assigned_by: &'a str,
    pub(crate) assigned_at: time::PrimitiveDateTime,
}

/// Re-assigning an already-assigned user refreshes the override instead of
/// failing on the unique pair.
pub(crate) async fn upsert(
    pool: &PgPool,
    params: CreateAssignment<'_>,
) -> Result<ExamAssignment, sqlx::Error> {
    sqlx::query_as::<_, ExamAssignment>(&format!(
        "INSERT INTO exam_assignments (id, exam_id, user_id, max_attempts, assigned_by, assigned_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         ON CONFLICT (exam_id, user_id) DO UPDATE SET
            max_attempts = EXCLUDED.max_attempts,
            assigned_by = EXCLUDED.assigned_by,
            assigned_at = EXCLUDED.assigned_at
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.user_id)
    .bind(params.max_attempts)
    .bind(params.assigned_by)
    .bind(params.assigned_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_for_user_exam(
    pool: &PgPool,
    exam_id: &str,
    user_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM exam_assignments WHERE exam_id = $1 AND user_id = $2")
        .bind(exam_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_by_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<ExamAssignment>, sqlx::Error> {
    sqlx::query_as::<_, ExamAssignment>(&format!(
        "SELECT {COLUMNS} FROM exam_assignments WHERE exam_id = $1 ORDER BY assigned_at DESC"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}
