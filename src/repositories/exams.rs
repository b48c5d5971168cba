use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Exam;

pub(crate) const COLUMNS: &str = "\
    id, title, description, question_count, time_limit_minutes, start_time, end_time, \
    timezone, shuffle_questions, shuffle_answers, require_all_questions, max_attempts, \
    is_active, is_public, category, created_by, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM exams WHERE id = $1").bind(id).execute(pool).await?;
    Ok(())
}

pub(crate) struct CreateExam<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) question_count: i32,
    pub(crate) time_limit_minutes: i32,
    pub(crate) start_time: time::PrimitiveDateTime,
    pub(crate) end_time: time::PrimitiveDateTime,
    pub(crate) timezone: &'a str,
    pub(crate) shuffle_questions: bool,
    pub(crate) shuffle_answers: bool,
    pub(crate) require_all_questions: bool,
    pub(crate) max_attempts: i32,
    pub(crate) is_active: bool,
    pub(crate) is_public: bool,
    pub(crate) category: Option<&'a str>,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateExam<'_>) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            id, title, description, question_count, time_limit_minutes, start_time, end_time,
            timezone, shuffle_questions, shuffle_answers, require_all_questions, max_attempts,
            is_active, is_public, category, created_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.question_count)
    .bind(params.time_limit_minutes)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.timezone)
    .bind(params.shuffle_questions)
    .bind(params.shuffle_answers)
    .bind(params.require_all_questions)
    .bind(params.max_attempts)
    .bind(params.is_active)
    .bind(params.is_public)
    .bind(params.category)
    .bind(params.created_by)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateExam {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) question_count: Option<i32>,
    pub(crate) time_limit_minutes: Option<i32>,
    pub(crate) start_time: Option<time::PrimitiveDateTime>,
    pub(crate) end_time: Option<time::PrimitiveDateTime>,
    pub(crate) timezone: Option<String>,
    pub(crate) shuffle_questions: Option<bool>,
    pub(crate) shuffle_answers: Option<bool>,
    pub(crate) require_all_questions: Option<bool>,
    pub(crate) max_attempts: Option<i32>,
    pub(crate) is_active: Option<bool>,
    pub(crate) is_public: Option<bool>,
    pub(crate) category: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateExam,
) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            question_count = COALESCE($3, question_count),
            time_limit_minutes = COALESCE($4, time_limit_minutes),
            start_time = COALESCE($5, start_time),
            end_time = COALESCE($6, end_time),
            timezone = COALESCE($7, timezone),
            shuffle_questions = COALESCE($8, shuffle_questions),
            shuffle_answers = COALESCE($9, shuffle_answers),
            require_all_questions = COALESCE($10, require_all_questions),
            max_attempts = COALESCE($11, max_attempts),
            is_active = COALESCE($12, is_active),
            is_public = COALESCE($13, is_public),
            category = COALESCE($14, category),
            updated_at = $15
         WHERE id = $16
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.question_count)
    .bind(params.time_limit_minutes)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.timezone)
    .bind(params.shuffle_questions)
    .bind(params.shuffle_answers)
    .bind(params.require_all_questions)
    .bind(params.max_attempts)
    .bind(params.is_active)
    .bind(params.is_public)
    .bind(params.category)
    .bind(params.updated_at)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    only_active: bool,
    skip: i64,
    limit: i64,
) -> Result<Vec<Exam>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM exams"));

    if only_active {
        builder.push(" WHERE is_active = TRUE");
    }

    builder.push(" ORDER BY created_at DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<Exam>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, only_active: bool) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM exams");

    if only_active {
        builder.push(" WHERE is_active = TRUE");
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}
