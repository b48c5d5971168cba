use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Question;
use crate::db::types::QuestionType;

pub(crate) const COLUMNS: &str = "\
    id, content, question_type, options, correct_options, category, created_by, created_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// The sampler's candidate pool: the whole bank, or one category of it when
/// the exam was configured against a category.
pub(crate) async fn list_pool(
    pool: &PgPool,
    category: Option<&str>,
) -> Result<Vec<Question>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM questions"));

    if let Some(category) = category {
        builder.push(" WHERE category = ");
        builder.push_bind(category);
    }

    builder.push(" ORDER BY created_at, id");

    builder.build_query_as::<Question>().fetch_all(pool).await
}

pub(crate) async fn list_by_ids(
    pool: &PgPool,
    ids: &[String],
) -> Result<Vec<Question>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    category: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Question>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM questions"));

    if let Some(category) = category {
        builder.push(" WHERE category = ");
        builder.push_bind(category);
    }

    builder.push(" ORDER BY created_at DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<Question>().fetch_all(pool).await
}

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) content: &'a str,
    pub(crate) question_type: QuestionType,
    pub(crate) options: serde_json::Value,
    pub(crate) correct_options: serde_json::Value,
    pub(crate) category: Option<&'a str>,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, content, question_type, options, correct_options, category, created_by, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.content)
    .bind(params.question_type)
    .bind(params.options)
    .bind(params.correct_options)
    .bind(params.category)
    .bind(params.created_by)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
