use sqlx::PgPool;

use crate::db::models::{Permission, UserPermission};
use crate::db::types::{OverrideType, UserRole};

pub(crate) async fn find_by_code(
    pool: &PgPool,
    code: &str,
) -> Result<Option<Permission>, sqlx::Error> {
    sqlx::query_as::<_, Permission>(
        "SELECT id, code, name, category FROM permissions WHERE code = $1",
    )
    .bind(code)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_catalog(pool: &PgPool) -> Result<Vec<Permission>, sqlx::Error> {
    sqlx::query_as::<_, Permission>(
        "SELECT id, code, name, category FROM permissions ORDER BY category, code",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn upsert_permission(
    pool: &PgPool,
    id: &str,
    code: &str,
    name: &str,
    category: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO permissions (id, code, name, category) VALUES ($1,$2,$3,$4)
         ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name, category = EXCLUDED.category",
    )
    .bind(id)
    .bind(code)
    .bind(name)
    .bind(category)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn list_role_codes(
    pool: &PgPool,
    role: UserRole,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT permission_code FROM role_permissions WHERE role = $1 ORDER BY permission_code",
    )
    .bind(role)
    .fetch_all(pool)
    .await
}

pub(crate) async fn ensure_role_grant(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    role: UserRole,
    code: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO role_permissions (id, role, permission_code) VALUES ($1,$2,$3)
         ON CONFLICT (role, permission_code) DO NOTHING",
    )
    .bind(id)
    .bind(role)
    .bind(code)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn delete_role_grants(
    executor: impl sqlx::PgExecutor<'_>,
    role: UserRole,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM role_permissions WHERE role = $1").bind(role).execute(executor).await?;
    Ok(())
}

pub(crate) async fn find_user_override(
    pool: &PgPool,
    user_id: &str,
    code: &str,
) -> Result<Option<UserPermission>, sqlx::Error> {
    sqlx::query_as::<_, UserPermission>(
        "SELECT id, user_id, permission_code, override_type, reason, granted_by, created_at
         FROM user_permissions WHERE user_id = $1 AND permission_code = $2",
    )
    .bind(user_id)
    .bind(code)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_user_overrides(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<UserPermission>, sqlx::Error> {
    sqlx::query_as::<_, UserPermission>(
        "SELECT id, user_id, permission_code, override_type, reason, granted_by, created_at
         FROM user_permissions WHERE user_id = $1 ORDER BY permission_code",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateOverride<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) permission_code: &'a str,
    pub(crate) override_type: OverrideType,
    pub(crate) reason: Option<&'a str>,
    pub(crate) granted_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

/// One row per (user, code): a second override replaces the first.
pub(crate) async fn upsert_user_override(
    pool: &PgPool,
    params: CreateOverride<'_>,
) -> Result<UserPermission, sqlx::Error> {
    sqlx::query_as::<_, UserPermission>(
        "INSERT INTO user_permissions (
            id, user_id, permission_code, override_type, reason, granted_by, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7)
        ON CONFLICT (user_id, permission_code) DO UPDATE SET
            override_type = EXCLUDED.override_type,
            reason = EXCLUDED.reason,
            granted_by = EXCLUDED.granted_by,
            created_at = EXCLUDED.created_at
        RETURNING id, user_id, permission_code, override_type, reason, granted_by, created_at",
    )
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.permission_code)
    .bind(params.override_type)
    .bind(params.reason)
    .bind(params.granted_by)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_user_override(
    pool: &PgPool,
    user_id: &str,
    code: &str,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM user_permissions WHERE user_id = $1 AND permission_code = $2")
            .bind(user_id)
            .bind(code)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}
