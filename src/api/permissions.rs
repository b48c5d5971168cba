use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentUser};
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::permission::{
    OverrideCreate, OverrideResponse, PermissionResponse, RoleGrantsResponse, RoleGrantsUpdate,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_catalog))
        .route("/roles/:role", get(get_role_grants).put(put_role_grants))
        .route(
            "/users/:user_id",
            get(list_user_overrides).put(put_user_override),
        )
        .route("/users/:user_id/:code", axum::routing::delete(delete_user_override))
        .route("/cache/invalidate", put(invalidate_cache))
}

async fn list_catalog(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PermissionResponse>>, ApiError> {
    require_permission(&state, &user, "permission:manage").await?;

    let catalog = repositories::permissions::list_catalog(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list permissions"))?;

    Ok(Json(catalog.into_iter().map(PermissionResponse::from_db).collect()))
}

async fn get_role_grants(
    Path(role): Path<UserRole>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<RoleGrantsResponse>, ApiError> {
    require_permission(&state, &user, "permission:manage").await?;

    let codes = repositories::permissions::list_role_codes(state.db(), role)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list role grants"))?;

    Ok(Json(RoleGrantsResponse { role, codes }))
}

/// Replaces the role's grant set wholesale and drops the cached policy so
/// the next resolution sees the new rows. Readers holding the old cache see
/// stale policy for at most the TTL.
async fn put_role_grants(
    Path(role): Path<UserRole>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<RoleGrantsUpdate>,
) -> Result<Json<RoleGrantsResponse>, ApiError> {
    require_permission(&state, &user, "permission:manage").await?;

    for code in &payload.codes {
        let known = repositories::permissions::find_by_code(state.db(), code)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to look up permission"))?;
        if known.is_none() {
            return Err(ApiError::BadRequest(format!("Unknown permission code '{code}'")));
        }
    }

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::permissions::delete_role_grants(&mut *tx, role)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to clear role grants"))?;

    for code in &payload.codes {
        repositories::permissions::ensure_role_grant(
            &mut *tx,
            &Uuid::new_v4().to_string(),
            role,
            code,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to write role grant"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    state.policy_cache().invalidate(role).await;
    tracing::info!(role = role.as_str(), edited_by = %user.id, "Role grants replaced");

    let codes = repositories::permissions::list_role_codes(state.db(), role)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list role grants"))?;

    Ok(Json(RoleGrantsResponse { role, codes }))
}

async fn list_user_overrides(
    Path(user_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<OverrideResponse>>, ApiError> {
    require_permission(&state, &user, "permission:manage").await?;

    let overrides = repositories::permissions::list_user_overrides(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list overrides"))?;

    Ok(Json(overrides.into_iter().map(OverrideResponse::from_db).collect()))
}

async fn put_user_override(
    Path(user_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<OverrideCreate>,
) -> Result<Json<OverrideResponse>, ApiError> {
    require_permission(&state, &user, "permission:manage").await?;
    validate_payload(&payload)?;

    let target = repositories::users::find_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?;
    if target.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let known = repositories::permissions::find_by_code(state.db(), &payload.permission_code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to look up permission"))?;
    if known.is_none() {
        return Err(ApiError::BadRequest(format!(
            "Unknown permission code '{}'",
            payload.permission_code
        )));
    }

    let row = repositories::permissions::upsert_user_override(
        state.db(),
        repositories::permissions::CreateOverride {
            id: &Uuid::new_v4().to_string(),
            user_id: &user_id,
            permission_code: &payload.permission_code,
            override_type: payload.override_type,
            reason: payload.reason.as_deref(),
            granted_by: &user.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to write override"))?;

    tracing::info!(
        target_user = %user_id,
        code = %row.permission_code,
        granted_by = %user.id,
        "User permission override written"
    );

    Ok(Json(OverrideResponse::from_db(row)))
}

async fn delete_user_override(
    Path((user_id, code)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    require_permission(&state, &user, "permission:manage").await?;

    let removed = repositories::permissions::delete_user_override(state.db(), &user_id, &code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete override"))?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Override not found".to_string()))
    }
}

async fn invalidate_cache(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    require_permission(&state, &user, "permission:manage").await?;

    state.policy_cache().invalidate_all().await;
    tracing::info!(requested_by = %user.id, "Policy cache invalidated");

    Ok(StatusCode::NO_CONTENT)
}
