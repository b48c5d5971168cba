use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::services::permission_resolver;

pub(crate) struct CurrentUser(pub(crate) User);

/// Identity for routes that also serve anonymous callers (public exams).
/// A missing Authorization header yields `None`; a present-but-invalid one
/// is still rejected.
pub(crate) struct OptionalUser(pub(crate) Option<User>);

pub(crate) struct CurrentAdmin(pub(crate) User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        user_from_bearer(parts, &app_state).await.map(CurrentUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if parts.headers.get(header::AUTHORIZATION).is_none() {
            return Ok(OptionalUser(None));
        }

        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        user_from_bearer(parts, &app_state).await.map(|user| OptionalUser(Some(user)))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.role == UserRole::Admin {
            Ok(CurrentAdmin(user))
        } else {
            Err(ApiError::Forbidden("Admin access required"))
        }
    }
}

async fn user_from_bearer(parts: &Parts, state: &AppState) -> Result<User, ApiError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

    let claims = security::verify_token(token, state.settings())
        .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

    let user = repositories::users::find_by_id(state.db(), &claims.sub)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

    let Some(user) = user else {
        return Err(ApiError::Unauthorized("User not found"));
    };

    if !user.is_active {
        return Err(ApiError::Unauthorized("Invalid authentication credentials"));
    }

    Ok(user)
}

/// Every administrative route passes through here before mutating anything.
/// The response never says which layer denied, only that the caller is not
/// authorized.
pub(crate) async fn require_permission(
    state: &AppState,
    user: &User,
    code: &str,
) -> Result<(), ApiError> {
    let allowed = permission_resolver::resolve(state, user, code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to resolve permission"))?;

    if allowed {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Not authorized"))
    }
}
