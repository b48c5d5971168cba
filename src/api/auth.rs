use axum::{
    extract::{Form, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::validate_payload;
use crate::core::security;
use crate::core::state::AppState;
use crate::db::models::User;
use crate::schemas::auth::TokenResponse;
use crate::schemas::user::{UserLogin, UserResponse};

#[derive(Debug, Deserialize)]
struct OAuth2PasswordForm {
    username: String,
    password: String,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/token", post(token))
        .route("/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<UserLogin>,
) -> Result<Json<TokenResponse>, ApiError> {
    validate_payload(&payload)?;
    authenticate(&state, &payload.username, &payload.password).await
}

async fn token(
    State(state): State<AppState>,
    Form(payload): Form<OAuth2PasswordForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    authenticate(&state, &payload.username, &payload.password).await
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn authenticate(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = fetch_user_by_username(state, username).await?;

    let verified = security::verify_password(password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect username or password"))?;

    if !verified {
        return Err(ApiError::Unauthorized("Incorrect username or password"));
    }

    if !user.is_active {
        return Err(ApiError::BadRequest("Inactive user".to_string()));
    }

    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: UserResponse::from_db(user),
    }))
}

async fn fetch_user_by_username(state: &AppState, username: &str) -> Result<User, ApiError> {
    crate::repositories::users::find_by_username(state.db(), username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Incorrect username or password"))
}
