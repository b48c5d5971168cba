use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::errors::AttemptError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
    /// A terminal engine outcome. The body keeps the stable domain code so
    /// callers can branch without parsing the message.
    Domain(AttemptError),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }
}

impl From<AttemptError> for ApiError {
    fn from(err: AttemptError) -> Self {
        ApiError::Domain(err)
    }
}

fn domain_status(kind: &AttemptError) -> StatusCode {
    match kind {
        AttemptError::ExamNotFound => StatusCode::NOT_FOUND,
        AttemptError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        AttemptError::NotAssigned | AttemptError::PermissionDenied => StatusCode::FORBIDDEN,
        AttemptError::InsufficientBank { .. } => StatusCode::CONFLICT,
        AttemptError::ExamDisabled
        | AttemptError::NotYetOpen { .. }
        | AttemptError::Closed { .. }
        | AttemptError::AttemptLimitReached { .. } => StatusCode::BAD_REQUEST,
    }
}

fn plain_response(status: StatusCode, detail: String) -> Response {
    (status, Json(ErrorResponse { status: status.as_u16(), detail, code: None })).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let status = StatusCode::UNAUTHORIZED;
                let mut response = plain_response(status, message.to_string());
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => {
                plain_response(StatusCode::FORBIDDEN, message.to_string())
            }
            ApiError::BadRequest(message) => plain_response(StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => plain_response(StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => plain_response(StatusCode::CONFLICT, message),
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                plain_response(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            ApiError::Domain(kind) => {
                let status = domain_status(&kind);
                let mut response = (
                    status,
                    Json(ErrorResponse {
                        status: status.as_u16(),
                        detail: kind.detail(),
                        code: Some(kind.code()),
                    }),
                )
                    .into_response();

                if matches!(kind, AttemptError::AuthenticationRequired) {
                    response
                        .headers_mut()
                        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                }

                response
            }
        }
    }
}
