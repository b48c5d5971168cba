use axum::{
    routing::{get, post},
    Router,
};

use crate::core::state::AppState;

mod handlers;


/// Attempt routes live in two places: starting is nested under the exam it
/// targets, everything else is addressed by attempt id.
pub(crate) fn exam_router() -> Router<AppState> {
    Router::new().route("/:exam_id/attempts", post(handlers::start_attempt))
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:attempt_id", get(handlers::get_attempt))
        .route("/:attempt_id/submit", post(handlers::submit_attempt))
}
